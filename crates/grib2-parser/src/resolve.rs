//! Field resolution: human-readable field name to one 2D slice.

use std::path::Path;
use std::sync::Arc;

use overlay_common::FieldSlice;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::dataset::{Grib2Dataset, GridDataset, VariableSummary};
use crate::tables::Grib2Tables;
use crate::Grib2Error;

/// Errors from resolving a field in a grid product.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The file could not be decoded, or slice extraction failed.
    #[error(transparent)]
    Decode(#[from] Grib2Error),

    /// No variable key contains the requested name.
    #[error("Field '{field}' not found ({} variables available)", .available.len())]
    FieldNotFound {
        field: String,
        available: Vec<String>,
    },
}

/// Select the first key whose lowercase form contains the lowercase query.
///
/// Keys are scanned in the order given; when several match, the earliest
/// wins and the rest are ignored.
pub fn find_variable<'a, I, S>(keys: I, query: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    let needle = query.to_lowercase();
    keys.into_iter()
        .map(|k| k.as_ref())
        .find(|k| k.to_lowercase().contains(&needle))
}

/// Resolve `field_name` within an already opened dataset.
pub fn resolve_in<D>(dataset: &D, field_name: &str, time_index: usize) -> Result<FieldSlice, ResolveError>
where
    D: GridDataset + ?Sized,
{
    let keys = dataset.variable_keys();
    let key = match find_variable(keys.iter().copied(), field_name) {
        Some(key) => key,
        None => {
            warn!(field = %field_name, variables = keys.len(), "Field not found");
            return Err(ResolveError::FieldNotFound {
                field: field_name.to_string(),
                available: keys.iter().map(|k| k.to_string()).collect(),
            });
        }
    };

    info!(field = %field_name, variable = %key, time_index, "Resolved field");
    Ok(dataset.read_slice(key, time_index)?)
}

/// Opens cached grid files and resolves fields in them.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    tables: Arc<Grib2Tables>,
}

impl FieldResolver {
    pub fn new(tables: Arc<Grib2Tables>) -> Self {
        Self { tables }
    }

    /// Open the grid file at `path` as a dataset.
    pub fn open(&self, path: &Path) -> Result<Grib2Dataset, Grib2Error> {
        Grib2Dataset::open(path, self.tables.clone())
    }

    /// Every variable in the file at `path` with its step count and shape.
    pub fn list_variables(&self, path: &Path) -> Result<Vec<VariableSummary>, Grib2Error> {
        let dataset = self.open(path)?;
        Ok(dataset.summaries())
    }

    /// Open `path`, find the variable matching `field_name` and extract
    /// the slice at `time_index`.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn resolve(
        &self,
        path: &Path,
        field_name: &str,
        time_index: usize,
    ) -> Result<FieldSlice, ResolveError> {
        let dataset = self.open(path)?;
        resolve_in(&dataset, field_name, time_index)
    }
}
