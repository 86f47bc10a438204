//! Multi-variable view over a decoded GRIB2 file.
//!
//! Messages that share a parameter and level form one variable; their
//! order in the file is the variable's time/step dimension.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use overlay_common::FieldSlice;
use tracing::{debug, info};

use crate::tables::Grib2Tables;
use crate::{Grib2Error, Grib2Message, Grib2Reader, Grib2Result};

/// Capability the field resolver needs from a decoded grid product.
pub trait GridDataset {
    /// Variable keys in the dataset's natural order.
    fn variable_keys(&self) -> Vec<&str>;

    /// Extract one 2D slice of `key` at step `index`.
    fn read_slice(&self, key: &str, index: usize) -> Grib2Result<FieldSlice>;
}

/// Listing entry for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSummary {
    pub key: String,
    pub steps: usize,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone)]
struct Variable {
    key: String,
    messages: Vec<Grib2Message>,
}

/// A GRIB2 file decoded into named variables.
#[derive(Debug, Clone)]
pub struct Grib2Dataset {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl Grib2Dataset {
    /// Read and decode the GRIB2 file at `path`.
    pub fn open(path: impl AsRef<Path>, tables: Arc<Grib2Tables>) -> Grib2Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        info!(path = %path.display(), bytes = data.len(), "Opening GRIB2 dataset");
        Self::from_bytes(Bytes::from(data), tables)
    }

    /// Decode a GRIB2 buffer. A buffer with no GRIB2 messages is an error.
    pub fn from_bytes(data: Bytes, tables: Arc<Grib2Tables>) -> Grib2Result<Self> {
        let mut reader = Grib2Reader::new(data, tables);
        let mut dataset = Self {
            variables: Vec::new(),
            index: HashMap::new(),
        };

        let mut count = 0usize;
        while let Some(message) = reader.next_message()? {
            dataset.push(message);
            count += 1;
        }

        if count == 0 {
            return Err(Grib2Error::InvalidFormat(
                "No GRIB2 messages found".to_string(),
            ));
        }

        debug!(
            messages = count,
            variables = dataset.variables.len(),
            "Decoded GRIB2 dataset"
        );
        Ok(dataset)
    }

    /// Key naming a message's variable:
    /// "<SHORT> - <long name> @ <level>".
    pub fn variable_key(message: &Grib2Message) -> String {
        let pd = &message.product_definition;
        format!(
            "{} - {} @ {}",
            pd.parameter_short_name, pd.parameter_long_name, pd.level_description
        )
    }

    fn push(&mut self, message: Grib2Message) {
        let key = Self::variable_key(&message);
        match self.index.get(&key) {
            Some(&i) => self.variables[i].messages.push(message),
            None => {
                self.index.insert(key.clone(), self.variables.len());
                self.variables.push(Variable {
                    key,
                    messages: vec![message],
                });
            }
        }
    }

    fn variable(&self, key: &str) -> Grib2Result<&Variable> {
        self.index
            .get(key)
            .map(|&i| &self.variables[i])
            .ok_or_else(|| Grib2Error::UnknownVariable(key.to_string()))
    }

    /// Keys, step counts and grid shapes for every variable.
    pub fn summaries(&self) -> Vec<VariableSummary> {
        self.variables
            .iter()
            .map(|v| {
                let (rows, cols) = v.messages[0].grid_dims();
                VariableSummary {
                    key: v.key.clone(),
                    steps: v.messages.len(),
                    width: cols as usize,
                    height: rows as usize,
                }
            })
            .collect()
    }
}

impl GridDataset for Grib2Dataset {
    fn variable_keys(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.key.as_str()).collect()
    }

    fn read_slice(&self, key: &str, index: usize) -> Grib2Result<FieldSlice> {
        let variable = self.variable(key)?;
        let message = variable
            .messages
            .get(index)
            .ok_or_else(|| Grib2Error::StepOutOfRange {
                variable: key.to_string(),
                index,
                available: variable.messages.len(),
            })?;

        let (rows, cols) = message.grid_dims();
        let (width, height) = (cols as usize, rows as usize);
        let values = message.unpack_data()?;
        let count = values.len();

        FieldSlice::new(key, width, height, values).ok_or_else(|| {
            Grib2Error::UnpackingError(format!(
                "Decoded {} values for a {}x{} grid",
                count, width, height
            ))
        })
    }
}
