//! GRIB2 parameter and level lookup tables.
//!
//! Translates numeric GRIB2 codes into the short and long names that make
//! up dataset variable keys. A built-in HRRR table covers the fields the
//! overlays use; a YAML file can add or override entries without code
//! changes.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// Errors raised while loading a table file.
#[derive(Debug, Error)]
pub enum TablesError {
    #[error("Failed to read table file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse table file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Names for one GRIB2 parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Short name, e.g. "CAPE"
    pub short_name: String,
    /// Human-readable name, e.g. "Convective Available Potential Energy"
    pub long_name: String,
}

/// Level description - either static text or a template with {value} placeholder
#[derive(Debug, Clone)]
pub enum LevelDescription {
    /// Static description (e.g., "surface", "mean sea level")
    Static(String),
    /// Template with {value} placeholder (e.g., "{value} m above ground")
    Template(String),
}

impl LevelDescription {
    /// Build from config text: anything containing a `{value` placeholder
    /// is a template.
    pub fn from_text(text: &str) -> Self {
        if text.contains("{value") {
            LevelDescription::Template(text.to_string())
        } else {
            LevelDescription::Static(text.to_string())
        }
    }

    /// Format the level description, substituting placeholders if it's a template.
    ///
    /// Supported placeholders:
    /// - `{value}` - Raw level value
    /// - `{value_mb}` - Value converted from Pa to mb (divided by 100)
    pub fn format(&self, value: u32) -> String {
        match self {
            LevelDescription::Static(s) => s.clone(),
            LevelDescription::Template(t) => t
                .replace("{value_mb}", &(value / 100).to_string())
                .replace("{value}", &value.to_string()),
        }
    }
}

/// GRIB2 parameter and level lookup tables.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    parameters: HashMap<ParamKey, ParameterInfo>,
    levels: HashMap<u8, LevelDescription>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default)]
    parameters: Vec<ParameterEntry>,
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

#[derive(Debug, Deserialize)]
struct ParameterEntry {
    discipline: u8,
    category: u8,
    number: u8,
    short_name: String,
    long_name: String,
}

#[derive(Debug, Deserialize)]
struct LevelEntry {
    level_type: u8,
    description: String,
}

/// Built-in HRRR parameters: (discipline, category, number, short, long).
const HRRR_PARAMETERS: &[(u8, u8, u8, &str, &str)] = &[
    (0, 0, 0, "TMP", "Temperature"),
    (0, 0, 2, "POT", "Potential temperature"),
    (0, 0, 6, "DPT", "Dew point temperature"),
    (0, 1, 0, "SPFH", "Specific humidity"),
    (0, 1, 1, "RH", "Relative humidity"),
    (0, 1, 3, "PWAT", "Precipitable water"),
    (0, 1, 8, "APCP", "Total precipitation"),
    (0, 2, 2, "UGRD", "U-component of wind"),
    (0, 2, 3, "VGRD", "V-component of wind"),
    (0, 2, 8, "VVEL", "Vertical velocity (pressure)"),
    (0, 2, 10, "ABSV", "Absolute vorticity"),
    (0, 2, 22, "GUST", "Wind speed (gust)"),
    (0, 2, 194, "USTM", "U-component storm motion"),
    (0, 2, 195, "VSTM", "V-component storm motion"),
    (0, 3, 0, "PRES", "Pressure"),
    (0, 3, 1, "PRMSL", "Pressure reduced to MSL"),
    (0, 3, 5, "HGT", "Geopotential height"),
    (0, 6, 1, "TCDC", "Total cloud cover"),
    (0, 7, 6, "CAPE", "Convective Available Potential Energy"),
    (0, 7, 7, "CIN", "Convective inhibition"),
    (0, 7, 8, "HLCY", "Storm relative helicity"),
    (0, 7, 192, "LFTX", "Surface lifted index"),
    (0, 7, 193, "4LFTX", "Best (4-layer) lifted index"),
    (0, 7, 199, "MXUPHL", "Hourly maximum of upward updraft helicity"),
    (0, 16, 195, "REFD", "Simulated radar reflectivity"),
    (0, 16, 196, "REFC", "Composite reflectivity"),
    (0, 16, 197, "RETOP", "Echo top"),
    (0, 17, 192, "LTNG", "Lightning"),
    (0, 19, 0, "VIS", "Visibility"),
];

/// Built-in level descriptions: (level type, description or template).
const HRRR_LEVELS: &[(u8, &str)] = &[
    (1, "surface"),
    (2, "cloud base"),
    (3, "cloud top"),
    (4, "0C isotherm"),
    (5, "adiabatic condensation level"),
    (6, "max wind"),
    (7, "tropopause"),
    (8, "top of atmosphere"),
    (10, "entire atmosphere"),
    (100, "{value_mb} mb"),
    (101, "mean sea level"),
    (102, "{value} m above MSL"),
    (103, "{value} m above ground"),
    (106, "{value} m below surface"),
    (108, "{value_mb} mb above ground"),
    (200, "entire atmosphere"),
    (204, "highest tropospheric freezing level"),
    (215, "cloud ceiling"),
    (220, "planetary boundary layer"),
];

impl Grib2Tables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for HRRR pressure and surface files.
    pub fn hrrr() -> Self {
        let mut tables = Self::new();
        for &(discipline, category, number, short, long) in HRRR_PARAMETERS {
            tables.add_parameter(discipline, category, number, short, long);
        }
        for &(level_type, description) in HRRR_LEVELS {
            tables.add_level(level_type, LevelDescription::from_text(description));
        }
        tables
    }

    /// Built-in HRRR tables, extended by the YAML file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self, TablesError> {
        let mut tables = Self::hrrr();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|source| TablesError::Io {
                path: path.display().to_string(),
                source,
            })?;
            tables.merge_yaml(&text)?;
            debug!(
                path = %path.display(),
                parameters = tables.parameter_count(),
                levels = tables.level_count(),
                "Loaded parameter tables"
            );
        }
        Ok(tables)
    }

    /// Merge entries from YAML text, overriding existing codes.
    pub fn merge_yaml(&mut self, text: &str) -> Result<(), TablesError> {
        let file: TableFile = serde_yaml::from_str(text)?;
        for entry in file.parameters {
            self.add_parameter(
                entry.discipline,
                entry.category,
                entry.number,
                entry.short_name,
                entry.long_name,
            );
        }
        for entry in file.levels {
            self.add_level(entry.level_type, LevelDescription::from_text(&entry.description));
        }
        Ok(())
    }

    /// Add a parameter mapping
    pub fn add_parameter(
        &mut self,
        discipline: u8,
        category: u8,
        number: u8,
        short_name: impl Into<String>,
        long_name: impl Into<String>,
    ) {
        self.parameters.insert(
            (discipline, category, number),
            ParameterInfo {
                short_name: short_name.into(),
                long_name: long_name.into(),
            },
        );
    }

    /// Add a level description mapping
    pub fn add_level(&mut self, level_type: u8, description: LevelDescription) {
        self.levels.insert(level_type, description);
    }

    /// Look up parameter names by GRIB2 codes.
    ///
    /// Unknown codes get "P{discipline}_{category}_{number}" for both names.
    pub fn get_parameter(&self, discipline: u8, category: u8, number: u8) -> ParameterInfo {
        self.parameters
            .get(&(discipline, category, number))
            .cloned()
            .unwrap_or_else(|| {
                let code = format!("P{}_{}_{}", discipline, category, number);
                ParameterInfo {
                    short_name: code.clone(),
                    long_name: code,
                }
            })
    }

    /// Look up level description by type code and value.
    ///
    /// Returns "Level type {type} value {value}" if not found.
    pub fn get_level_description(&self, level_type: u8, level_value: u32) -> String {
        match self.levels.get(&level_type) {
            Some(desc) => desc.format(level_value),
            None => format!("Level type {} value {}", level_type, level_value),
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
