use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{ColumnNames, DatasetOptions};
use crate::error::ReportError;
use crate::synth::SampleRecipe;

// ---------------------------------------------------------------------------
// Rgb: palette entry, serialized as a `#rrggbb` string
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, ReportError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ReportError::Config(format!("Invalid color '{s}'")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| ReportError::Config(format!("Invalid color '{s}': {e}")))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Blend towards white; `amount` 0.0 keeps the color, 1.0 yields white.
    pub fn lighten(self, amount: f64) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// ReportStyle: figure-wide styling, passed explicitly to the composer
// ---------------------------------------------------------------------------

/// Immutable styling shared by every panel of one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReportStyle {
    /// Endpoint palette, assigned by order of first appearance and cycled.
    pub palette: Vec<Rgb>,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub figure_title_size: u32,
    pub title_size: u32,
    pub label_size: u32,
    pub value_size: u32,
    pub success_color: Rgb,
    pub failure_color: Rgb,
    /// Status colors used by the gauge and the scorecard.
    pub favorable_color: Rgb,
    pub intermediate_color: Rgb,
    pub poor_color: Rgb,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            palette: vec![
                Rgb(0x1f, 0x77, 0xb4),
                Rgb(0xff, 0x7f, 0x0e),
                Rgb(0x2c, 0xa0, 0x2c),
                Rgb(0xd6, 0x27, 0x28),
                Rgb(0x94, 0x67, 0xbd),
                Rgb(0x8c, 0x56, 0x4b),
                Rgb(0xe3, 0x77, 0xc2),
                Rgb(0x7f, 0x7f, 0x7f),
                Rgb(0xbc, 0xbd, 0x22),
                Rgb(0x17, 0xbe, 0xcf),
            ],
            width: 2000,
            height: 1500,
            font_family: "sans-serif".to_string(),
            figure_title_size: 34,
            title_size: 22,
            label_size: 15,
            value_size: 13,
            success_color: Rgb(0x2e, 0xcc, 0x71),
            failure_color: Rgb(0xe7, 0x4c, 0x3c),
            favorable_color: Rgb(0x2e, 0xcc, 0x71),
            intermediate_color: Rgb(0xf3, 0x9c, 0x12),
            poor_color: Rgb(0xe7, 0x4c, 0x3c),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OutputOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// `chrono` strftime pattern embedded in the file name.
    pub timestamp_format: String,
    /// Also write a JSON summary next to the SVG.
    pub summary_json: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "performance-dashboard".to_string(),
            timestamp_format: "%Y%m%d_%H%M%S".to_string(),
            summary_json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReportConfig {
    pub style: ReportStyle,
    pub recipe: SampleRecipe,
    pub output: OutputOptions,
    pub columns: ColumnNames,
    /// Field delimiter of the input file.
    pub delimiter: char,
}

impl ReportConfig {
    /// Read a JSON configuration file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.style.palette.is_empty() {
            return Err(ReportError::Config(
                "style.palette must contain at least one color".to_string(),
            ));
        }
        if self.style.width < 300 || self.style.height < 300 {
            return Err(ReportError::Config(format!(
                "figure size {}x{} is too small",
                self.style.width, self.style.height
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(ReportError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )));
        }
        if self.output.file_prefix.trim().is_empty() {
            return Err(ReportError::Config(
                "output.file_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Reader settings derived from `columns` and `delimiter`.
    pub fn dataset_options(&self) -> Result<DatasetOptions, ReportError> {
        let delimiter = u8::try_from(self.delimiter).map_err(|_| {
            ReportError::Config(format!("delimiter '{}' is not a single byte", self.delimiter))
        })?;
        Ok(DatasetOptions {
            columns: self.columns.clone(),
            delimiter,
        })
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            style: ReportStyle::default(),
            recipe: SampleRecipe::default(),
            output: OutputOptions::default(),
            columns: ColumnNames::default(),
            delimiter: ',',
        }
    }
}
