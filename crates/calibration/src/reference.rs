//! Measured reference curves loaded from delimited text.

use std::{io::Read, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::{ConfigurationError, Curve};

/// Layout of a delimited reference data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReferenceFormat {
    /// Field separator.
    pub delimiter: char,
    /// Whether the first row names the columns.
    pub has_header: bool,
}

impl Default for ReferenceFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
        }
    }
}

/// A measured curve: one independent column and one or more dependent columns.
///
/// Lines starting with `#` are comments. Every row must have the same number
/// of columns, at least two, and every cell must be a finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCurve {
    names: Vec<String>,
    x: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl ReferenceCurve {
    /// Loads a reference curve from a file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>, format: ReferenceFormat) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = std::fs::File::open(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let curve = Self::from_reader(file, format)?;

        info!(
            path = %path.display(),
            rows = curve.len(),
            columns = ?curve.names,
            "loaded reference curve"
        );
        Ok(curve)
    }

    /// Parses a reference curve from any reader.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the data is malformed or empty.
    pub fn from_reader(reader: impl Read, format: ReferenceFormat) -> Result<Self, ConfigurationError> {
        let delimiter = u8::try_from(format.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "reference delimiter must be a single ASCII character, got {:?}",
                    format.delimiter
                ))
            })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(format.has_header)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut names: Vec<String> = if format.has_header {
            reader.headers()?.iter().map(str::to_owned).collect()
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            let width = rows.first().map_or(record.len(), Vec::len);

            if record.len() < 2 {
                return Err(invalid(line, "expected at least 2 columns".into()));
            }
            if record.len() != width {
                return Err(invalid(
                    line,
                    format!("expected {width} columns, found {}", record.len()),
                ));
            }

            let row = record
                .iter()
                .enumerate()
                .map(|(col, cell)| match cell.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(invalid(
                        line,
                        format!("column {}: `{cell}` is not a finite number", col + 1),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let Some(width) = rows.first().map(Vec::len) else {
            return Err(ConfigurationError::EmptyReference);
        };
        if names.len() != width {
            names = (1..=width).map(|i| format!("column {i}")).collect();
        }

        let x = rows.iter().map(|row| row[0]).collect();
        let columns = (1..width)
            .map(|col| rows.iter().map(|row| row[col]).collect())
            .collect();

        Ok(Self { names, x, columns })
    }

    /// Column names, the independent column first.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of dependent columns.
    #[must_use]
    pub fn dependent_columns(&self) -> usize {
        self.columns.len()
    }

    /// Projects the `index`-th dependent column (0-based) to a curve.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<Curve> {
        let y = self.columns.get(index)?;
        Some(self.x.iter().copied().zip(y.iter().copied()).collect())
    }

    /// Midpoint of the first two dependent columns, for lower/upper bands.
    #[must_use]
    pub fn band_midpoint(&self) -> Option<Curve> {
        let [lower, upper, ..] = self.columns.as_slice() else {
            return None;
        };
        Some(
            self.x
                .iter()
                .zip(lower.iter().zip(upper))
                .map(|(&x, (&lo, &hi))| (x, 0.5 * (lo + hi)))
                .collect(),
        )
    }
}

fn invalid(line: u64, message: String) -> ConfigurationError {
    ConfigurationError::InvalidReference { line, message }
}
