#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record source for the nutrition dataset.
//!
//! Parses delimited text with a header row into a [`RecipeTable`],
//! preserving input row order. The bytes can come from a local file
//! ([`CsvRecordSource::read_path`]) or from anywhere else, e.g. a blob
//! downloaded by the storage adapter ([`CsvRecordSource::read_bytes`]).
//! This crate knows nothing about network transport.

pub mod parsing;
pub mod progress;

use std::io::Read;
use std::path::Path;

use progress::{NullProgress, ProgressCallback};

use diet_insights_recipe_models::{
    CALORIES, CARBS, CUISINE_TYPE, DIET_TYPE, FAT, PROTEIN, RECIPE_NAME, RecipeRecord,
    RecipeTable, header_matches,
};

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file does not exist or the buffer could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}' in header")]
    MissingColumn {
        /// Canonical name of the expected column.
        column: String,
    },

    /// A numeric cell holds something that is neither a number nor a
    /// missing-value marker.
    #[error("Row {row}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        /// 1-based data row (the header is row 0).
        row: u64,
        /// Canonical column name.
        column: &'static str,
        /// Raw cell contents.
        value: String,
    },

    /// The delimited text itself is malformed (ragged rows, bad UTF-8).
    #[error("Malformed CSV: {0}")]
    Csv(csv::Error),
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Self::Io(io),
            _ => Self::Io(std::io::Error::other("CSV reader I/O failure")),
        }
    }
}

/// Header positions resolved once per file.
struct ColumnIndex {
    diet_type: usize,
    recipe_name: Option<usize>,
    protein: usize,
    carbs: usize,
    fat: usize,
    calories: Option<usize>,
    cuisine_type: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let find = |name: &str| headers.iter().position(|h| header_matches(name, h));
        let require = |name: &str| {
            find(name).ok_or_else(|| SourceError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            diet_type: require(DIET_TYPE)?,
            recipe_name: find(RECIPE_NAME),
            protein: require(PROTEIN)?,
            carbs: require(CARBS)?,
            fat: require(FAT)?,
            calories: find(CALORIES),
            cuisine_type: require(CUISINE_TYPE)?,
        })
    }
}

/// Reads the recipe dataset from delimited text.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
}

impl Default for CsvRecordSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordSource {
    /// Creates a comma-delimited source.
    #[must_use]
    pub const fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads and parses a local file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file does not exist or cannot be
    /// read, and the parse errors of [`Self::read`] otherwise.
    pub fn read_path(&self, path: &Path) -> Result<RecipeTable, SourceError> {
        let bytes = std::fs::read(path)?;
        log::info!("Read {} bytes from {}", bytes.len(), path.display());
        self.read_bytes(&bytes)
    }

    /// Parses an in-memory buffer.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<RecipeTable, SourceError> {
        self.read(bytes)
    }

    /// Parses delimited text from any reader, keeping row order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if a required header is
    /// absent, [`SourceError::InvalidNumber`] for unparseable numeric
    /// cells, [`SourceError::Csv`] for malformed rows, and
    /// [`SourceError::Io`] if the reader fails.
    pub fn read<R: Read>(&self, reader: R) -> Result<RecipeTable, SourceError> {
        self.read_with_progress(reader, &NullProgress)
    }

    /// Like [`Self::read`], advancing `progress` by one per parsed row.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn read_with_progress<R: Read>(
        &self,
        reader: R,
        progress: &dyn ProgressCallback,
    ) -> Result<RecipeTable, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let index = ColumnIndex::resolve(&headers)?;
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let row_number = i as u64 + 1;
            let cell = |idx: usize| row.get(idx).unwrap_or_default();
            let number = |idx: usize, column: &'static str| {
                parsing::parse_numeric(cell(idx)).map_err(|_| SourceError::InvalidNumber {
                    row: row_number,
                    column,
                    value: cell(idx).to_string(),
                })
            };

            records.push(RecipeRecord {
                diet_type: cell(index.diet_type).to_string(),
                recipe_name: index.recipe_name.and_then(|idx| parsing::parse_text(cell(idx))),
                protein_g: number(index.protein, PROTEIN)?,
                carbs_g: number(index.carbs, CARBS)?,
                fat_g: number(index.fat, FAT)?,
                calories: index
                    .calories
                    .map(|idx| number(idx, CALORIES))
                    .transpose()?
                    .flatten(),
                cuisine_type: parsing::parse_text(cell(index.cuisine_type)),
            });
            progress.inc(1);
        }
        progress.finish(format!("Parsed {} rows", records.len()));

        log::debug!(
            "Parsed {} rows with columns: {}",
            records.len(),
            columns.join(", ")
        );

        Ok(RecipeTable::new(columns, records))
    }
}
