//! Cell-level parsing shared by every column.

use std::num::ParseFloatError;

use diet_insights_recipe_models::is_missing;

/// Why a numeric cell was rejected.
#[derive(Debug, thiserror::Error)]
pub enum CellError {
    /// Not a number at all.
    #[error(transparent)]
    Float(#[from] ParseFloatError),

    /// Parsed, but infinite.
    #[error("non-finite value")]
    NonFinite,
}

/// Parses a numeric cell. Missing markers yield `Ok(None)`.
///
/// Infinite values are rejected along with anything unparseable, so every
/// `Some` returned here is finite.
///
/// # Errors
///
/// Returns [`CellError`] if the cell is neither a missing marker nor a
/// finite number.
pub fn parse_numeric(raw: &str) -> Result<Option<f64>, CellError> {
    if is_missing(raw) {
        return Ok(None);
    }
    let value = raw.trim().parse::<f64>()?;
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(CellError::NonFinite)
    }
}

/// Parses a text cell. Missing markers yield `None`; other values are kept
/// verbatim.
#[must_use]
pub fn parse_text(raw: &str) -> Option<String> {
    if is_missing(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}
