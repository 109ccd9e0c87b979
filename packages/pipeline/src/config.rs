//! Container, blob, and output settings for the binaries.
//!
//! Each setting resolves as: command-line flag, then environment variable,
//! then built-in default.

use std::path::PathBuf;

use diet_insights_document_store::{DEFAULT_ROOT, DocumentStore, ROOT_ENV};

pub const CONTAINER_ENV: &str = "DIET_INSIGHTS_CONTAINER";
pub const BLOB_ENV: &str = "DIET_INSIGHTS_BLOB";

pub const DEFAULT_CONTAINER: &str = "datasets";
pub const DEFAULT_BLOB: &str = "All_Diets.csv";

/// Container name from `flag`, `$DIET_INSIGHTS_CONTAINER`, or `datasets`.
#[must_use]
pub fn container(flag: Option<String>) -> String {
    choose(flag, std::env::var(CONTAINER_ENV).ok(), DEFAULT_CONTAINER)
}

/// Blob name from `flag`, `$DIET_INSIGHTS_BLOB`, or `All_Diets.csv`.
#[must_use]
pub fn blob(flag: Option<String>) -> String {
    choose(flag, std::env::var(BLOB_ENV).ok(), DEFAULT_BLOB)
}

/// Document store rooted at `flag`, `$DIET_INSIGHTS_OUTPUT_DIR`, or
/// `simulated_nosql`.
#[must_use]
pub fn document_store(flag: Option<PathBuf>) -> DocumentStore {
    let root = flag.unwrap_or_else(|| {
        PathBuf::from(choose(None, std::env::var(ROOT_ENV).ok(), DEFAULT_ROOT))
    });
    DocumentStore::new(root)
}

fn choose(flag: Option<String>, env: Option<String>, default: &str) -> String {
    flag.or(env)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
