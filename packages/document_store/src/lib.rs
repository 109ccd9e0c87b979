#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! A directory of JSON documents standing in for a `NoSQL` collection.
//!
//! Each write stores one self-contained document under `{root}/{name}`,
//! replacing any previous document with that name. Writes go through a
//! sibling `{name}.tmp` file and a rename, so a reader never observes a
//! half-written document.

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Directory used when nothing else is configured.
pub const DEFAULT_ROOT: &str = "simulated_nosql";

/// Document name used for analysis results.
pub const DEFAULT_DOCUMENT: &str = "results.json";

/// Environment variable overriding [`DEFAULT_ROOT`].
pub const ROOT_ENV: &str = "DIET_INSIGHTS_OUTPUT_DIR";

/// Suffix of in-flight writes.
const TEMP_SUFFIX: &str = ".tmp";

/// Errors returned by [`DocumentStore`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    /// Filesystem failure while reading or writing a document.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Document could not be encoded or decoded.
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Name is empty, contains a path separator, or is reserved.
    #[error("Invalid document name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

/// Ensures a directory exists, creating it and its parents if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// A collection of JSON documents under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the collection.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the document called `name` lives.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidName`] if `name` is not a plain
    /// file name.
    pub fn document_path(&self, name: &str) -> Result<PathBuf, DocumentStoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Serializes `document` as pretty JSON and stores it under `name`.
    ///
    /// Creates the root directory if needed and returns the final path.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Io`] if the directory or file cannot be
    /// written, [`DocumentStoreError::Json`] if serialization fails.
    pub fn write<T: Serialize>(
        &self,
        name: &str,
        document: &T,
    ) -> Result<PathBuf, DocumentStoreError> {
        let path = self.document_path(name)?;
        let json = serde_json::to_vec_pretty(document).map_err(|source| {
            DocumentStoreError::Json {
                path: path.clone(),
                source,
            }
        })?;

        ensure_dir(&self.root).map_err(|source| DocumentStoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let temp = self.root.join(format!("{name}{TEMP_SUFFIX}"));
        if let Err(source) = write_synced(&temp, &json) {
            let _ = std::fs::remove_file(&temp);
            return Err(DocumentStoreError::Io { path: temp, source });
        }
        std::fs::rename(&temp, &path).map_err(|source| DocumentStoreError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Wrote {} ({} bytes)", path.display(), json.len());
        Ok(path)
    }

    /// Loads and deserializes the document called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Io`] if the file cannot be read and
    /// [`DocumentStoreError::Json`] if it does not decode as `T`.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, DocumentStoreError> {
        let path = self.document_path(name)?;
        let bytes = std::fs::read(&path).map_err(|source| DocumentStoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| DocumentStoreError::Json { path, source })
    }

    /// Names of the stored documents, sorted. A missing root is an empty
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Io`] if the root cannot be listed.
    pub fn list(&self) -> Result<Vec<String>, DocumentStoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(DocumentStoreError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DocumentStoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && !name.ends_with(TEMP_SUFFIX)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn validate_name(name: &str) -> Result<(), DocumentStoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.ends_with(TEMP_SUFFIX)
        || name.contains(['/', '\\']);
    if bad {
        return Err(DocumentStoreError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use diet_insights_analytics_models::{DietAggregate, DietAnalysis, ResultDocument};
    use serde::Deserialize;

    use super::*;

    fn sample_document() -> ResultDocument {
        let analysis = DietAnalysis {
            total_records: 3,
            aggregates: vec![
                DietAggregate {
                    diet_type: "vegan".to_string(),
                    mean_protein_g: 12.5,
                    mean_carbs_g: 40.0,
                    mean_fat_g: 8.25,
                    most_common_cuisine: Some("indian".to_string()),
                    record_count: 2,
                    mean_calories: Some(310.0),
                },
                DietAggregate {
                    diet_type: "keto".to_string(),
                    mean_protein_g: 30.0,
                    mean_carbs_g: 5.0,
                    mean_fat_g: 45.0,
                    most_common_cuisine: None,
                    record_count: 1,
                    mean_calories: None,
                },
            ],
            top_protein: Vec::new(),
            highest_protein_diet: Some("keto".to_string()),
            ratios: Vec::new(),
        };
        let at = chrono::Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        ResultDocument::new("All_Diets.csv", &analysis, at)
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("nested").join("simulated_nosql"));

        let path = store.write(DEFAULT_DOCUMENT, &sample_document()).unwrap();

        assert!(path.is_file());
        assert_eq!(path, store.root().join(DEFAULT_DOCUMENT));
    }

    #[test]
    fn result_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let original = sample_document();

        store.write(DEFAULT_DOCUMENT, &original).unwrap();
        let loaded: ResultDocument = store.read(DEFAULT_DOCUMENT).unwrap();

        assert_eq!(loaded.total_records_processed, original.total_records_processed);
        assert_eq!(loaded.diet_types_analyzed, original.diet_types_analyzed);
        assert_eq!(loaded.average_macros.len(), 2);
        for (a, b) in loaded.average_macros.iter().zip(&original.average_macros) {
            assert_eq!(a.diet_type, b.diet_type);
            assert!((a.mean_protein_g - b.mean_protein_g).abs() < 1e-9);
            assert!((a.mean_fat_g - b.mean_fat_g).abs() < 1e-9);
        }
        assert_eq!(loaded.diet_type_counts, original.diet_type_counts);
    }

    #[test]
    fn write_replaces_previous_document_and_leaves_no_temp_file() {
        #[derive(Serialize, Deserialize)]
        struct Note {
            body: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store.write("note.json", &Note { body: "first".into() }).unwrap();
        store.write("note.json", &Note { body: "second".into() }).unwrap();

        let note: Note = store.read("note.json").unwrap();
        assert_eq!(note.body, "second");
        assert_eq!(store.list().unwrap(), vec!["note.json".to_string()]);
        assert!(!dir.path().join("note.json.tmp").exists());
    }

    #[test]
    fn list_is_sorted_and_tolerates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());

        store.write("b.json", &1).unwrap();
        store.write("a.json", &2).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a.json", "b.json"]);
    }

    #[test]
    fn rejects_path_like_names() {
        let store = DocumentStore::new("unused");
        for name in ["", "..", "a/b.json", "x.json.tmp"] {
            assert!(matches!(
                store.document_path(name),
                Err(DocumentStoreError::InvalidName { .. })
            ));
        }
    }

    #[test]
    fn read_missing_document_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let err = store.read::<ResultDocument>("results.json").unwrap_err();
        assert!(matches!(err, DocumentStoreError::Io { .. }));
        assert!(err.to_string().contains("results.json"), "{err}");
    }

    #[test]
    fn write_over_file_root_fails_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = DocumentStore::new(&blocker);

        let err = store.write(DEFAULT_DOCUMENT, &1).unwrap_err();
        assert!(matches!(err, DocumentStoreError::Io { .. }));
    }
}
