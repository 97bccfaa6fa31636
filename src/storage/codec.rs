//! Persistence codec: one directory per collection.
//!
//! Each collection directory holds two files:
//!
//! - `vectors.bin` — bincode-encoded [`VectorFile`]: the dimension plus
//!   the raw row-major f32 data of the flat index. Absent while the
//!   collection is empty (dimension unset).
//! - `collection.json` — the JSON sidecar: documents, metadatas, id
//!   maps, collection-level metadata, and the recorded dimension.
//!
//! A collection *exists* iff its sidecar exists; it may exist with zero
//! rows and no vector file. Writes go to a temp path in the same
//! directory and are renamed into place, and the vector file lands
//! before the sidecar — a reader never observes a sidecar referencing a
//! vector file that was not yet written.
//!
//! A present-but-unreadable sidecar is a hard [`StorageError::Corrupted`]
//! error: treating a corrupt collection as empty would be silent data
//! loss.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::CollectionRecord;
use crate::error::{Result, StorageError};
use crate::types::{DocumentId, Metadata};
use crate::vector::FlatIndex;

/// Binary vector-store file name inside a collection directory.
pub(crate) const VECTORS_FILE: &str = "vectors.bin";

/// Structured sidecar file name inside a collection directory.
pub(crate) const SIDECAR_FILE: &str = "collection.json";

/// On-disk layout of the binary vector-store file.
#[derive(Serialize, Deserialize)]
struct VectorFile {
    dimension: u32,
    data: Vec<f32>,
}

/// On-disk layout of the JSON sidecar.
#[derive(Serialize, Deserialize)]
struct Sidecar {
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    row_to_id: Vec<DocumentId>,
    id_to_row: HashMap<String, usize>,
    extra_metadata: Metadata,
    dimension: Option<usize>,
}

/// Writes `bytes` to `dir/name` via a temp file and rename.
fn write_atomically(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp_path = dir.join(format!("{}.tmp", name));
    let final_path = dir.join(name);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, &final_path)?;
    Ok(())
}

/// Persists a collection record into `dir`.
///
/// The vector file is skipped while the collection is still empty
/// (`dimension` unset). The sidecar is always written.
pub(crate) fn save_collection(dir: &Path, record: &CollectionRecord) -> Result<()> {
    fs::create_dir_all(dir)?;

    if let (Some(dimension), Some(index)) = (record.dimension(), record.index.as_ref()) {
        let vector_file = VectorFile {
            dimension: dimension as u32,
            data: index.raw_data().to_vec(),
        };
        let bytes = bincode::serialize(&vector_file).map_err(StorageError::from)?;
        write_atomically(dir, VECTORS_FILE, &bytes)?;
    }

    let sidecar = Sidecar {
        documents: record.documents.clone(),
        metadatas: record.metadatas.clone(),
        row_to_id: record.row_to_id.clone(),
        id_to_row: record.id_to_row.clone(),
        extra_metadata: record.extra_metadata.clone(),
        dimension: record.dimension(),
    };
    let json = serde_json::to_vec(&sidecar).map_err(StorageError::from)?;
    write_atomically(dir, SIDECAR_FILE, &json)?;

    debug!(dir = %dir.display(), rows = record.count(), "collection saved");
    Ok(())
}

/// Loads a collection record from `dir`.
///
/// Returns `Ok(None)` if the sidecar does not exist (the collection does
/// not exist). A sidecar that exists but cannot be read or is internally
/// inconsistent raises [`StorageError::Corrupted`]. A missing vector
/// file with a present sidecar is a legal empty collection; the
/// dimension is recovered from the sidecar if previously recorded.
pub(crate) fn load_collection(dir: &Path) -> Result<Option<CollectionRecord>> {
    let sidecar_path = dir.join(SIDECAR_FILE);
    let json = match fs::read(&sidecar_path) {
        Ok(json) => json,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let sidecar: Sidecar = serde_json::from_slice(&json).map_err(|e| {
        StorageError::corrupted(format!(
            "unreadable sidecar at {}: {}",
            sidecar_path.display(),
            e
        ))
    })?;

    let rows = sidecar.documents.len();
    if sidecar.metadatas.len() != rows || sidecar.row_to_id.len() != rows {
        return Err(StorageError::corrupted(format!(
            "sidecar arrays out of lockstep at {}: {} documents, {} metadatas, {} ids",
            sidecar_path.display(),
            rows,
            sidecar.metadatas.len(),
            sidecar.row_to_id.len()
        ))
        .into());
    }

    let vectors_path = dir.join(VECTORS_FILE);
    let index = match fs::read(&vectors_path) {
        Ok(bytes) => {
            let vector_file: VectorFile = bincode::deserialize(&bytes).map_err(|e| {
                StorageError::corrupted(format!(
                    "unreadable vector store at {}: {}",
                    vectors_path.display(),
                    e
                ))
            })?;
            let dimension = vector_file.dimension as usize;
            if let Some(recorded) = sidecar.dimension {
                if recorded != dimension {
                    return Err(StorageError::corrupted(format!(
                        "dimension disagreement at {}: sidecar says {}, vector store says {}",
                        dir.display(),
                        recorded,
                        dimension
                    ))
                    .into());
                }
            }
            let index = FlatIndex::from_raw(dimension, vector_file.data).map_err(|e| {
                StorageError::corrupted(format!(
                    "ragged vector store at {}: {}",
                    vectors_path.display(),
                    e
                ))
            })?;
            if index.len() != rows {
                return Err(StorageError::corrupted(format!(
                    "row count disagreement at {}: vector store has {}, sidecar has {}",
                    dir.display(),
                    index.len(),
                    rows
                ))
                .into());
            }
            Some(index)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if rows != 0 {
                return Err(StorageError::corrupted(format!(
                    "sidecar at {} lists {} documents but the vector store is missing",
                    sidecar_path.display(),
                    rows
                ))
                .into());
            }
            None
        }
        Err(err) => return Err(err.into()),
    };

    let dimension = index
        .as_ref()
        .map(|index| index.dimension())
        .or(sidecar.dimension);

    debug!(dir = %dir.display(), rows, "collection loaded");
    Ok(Some(CollectionRecord::from_parts(
        dimension,
        index,
        sidecar.documents,
        sidecar.metadatas,
        sidecar.row_to_id,
        sidecar.id_to_row,
        sidecar.extra_metadata,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataFilter;

    fn sample_record() -> CollectionRecord {
        let mut record = CollectionRecord::empty(Metadata::new());
        record
            .append_documents(
                &["apple".to_string(), "banana".to_string()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                None,
                Some(&[DocumentId::from("d1"), DocumentId::from("d2")]),
            )
            .unwrap();
        record
    }

    #[test]
    fn test_load_absent_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_collection(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record();
        save_collection(dir.path(), &record).unwrap();

        let loaded = load_collection(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.dimension(), Some(2));
        assert_eq!(loaded.row_for_id(&DocumentId::from("d2")), Some(1));

        let results = loaded.search(&[1.0, 0.0], 1, None).unwrap();
        assert_eq!(results[0].0, "apple");
    }

    #[test]
    fn test_empty_collection_has_no_vector_file() {
        let dir = tempfile::tempdir().unwrap();
        let record = CollectionRecord::empty(Metadata::new());
        save_collection(dir.path(), &record).unwrap();

        assert!(dir.path().join(SIDECAR_FILE).exists());
        assert!(!dir.path().join(VECTORS_FILE).exists());

        let loaded = load_collection(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.count(), 0);
        assert!(loaded.dimension().is_none());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        save_collection(dir.path(), &sample_record()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_corrupt_sidecar_raises() {
        let dir = tempfile::tempdir().unwrap();
        save_collection(dir.path(), &sample_record()).unwrap();
        fs::write(dir.path().join(SIDECAR_FILE), b"{ not json").unwrap();

        let err = load_collection(dir.path()).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_corrupt_vector_file_raises() {
        let dir = tempfile::tempdir().unwrap();
        save_collection(dir.path(), &sample_record()).unwrap();
        fs::write(dir.path().join(VECTORS_FILE), b"garbage").unwrap();

        let err = load_collection(dir.path()).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_missing_vector_file_with_rows_raises() {
        let dir = tempfile::tempdir().unwrap();
        save_collection(dir.path(), &sample_record()).unwrap();
        fs::remove_file(dir.path().join(VECTORS_FILE)).unwrap();

        let err = load_collection(dir.path()).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_recorded_dimension_recovered_without_vector_file() {
        let dir = tempfile::tempdir().unwrap();
        // Empty collection whose sidecar already records a dimension
        fs::write(
            dir.path().join(SIDECAR_FILE),
            br#"{"documents":[],"metadatas":[],"row_to_id":[],"id_to_row":{},"extra_metadata":{},"dimension":2}"#,
        )
        .unwrap();

        let mut loaded = load_collection(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.count(), 0);
        assert_eq!(loaded.dimension(), Some(2));

        // The recovered dimension is enforced on the next append
        let err = loaded
            .append_documents(&["x".to_string()], vec![vec![1.0, 0.0, 0.0]], None, None)
            .unwrap_err();
        assert!(err.is_dimension_mismatch());

        loaded
            .append_documents(&["x".to_string()], vec![vec![1.0, 0.0]], None, None)
            .unwrap();
        assert_eq!(loaded.count(), 1);
    }

    #[test]
    fn test_metadata_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = CollectionRecord::empty(Metadata::new());
        let metas: Vec<Metadata> = vec![
            [("source".to_string(), "A".into())].into_iter().collect(),
            [("source".to_string(), "B".into())].into_iter().collect(),
        ];
        record
            .append_documents(
                &["a".to_string(), "b".to_string()],
                vec![vec![1.0, 0.0], vec![0.9, 0.1]],
                Some(&metas),
                None,
            )
            .unwrap();
        save_collection(dir.path(), &record).unwrap();

        let loaded = load_collection(dir.path()).unwrap().unwrap();
        let filter = MetadataFilter::new().with("source", "B");
        let results = loaded.search(&[1.0, 0.0], 5, Some(&filter)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "b");
    }
}
