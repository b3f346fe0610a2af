//! In-memory catalog and its persisted form.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use melodeez_embed::Embedding;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;

/// Format tag of the persisted catalog.
pub const CATALOG_FORMAT: &str = "melodeez-catalog";

/// Version of the persisted catalog layout.
pub const CATALOG_FORMAT_VERSION: u32 = 1;

/// One reference track and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub embedding: Embedding,
}

/// Immutable set of catalog entries built with one model version.
///
/// Entries keep their insertion order, which is the final tie-breaker when
/// ranking equal matches. The index is never mutated after it is built, so
/// it can be shared by concurrent queries behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    model_version: String,
    dimension: usize,
    entries: Vec<CatalogEntry>,
    ids: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct CatalogDoc {
    format: String,
    format_version: u32,
    model_version: String,
    dimension: usize,
    tracks: Vec<CatalogEntry>,
}

impl CatalogIndex {
    /// Creates an empty index.
    pub fn new(model_version: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_version: model_version.into(),
            dimension,
            entries: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Creates an index from pre-computed entries.
    ///
    /// Fails on a repeated track id or an embedding of the wrong length.
    pub fn from_entries(
        model_version: impl Into<String>,
        dimension: usize,
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<Self, CatalogError> {
        let mut index = Self::new(model_version, dimension);
        for entry in entries {
            index.insert(entry)?;
        }
        Ok(index)
    }

    pub(crate) fn insert(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if self.ids.contains_key(&entry.track_id) {
            return Err(CatalogError::DuplicateTrack(entry.track_id));
        }
        if entry.embedding.dimension() != self.dimension {
            return Err(CatalogError::DimensionMismatch {
                expected: self.dimension,
                got: entry.embedding.dimension(),
            });
        }
        self.ids.insert(entry.track_id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub(crate) fn contains(&self, track_id: &str) -> bool {
        self.ids.contains_key(track_id)
    }

    /// All entries in insertion order.
    pub fn all(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, track_id: &str) -> Option<&CatalogEntry> {
        self.ids.get(track_id).map(|&i| &self.entries[i])
    }

    /// Version of the model whose embeddings this index holds.
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Serializes the index as JSON.
    ///
    /// ```text
    /// {
    ///   "format": "melodeez-catalog", "format_version": 1,
    ///   "model_version": "proj-v1", "dimension": 512,
    ///   "tracks": [ { "track_id", "title", "artist", "embedding": [..] }, ... ]
    /// }
    /// ```
    pub fn save(&self, w: &mut dyn Write) -> Result<(), CatalogError> {
        let doc = CatalogDoc {
            format: CATALOG_FORMAT.to_string(),
            format_version: CATALOG_FORMAT_VERSION,
            model_version: self.model_version.clone(),
            dimension: self.dimension,
            tracks: self.entries.clone(),
        };
        let mut bw = BufWriter::new(w);
        serde_json::to_writer(&mut bw, &doc)?;
        bw.flush()?;
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CatalogError> {
        let mut file = File::create(path)?;
        self.save(&mut file)
    }

    /// Loads an index and checks that it was built with `expected_version`.
    ///
    /// A different model version yields [`CatalogError::VersionMismatch`]:
    /// distances across embedding spaces are meaningless.
    pub fn load(r: &mut dyn Read, expected_version: &str) -> Result<Self, CatalogError> {
        let index = Self::load_unverified(r)?;
        if index.model_version != expected_version {
            return Err(CatalogError::VersionMismatch {
                expected: expected_version.to_string(),
                got: index.model_version,
            });
        }
        Ok(index)
    }

    /// Loads an index without checking its model version. Only suitable for
    /// inspection; searching requires [`CatalogIndex::load`].
    pub fn load_unverified(r: &mut dyn Read) -> Result<Self, CatalogError> {
        let doc: CatalogDoc = serde_json::from_reader(BufReader::new(r)).map_err(|e| {
            if e.is_io() {
                CatalogError::Io(e.into())
            } else {
                CatalogError::InvalidFormat(e.to_string())
            }
        })?;

        if doc.format != CATALOG_FORMAT {
            return Err(CatalogError::InvalidFormat(format!(
                "unexpected format tag {:?}",
                doc.format
            )));
        }
        if doc.format_version != CATALOG_FORMAT_VERSION {
            return Err(CatalogError::InvalidFormat(format!(
                "unsupported format version {}",
                doc.format_version
            )));
        }

        let index = Self::from_entries(doc.model_version, doc.dimension, doc.tracks)?;
        info!(
            model_version = %index.model_version,
            dimension = index.dimension,
            tracks = index.size(),
            "catalog: loaded"
        );
        Ok(index)
    }

    pub fn load_from_path(path: &Path, expected_version: &str) -> Result<Self, CatalogError> {
        let mut file = File::open(path)?;
        Self::load(&mut file, expected_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, v: Vec<f32>) -> CatalogEntry {
        CatalogEntry {
            track_id: id.to_string(),
            title: format!("Title {id}"),
            artist: "Artist".to_string(),
            embedding: Embedding::new(v),
        }
    }

    #[test]
    fn from_entries_keeps_order() {
        let idx = CatalogIndex::from_entries(
            "v1",
            2,
            [entry("b", vec![0.0, 1.0]), entry("a", vec![1.0, 0.0])],
        )
        .unwrap();
        assert_eq!(idx.size(), 2);
        assert_eq!(idx.all()[0].track_id, "b");
        assert_eq!(idx.get("a").unwrap().embedding.as_slice(), &[1.0, 0.0]);
        assert!(idx.get("c").is_none());
    }

    #[test]
    fn duplicate_id_rejected() {
        let err = CatalogIndex::from_entries(
            "v1",
            2,
            [entry("a", vec![0.0, 1.0]), entry("a", vec![1.0, 0.0])],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTrack(id) if id == "a"));
    }

    #[test]
    fn wrong_dimension_rejected() {
        let err = CatalogIndex::from_entries("v1", 3, [entry("a", vec![0.0, 1.0])]).unwrap_err();
        assert!(matches!(err, CatalogError::DimensionMismatch { expected: 3, got: 2 }));
    }

    #[test]
    fn save_load_roundtrip() {
        let idx = CatalogIndex::from_entries(
            "proj-v1",
            3,
            [entry("x", vec![0.1, -0.2, 0.3]), entry("y", vec![1e-7, 0.5, -1.0])],
        )
        .unwrap();
        let mut buf = Vec::new();
        idx.save(&mut buf).unwrap();

        let loaded = CatalogIndex::load(&mut buf.as_slice(), "proj-v1").unwrap();
        assert_eq!(loaded.all(), idx.all());
        assert_eq!(loaded.model_version(), "proj-v1");
        assert_eq!(loaded.dimension(), 3);
    }

    #[test]
    fn version_mismatch_fails_fast() {
        let idx = CatalogIndex::from_entries("proj-v1", 2, [entry("x", vec![1.0, 0.0])]).unwrap();
        let mut buf = Vec::new();
        idx.save(&mut buf).unwrap();

        let err = CatalogIndex::load(&mut buf.as_slice(), "proj-v2").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::VersionMismatch { ref expected, ref got } if expected == "proj-v2" && got == "proj-v1"
        ));
        assert!(CatalogIndex::load_unverified(&mut buf.as_slice()).is_ok());
    }

    #[test]
    fn malformed_documents_rejected() {
        let bad_json = b"{ nope".to_vec();
        assert!(matches!(
            CatalogIndex::load(&mut bad_json.as_slice(), "v"),
            Err(CatalogError::InvalidFormat(_))
        ));

        let wrong_tag = br#"{"format":"other","format_version":1,"model_version":"v","dimension":2,"tracks":[]}"#;
        assert!(matches!(
            CatalogIndex::load(&mut wrong_tag.as_slice(), "v"),
            Err(CatalogError::InvalidFormat(_))
        ));

        let future = br#"{"format":"melodeez-catalog","format_version":9,"model_version":"v","dimension":2,"tracks":[]}"#;
        assert!(matches!(
            CatalogIndex::load(&mut future.as_slice(), "v"),
            Err(CatalogError::InvalidFormat(_))
        ));
    }

    #[test]
    fn empty_catalog_roundtrips() {
        let idx = CatalogIndex::new("v", 4);
        let mut buf = Vec::new();
        idx.save(&mut buf).unwrap();
        let loaded = CatalogIndex::load(&mut buf.as_slice(), "v").unwrap();
        assert!(loaded.is_empty());
    }
}
