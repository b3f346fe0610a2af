//! Intermediate artifacts passed between stages through the workspace.
//!
//! Features and embeddings use a compact binary format:
//!
//! ```text
//! features:  [4B magic "MFEA"] [4B version=1]
//!            [4B num_mels] [4B num_frames] [4B valid_frames]
//!            [num_mels * num_frames x 4B float32], frame-major
//!
//! embedding: [4B magic "MEMB"] [4B version=1]
//!            [4B dim] [dim x 4B float32]
//! ```
//!
//! All multi-byte values are little-endian. Readers take the shape or
//! dimension the caller expects and reject any other header before reading
//! the payload. Results are written as JSON.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use melodeez_audio::{FeatureShape, FeatureTensor};
use melodeez_embed::Embedding;
use melodeez_search::RankedResult;

use crate::error::StageError;

const FEATURES_MAGIC: [u8; 4] = *b"MFEA";
const EMBEDDING_MAGIC: [u8; 4] = *b"MEMB";
const ARTIFACT_VERSION: u32 = 1;

fn artifact_err(path: &Path, reason: impl Into<String>) -> StageError {
    StageError::Artifact {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_f32s(r: &mut impl Read, n: usize) -> io::Result<Vec<f32>> {
    let mut bytes = vec![0u8; n * 4];
    r.read_exact(&mut bytes)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn write_f32s(w: &mut impl Write, values: &[f32]) -> io::Result<()> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn read_header(r: &mut impl Read, path: &Path, magic: [u8; 4]) -> Result<(), StageError> {
    let mut got = [0u8; 4];
    r.read_exact(&mut got)
        .map_err(|e| artifact_err(path, format!("read header: {e}")))?;
    if got != magic {
        return Err(artifact_err(path, format!("bad magic {got:?}")));
    }
    let version = read_u32(r).map_err(|e| artifact_err(path, format!("read header: {e}")))?;
    if version != ARTIFACT_VERSION {
        return Err(artifact_err(path, format!("unsupported version {version}")));
    }
    Ok(())
}

pub fn write_features(path: &Path, features: &FeatureTensor) -> Result<(), StageError> {
    let mut w = BufWriter::new(File::create(path)?);
    let shape = features.shape();
    w.write_all(&FEATURES_MAGIC)?;
    w.write_all(&ARTIFACT_VERSION.to_le_bytes())?;
    w.write_all(&(shape.num_mels as u32).to_le_bytes())?;
    w.write_all(&(shape.num_frames as u32).to_le_bytes())?;
    w.write_all(&(features.valid_frames() as u32).to_le_bytes())?;
    write_f32s(&mut w, features.as_slice())?;
    w.flush()?;
    Ok(())
}

pub fn read_features(path: &Path, expected: FeatureShape) -> Result<FeatureTensor, StageError> {
    let mut r = BufReader::new(File::open(path)?);
    read_header(&mut r, path, FEATURES_MAGIC)?;

    let truncated = |e: io::Error| artifact_err(path, format!("truncated: {e}"));
    let num_mels = read_u32(&mut r).map_err(truncated)? as usize;
    let num_frames = read_u32(&mut r).map_err(truncated)? as usize;
    let valid = read_u32(&mut r).map_err(truncated)? as usize;
    let shape = FeatureShape {
        num_mels,
        num_frames,
    };
    if shape != expected {
        return Err(artifact_err(path, format!("shape {shape}, want {expected}")));
    }
    let data = read_f32s(&mut r, shape.len()).map_err(truncated)?;

    FeatureTensor::from_parts(shape, valid, data).map_err(|e| artifact_err(path, e.to_string()))
}

pub fn write_embedding(path: &Path, embedding: &Embedding) -> Result<(), StageError> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(&EMBEDDING_MAGIC)?;
    w.write_all(&ARTIFACT_VERSION.to_le_bytes())?;
    w.write_all(&(embedding.dimension() as u32).to_le_bytes())?;
    write_f32s(&mut w, embedding.as_slice())?;
    w.flush()?;
    Ok(())
}

pub fn read_embedding(path: &Path, expected_dim: usize) -> Result<Embedding, StageError> {
    let mut r = BufReader::new(File::open(path)?);
    read_header(&mut r, path, EMBEDDING_MAGIC)?;

    let truncated = |e: io::Error| artifact_err(path, format!("truncated: {e}"));
    let dim = read_u32(&mut r).map_err(truncated)? as usize;
    if dim != expected_dim {
        return Err(artifact_err(path, format!("dimension {dim}, want {expected_dim}")));
    }
    let values = read_f32s(&mut r, dim).map_err(truncated)?;
    Ok(Embedding::new(values))
}

pub fn write_results(path: &Path, results: &[RankedResult]) -> Result<(), StageError> {
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut w, results).map_err(|e| artifact_err(path, e.to_string()))?;
    w.flush()?;
    Ok(())
}

pub fn read_results(path: &Path) -> Result<Vec<RankedResult>, StageError> {
    let r = BufReader::new(File::open(path)?);
    serde_json::from_reader(r).map_err(|e| artifact_err(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_survive_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.bin");
        let shape = FeatureShape { num_mels: 3, num_frames: 4 };
        let data: Vec<f32> = (0..12).map(|i| i as f32 * -1.5).collect();
        let features = FeatureTensor::from_parts(shape, 2, data).unwrap();

        write_features(&path, &features).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 20 + 12 * 4);
        assert_eq!(read_features(&path, shape).unwrap(), features);
    }

    #[test]
    fn embedding_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.emb");
        let e = Embedding::new(vec![0.6, -0.8, 1e-9]);
        write_embedding(&path, &e).unwrap();
        assert_eq!(read_embedding(&path, 3).unwrap(), e);
    }

    #[test]
    fn wrong_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.emb");
        write_embedding(&path, &Embedding::new(vec![1.0])).unwrap();
        let shape = FeatureShape { num_mels: 1, num_frames: 1 };
        assert!(matches!(read_features(&path, shape), Err(StageError::Artifact { .. })));
    }

    #[test]
    fn truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.bin");
        let shape = FeatureShape { num_mels: 2, num_frames: 2 };
        write_features(&path, &FeatureTensor::from_parts(shape, 2, vec![0.0; 4]).unwrap()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(read_features(&path, shape), Err(StageError::Artifact { .. })));
    }

    #[test]
    fn corrupt_header_rejected_before_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.bin");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&FEATURES_MAGIC);
        bytes.extend_from_slice(&ARTIFACT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let shape = FeatureShape { num_mels: 80, num_frames: 630 };
        let err = read_features(&path, shape).unwrap_err();
        assert!(matches!(&err, StageError::Artifact { reason, .. } if reason.contains("want 80x630")), "{err}");

        let emb = dir.path().join("query.emb");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&EMBEDDING_MAGIC);
        bytes.extend_from_slice(&ARTIFACT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        std::fs::write(&emb, &bytes).unwrap();
        assert!(matches!(read_embedding(&emb, 512), Err(StageError::Artifact { .. })));
    }

    #[test]
    fn embedding_dimension_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.emb");
        write_embedding(&path, &Embedding::new(vec![0.6, 0.8])).unwrap();
        assert!(matches!(read_embedding(&path, 3), Err(StageError::Artifact { .. })));
    }

    #[test]
    fn missing_artifact_is_workspace_error() {
        let err = read_embedding(Path::new("/nonexistent/query.emb"), 4).unwrap_err();
        assert!(matches!(err, StageError::Workspace(_)));
    }

    #[test]
    fn results_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search_results.json");
        let results = vec![RankedResult {
            title: "Song A".into(),
            artist: "Artist X".into(),
            confidence_percent: 92.93,
        }];
        write_results(&path, &results).unwrap();
        assert_eq!(read_results(&path).unwrap(), results);
    }
}
