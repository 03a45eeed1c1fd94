//! Unigram weights addressed by term id.

use std::path::Path;

use crate::artifact;
use crate::errors::{GramError, Result};

/// Weight stored for out-of-vocabulary id 0.
pub const OOV_WEIGHT: f32 = 0.0;

/// Dense `f32` weights indexed by term id. Slot 0 always holds
/// [`OOV_WEIGHT`].
///
/// On disk this is the raw little-endian concatenation of the values.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightArray {
    weights: Vec<f32>,
}

impl Default for WeightArray {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightArray {
    pub fn new() -> Self {
        Self {
            weights: vec![OOV_WEIGHT],
        }
    }

    /// Appends a weight and returns the id it is stored under.
    pub fn push(&mut self, weight: f32) -> usize {
        self.weights.push(weight);
        self.weights.len() - 1
    }

    /// Id the next pushed weight will receive.
    pub fn next_id(&self) -> usize {
        self.weights.len()
    }

    pub fn get(&self, id: i32) -> Option<f32> {
        usize::try_from(id).ok().and_then(|i| self.weights.get(i).copied())
    }

    /// Number of slots, including the OOV slot.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the array holds no real term.
    pub fn is_empty(&self) -> bool {
        self.weights.len() <= 1
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.weights.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(GramError::invalid(
                path,
                format!("length {} is not a multiple of 4", bytes.len()),
            ));
        }
        let weights: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if weights.first() != Some(&OOV_WEIGHT) {
            return Err(GramError::invalid(path, "missing OOV slot"));
        }
        Ok(Self { weights })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::write_artifact(path, &self.to_bytes())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mmap = artifact::map_artifact(path)?;
        Self::from_bytes(&mmap, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_oov_slot() {
        let weights = WeightArray::new();
        assert_eq!(weights.len(), 1);
        assert!(weights.is_empty());
        assert_eq!(weights.get(0), Some(0.0));
        assert_eq!(weights.get(1), None);
        assert_eq!(weights.get(-1), None);
    }

    #[test]
    fn test_push_assigns_ids() {
        let mut weights = WeightArray::new();
        assert_eq!(weights.next_id(), 1);
        assert_eq!(weights.push(0.5), 1);
        assert_eq!(weights.push(1.5), 2);
        assert_eq!(weights.get(2), Some(1.5));
    }

    #[test]
    fn test_file_layout() {
        let mut weights = WeightArray::new();
        weights.push(1.0);
        let bytes = weights.to_bytes();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0x80, 0x3f]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unigram.bin");
        let mut weights = WeightArray::new();
        weights.push(0.287_682);
        weights.push(1.386_294);
        weights.save(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
        assert_eq!(WeightArray::load(&path).unwrap(), weights);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let err = WeightArray::from_bytes(&[0, 0, 0, 0, 1], Path::new("w")).unwrap_err();
        assert!(matches!(err, GramError::InvalidArtifact { .. }));
        let err = WeightArray::from_bytes(&[], Path::new("w")).unwrap_err();
        assert!(matches!(err, GramError::InvalidArtifact { .. }));
    }
}
