//! Immutable open-addressed hash table from `i64` keys to `f32` values.
//!
//! The table is built once from a complete set of pairs and stored in the
//! exact byte layout it is probed in, so a reader can memory-map the file and
//! look keys up without rebuilding anything.
//!
//! Layout (little-endian):
//!
//! ```text
//! [magic "GRHT"][version: u32][len: u64][slots: u64]
//! [key: i64][value: f32] x slots
//! ```
//!
//! `slots` is a power of two at least twice `len`. Key 0 marks an empty
//! slot. Collisions are resolved by linear probing.

use std::path::Path;

use memmap2::Mmap;

use crate::artifact;
use crate::errors::{GramError, Result};

const MAGIC: [u8; 4] = *b"GRHT";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 24;
const SLOT_SIZE: usize = 12;

/// Key value marking an unused slot. It can never be stored.
pub const EMPTY_KEY: i64 = 0;

/// SplitMix64 finalizer.
fn mix64(key: i64) -> u64 {
    let mut z = key as u64;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

pub struct StaticHashTable<D = Vec<u8>> {
    data: D,
    len: usize,
    mask: usize,
}

impl StaticHashTable<Vec<u8>> {
    /// Builds a table holding every `(key, value)` pair.
    ///
    /// Fails if a key is repeated or equals [`EMPTY_KEY`].
    pub fn build(pairs: &[(i64, f32)]) -> Result<Self> {
        let slots = (pairs.len() * 2).next_power_of_two();
        let mask = slots - 1;
        let mut keys = vec![EMPTY_KEY; slots];
        let mut values = vec![0f32; slots];

        for &(key, value) in pairs {
            if key == EMPTY_KEY {
                return Err(GramError::DuplicateKey { key });
            }
            let mut i = mix64(key) as usize & mask;
            loop {
                if keys[i] == EMPTY_KEY {
                    keys[i] = key;
                    values[i] = value;
                    break;
                }
                if keys[i] == key {
                    return Err(GramError::DuplicateKey { key });
                }
                i = (i + 1) & mask;
            }
        }

        let mut data = Vec::with_capacity(HEADER_SIZE + slots * SLOT_SIZE);
        data.extend_from_slice(&MAGIC);
        data.extend_from_slice(&VERSION.to_le_bytes());
        data.extend_from_slice(&(pairs.len() as u64).to_le_bytes());
        data.extend_from_slice(&(slots as u64).to_le_bytes());
        for (key, value) in keys.iter().zip(&values) {
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }

        Ok(Self {
            data,
            len: pairs.len(),
            mask,
        })
    }
}

impl StaticHashTable<Mmap> {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bytes(artifact::map_artifact(path)?, path)
    }
}

impl<D: AsRef<[u8]>> StaticHashTable<D> {
    /// Validates the header of a serialized table. `path` is only used in
    /// errors.
    pub fn from_bytes(data: D, path: &Path) -> Result<Self> {
        let bytes = data.as_ref();
        if bytes.len() < HEADER_SIZE {
            return Err(GramError::invalid(path, "truncated header"));
        }
        if bytes[..4] != MAGIC {
            return Err(GramError::invalid(path, "bad magic"));
        }
        let version = read_u32(bytes, 4);
        if version != VERSION {
            return Err(GramError::invalid(
                path,
                format!("unsupported version {version}"),
            ));
        }
        let len = read_u64(bytes, 8) as usize;
        let slots = read_u64(bytes, 16) as usize;
        if !slots.is_power_of_two() || len > slots / 2 {
            return Err(GramError::invalid(
                path,
                format!("{len} entries do not fit {slots} slots"),
            ));
        }
        let expected = slots
            .checked_mul(SLOT_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE));
        if expected != Some(bytes.len()) {
            return Err(GramError::invalid(
                path,
                format!("size {} does not match {slots} slots", bytes.len()),
            ));
        }

        Ok(Self {
            data,
            len,
            mask: slots - 1,
        })
    }

    fn slot(&self, i: usize) -> (i64, f32) {
        let bytes = self.data.as_ref();
        let at = HEADER_SIZE + i * SLOT_SIZE;
        let key = read_u64(bytes, at) as i64;
        let value = f32::from_bits(read_u32(bytes, at + 8));
        (key, value)
    }

    pub fn get(&self, key: i64) -> Option<f32> {
        if key == EMPTY_KEY {
            return None;
        }
        let mut i = mix64(key) as usize & self.mask;
        for _ in 0..=self.mask {
            let (k, v) = self.slot(i);
            if k == key {
                return Some(v);
            }
            if k == EMPTY_KEY {
                return None;
            }
            i = (i + 1) & self.mask;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slots(&self) -> usize {
        self.mask + 1
    }

    /// Occupied `(key, value)` slots in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f32)> + '_ {
        (0..self.slots())
            .map(|i| self.slot(i))
            .filter(|&(k, _)| k != EMPTY_KEY)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        artifact::write_artifact(path, self.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::collections::HashMap;

    #[test]
    fn test_get_present_and_absent() {
        let table = StaticHashTable::build(&[(10, 1.5), (20, 2.5), (1 << 40, -3.0)]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.slots(), 8);
        assert_eq!(table.get(10), Some(1.5));
        assert_eq!(table.get(20), Some(2.5));
        assert_eq!(table.get(1 << 40), Some(-3.0));
        assert_eq!(table.get(30), None);
        assert_eq!(table.get(EMPTY_KEY), None);
    }

    #[test]
    fn test_empty_table() {
        let table = StaticHashTable::build(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.slots(), 1);
        assert_eq!(table.get(1), None);
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.as_bytes().len(), HEADER_SIZE + SLOT_SIZE);
    }

    #[test]
    fn test_duplicate_and_reserved_keys_are_rejected() {
        assert!(matches!(
            StaticHashTable::build(&[(5, 1.0), (5, 2.0)]),
            Err(GramError::DuplicateKey { key: 5 })
        ));
        assert!(matches!(
            StaticHashTable::build(&[(EMPTY_KEY, 1.0)]),
            Err(GramError::DuplicateKey { key: EMPTY_KEY })
        ));
    }

    #[test]
    fn test_random_pairs_match_hashmap() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut expected: HashMap<i64, f32> = HashMap::new();
        while expected.len() < 5000 {
            let left: i64 = rng.gen_range(1..1 << 20);
            let right: i64 = rng.gen_range(1..1 << 20);
            expected.insert((left << 32) | right, rng.gen::<f32>() * 20.0);
        }
        let mut pairs: Vec<(i64, f32)> = expected.iter().map(|(&k, &v)| (k, v)).collect();
        pairs.sort_by_key(|&(k, _)| k);

        let table = StaticHashTable::build(&pairs).unwrap();
        assert_eq!(table.len(), expected.len());
        assert!(table.slots() >= 2 * expected.len());
        for (k, v) in &expected {
            assert_eq!(table.get(*k), Some(*v));
        }
        for _ in 0..1000 {
            let k: i64 = rng.gen_range(1..i64::MAX);
            assert_eq!(table.get(k), expected.get(&k).copied());
        }
        assert_eq!(table.iter().count(), expected.len());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bigram.bin");
        let table = StaticHashTable::build(&[(1 << 32 | 2, 0.25), (3 << 32 | 1, 4.0)]).unwrap();
        table.save(&path).unwrap();

        let loaded = StaticHashTable::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(1 << 32 | 2), Some(0.25));
        assert_eq!(loaded.get(3 << 32 | 1), Some(4.0));
        assert_eq!(loaded.get(2 << 32 | 1), None);
        assert_eq!(loaded.as_bytes(), table.as_bytes());
    }

    #[test]
    fn test_build_is_deterministic() {
        let pairs = [(11, 1.0), (22, 2.0), (33, 3.0), (44, 4.0)];
        let a = StaticHashTable::build(&pairs).unwrap();
        let b = StaticHashTable::build(&pairs).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_corrupt_files_are_rejected() {
        let table = StaticHashTable::build(&[(7, 1.0)]).unwrap();
        let bytes = table.as_bytes().to_vec();
        let path = Path::new("bigram.bin");

        assert!(StaticHashTable::from_bytes(&bytes[..10], path).is_err());
        assert!(StaticHashTable::from_bytes(&bytes[..bytes.len() - 1], path).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(StaticHashTable::from_bytes(bad_magic, path).is_err());

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(StaticHashTable::from_bytes(bad_version, path).is_err());

        assert!(StaticHashTable::from_bytes(bytes, path).is_ok());
    }
}
