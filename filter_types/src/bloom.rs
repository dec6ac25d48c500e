//! `bloom`: bit array + k hash functions sized to expected cardinality `n`
//! and target false-positive rate `ε` (spec §3).

use crate::error::{CodecSnafu, Error};
use bitvec::prelude::*;
use data_types::{ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A Bloom filter over a column's unique values.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions applied per probe.
    k: u32,
    logical_type: LogicalType,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct State {
    bits: Vec<bool>,
    k: u32,
    logical_type: LogicalType,
}

impl BloomFilter {
    /// Build a Bloom filter sized for `(n, error_rate)` from a column
    /// stream. Two logical passes over the *unique value set* (spec §4.1):
    /// a single pass over `chunks` collects the unique values (and thus
    /// `n`), then the sized bit array is populated from that set.
    pub fn build_from_stream(
        chunks: ColumnChunkStream,
        error_rate: f64,
    ) -> Result<Self, Error> {
        let mut unique: HashSet<Value> = HashSet::new();
        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                unique.insert(value);
            }
        }

        // spec: bloom is one of the two variants allowed to build empty
        // (it simply rejects every probe).
        let logical_type = unique
            .iter()
            .next()
            .map(|v| v.logical_type())
            .unwrap_or(LogicalType::String);

        let n = unique.len().max(1);
        let (m, k) = size_for(n, error_rate);
        let mut bits = bitvec![u8, Lsb0; 0; m];

        for value in &unique {
            for slot in hash_slots(value, k, m) {
                bits.set(slot, true);
            }
        }

        Ok(Self {
            bits,
            k,
            logical_type,
        })
    }

    /// Fold additional data into an already-built filter. Only used during
    /// construction (spec §3: never called after publication).
    pub fn update(&mut self, chunk: data_types::ColumnChunk) {
        let m = self.bits.len();
        for value in chunk.into_iter().flatten() {
            for slot in hash_slots(&value, self.k, m) {
                self.bits.set(slot, true);
            }
        }
    }

    /// Probabilistic membership test: `false` is certain, `true` is "maybe".
    pub fn test(&self, value: &Value) -> bool {
        if self.bits.is_empty() {
            return false;
        }
        let m = self.bits.len();
        hash_slots(value, self.k, m).all(|slot| self.bits[slot])
    }

    pub(crate) fn to_state(&self) -> State {
        State {
            bits: self.bits.iter().by_vals().collect(),
            k: self.k,
            logical_type: self.logical_type,
        }
    }

    pub(crate) fn from_state(state: State) -> Self {
        Self {
            bits: state.bits.into_iter().collect(),
            k: state.k,
            logical_type: state.logical_type,
        }
    }

    pub(crate) fn logical_type(&self) -> LogicalType {
        self.logical_type
    }
}

/// Compute `(m bits, k hashes)` from the standard Bloom filter sizing
/// formulas for expected cardinality `n` and target false positive rate `p`.
fn size_for(n: usize, p: f64) -> (usize, u32) {
    let n = n as f64;
    let ln2 = std::f64::consts::LN_2;
    let m = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(8.0);
    let k = ((m / n) * ln2).round().max(1.0);
    (m as usize, k as u32)
}

fn hash_slots(value: &Value, k: u32, m: usize) -> impl Iterator<Item = usize> {
    let h1 = hash_with_seed(value, 0);
    let h2 = hash_with_seed(value, 1);
    (0..k).map(move |i| {
        let combined = h1.wrapping_add((i as u64).wrapping_mul(h2));
        (combined % m as u64) as usize
    })
}

fn hash_with_seed(value: &Value, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn serialize(filter: &BloomFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(&filter.to_state()).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<BloomFilter, Error> {
    let state: State = bincode::deserialize(bytes).context(CodecSnafu)?;
    Ok(BloomFilter::from_state(state))
}
