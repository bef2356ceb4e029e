//! Key space partitioning and canonical shard range identifiers.
//!
//! A keyspace's row keys live in the half-open interval `[0, MAX)` where
//! `MAX = 2^(8 * num_bytes)`. A shard is a contiguous sub-interval, named
//! by the lowercase unpadded hex of its bounds joined with `-`:
//!
//! - the full range collapses to the literal `"0"`
//! - a lower bound of 0 omits the left operand (`"-80"`)
//! - an upper bound of MAX omits the right operand (`"80-"`)
//!
//! External tooling parses these names, so the encoding is a contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use shardplan_commons::{PlanError, Result};

/// Default key width in bytes (256 key-space points).
pub const DEFAULT_NUM_BYTES: u32 = 1;

/// Canonical string form of a shard's key range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(String);

impl ShardId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ShardId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A contiguous half-open interval over the key space.
///
/// Invariant: `0 <= start < end <= MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: u128,
    pub end: u128,
}

impl KeyRange {
    pub fn new(start: u128, end: u128) -> Self {
        Self { start, end }
    }
}

/// An N-byte-wide key space that can be partitioned into shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpace {
    num_bytes: u32,
}

impl KeySpace {
    /// Creates a key space `num_bytes` wide. Valid widths are 1..=8.
    pub fn new(num_bytes: u32) -> Result<Self> {
        if num_bytes == 0 || num_bytes > 8 {
            return Err(PlanError::invalid_argument(format!(
                "key width must be between 1 and 8 bytes, got {}",
                num_bytes
            )));
        }
        Ok(Self { num_bytes })
    }

    pub fn num_bytes(&self) -> u32 {
        self.num_bytes
    }

    /// Exclusive upper bound of the key space: `2^(8 * num_bytes)`.
    pub fn max(&self) -> u128 {
        1u128 << (8 * self.num_bytes)
    }

    /// Canonical shard name for a key range within this key space.
    pub fn shard_id(&self, range: KeyRange) -> ShardId {
        let left = self.bound_str(range.start);
        let right = self.bound_str(range.end);
        if left.is_empty() && right.is_empty() {
            return ShardId::from("0");
        }
        ShardId::from(format!("{}-{}", left, right))
    }

    fn bound_str(&self, bound: u128) -> String {
        if bound == 0 || bound == self.max() {
            String::new()
        } else {
            format!("{:x}", bound)
        }
    }

    /// Parses a canonical shard name back into its key range.
    ///
    /// Accepts operator-entered shard names, so malformed input is an
    /// `InvalidArgument` rather than a panic.
    pub fn parse_shard(&self, shard: &ShardId) -> Result<KeyRange> {
        let s = shard.as_str();
        if s == "0" {
            return Ok(KeyRange::new(0, self.max()));
        }
        let (left, right) = s.split_once('-').ok_or_else(|| {
            PlanError::invalid_argument(format!("malformed shard name: {}", s))
        })?;
        let start = self.parse_bound(left, 0)?;
        let end = self.parse_bound(right, self.max())?;
        if start >= end || end > self.max() {
            return Err(PlanError::invalid_argument(format!(
                "shard range out of order or out of bounds: {}",
                s
            )));
        }
        Ok(KeyRange::new(start, end))
    }

    fn parse_bound(&self, text: &str, empty_means: u128) -> Result<u128> {
        if text.is_empty() {
            return Ok(empty_means);
        }
        u128::from_str_radix(text, 16).map_err(|e| {
            PlanError::invalid_argument(format!("bad shard bound '{}': {}", text, e))
        })
    }

    /// Partitions the key space into `num_shards` contiguous equal-width
    /// ranges and returns their canonical names in ascending order.
    ///
    /// Widths use integer division; when MAX is not evenly divisible the
    /// final boundary is forced to MAX so the returned shards always tile
    /// `[0, MAX)` with no gap.
    pub fn partition(&self, num_shards: usize) -> Result<Vec<ShardId>> {
        if num_shards == 0 {
            return Err(PlanError::invalid_argument("num_shards must be > 0"));
        }
        let max = self.max();
        let size = max / num_shards as u128;
        if size == 0 {
            return Err(PlanError::invalid_argument(format!(
                "num_shards {} exceeds key space size {}",
                num_shards, max
            )));
        }
        let mut shards = Vec::with_capacity(num_shards);
        for i in 1..=num_shards as u128 {
            let start = (i - 1) * size;
            let end = if i == num_shards as u128 { max } else { i * size };
            shards.push(self.shard_id(KeyRange::new(start, end)));
        }
        Ok(shards)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            num_bytes: DEFAULT_NUM_BYTES,
        }
    }
}
