//! The direct-addressed count table: one 32-bit counter per possible
//! fingerprint.

use anyhow::{bail, Context, Result};

/// `C`: a fixed array of `4^k` 32-bit counters, addressed directly by
/// fingerprint. Never resized after construction.
pub struct CountTable {
    counts: Vec<u32>,
}

impl CountTable {
    /// Allocate a zeroed table sized for k-mer length `k`.
    pub fn build(k: u32) -> Result<Self> {
        let len = 4usize
            .checked_pow(k)
            .context("k-mer size too large for the count table")?;
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(len)
            .map_err(|e| anyhow::anyhow!("out of memory allocating count table for k={k}: {e}"))?;
        counts.resize(len, 0);
        Ok(CountTable { counts })
    }

    /// Wrap an already-sized counter array, e.g. one just loaded from disk.
    pub fn from_vec(counts: Vec<u32>, k: u32) -> Result<Self> {
        let expected = 4usize
            .checked_pow(k)
            .context("k-mer size too large for the count table")?;
        if counts.len() != expected {
            bail!(
                "loaded table has {} counters, expected {} for k={k}",
                counts.len(),
                expected
            );
        }
        Ok(CountTable { counts })
    }

    /// `incr(h)`: C[h] += 1. No overflow check; genome-scale inputs are
    /// assumed to fit in a u32 counter.
    #[inline]
    pub fn incr(&mut self, h: u64) {
        self.counts[h as usize] = self.counts[h as usize].wrapping_add(1);
    }

    /// `get(h)`: C[h].
    #[inline]
    pub fn get(&self, h: u64) -> u32 {
        self.counts[h as usize]
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.counts
    }
}
