//! Abundance histogram builder.

use std::io::Write;

use anyhow::{Context, Result};

use super::table::CountTable;

/// Number of histogram bins; the last bin absorbs all counts `>= BINS`.
pub const BINS: usize = 10_001;

/// `H`: H[i] is the number of distinct fingerprints whose count equals `i+1`,
/// except `H[BINS-1]` absorbs all counts `>= BINS`.
pub struct Histogram {
    bins: [i64; BINS],
}

impl Histogram {
    /// Walk every counter in `table` and bin its value.
    pub fn build(table: &CountTable) -> Self {
        let mut bins = [0i64; BINS];
        for &c in table.as_slice() {
            if c > 0 {
                let idx = (c as usize).min(BINS) - 1;
                bins[idx] += 1;
            }
        }
        Histogram { bins }
    }

    /// Print each non-zero bin as a `count occurrences` pair in ascending
    /// count order.
    pub fn write_report<W: Write>(&self, mut out: W) -> Result<()> {
        for (i, &occurrences) in self.bins.iter().enumerate() {
            if occurrences != 0 {
                writeln!(out, "{} {}", i + 1, occurrences).context("writing histogram line")?;
            }
        }
        Ok(())
    }

    pub fn bins(&self) -> &[i64; BINS] {
        &self.bins
    }
}
