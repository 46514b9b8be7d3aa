//! Table persistence: the raw little-endian counter image on disk.
//!
//! No header, no checksum, no versioning — a reader rejects any file whose
//! size isn't exactly `4 * 4^k` bytes.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::table::CountTable;

/// Load a stored table for k-mer size `k` from `path`. Fatal on any failure
/// (open, short read, or wrong size) — loading was explicitly requested.
pub fn load(path: &Path, k: u32) -> Result<CountTable> {
    let expected_len = 4usize
        .checked_pow(k)
        .context("k-mer size too large for the count table")?;
    let expected_bytes = expected_len
        .checked_mul(4)
        .context("table byte size overflowed")?;

    let mut file = File::open(path)
        .with_context(|| format!("opening stored table {}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .with_context(|| format!("reading stored table {}", path.display()))?;

    if bytes.len() != expected_bytes {
        bail!(
            "stored table {} has {} bytes, expected {} for k={k}",
            path.display(),
            bytes.len(),
            expected_bytes
        );
    }

    let counts: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    CountTable::from_vec(counts, k)
}

/// Save `table` to `path` as a raw little-endian counter image. A failure
/// here (open or short write) is a warning, not fatal — the run continues
/// with the in-memory table.
pub fn save(table: &CountTable, path: &Path) -> Result<()> {
    save_inner(table, path)
}

fn save_inner(table: &CountTable, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating stored table {}", path.display()))?;
    for &c in table.as_slice() {
        file.write_all(&c.to_le_bytes())
            .with_context(|| format!("writing stored table {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_round_trips_pointwise() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.bin");

        let mut table = CountTable::build(13).unwrap();
        table.incr(0);
        table.incr(0);
        table.incr(4_000_000);

        save(&table, &path).unwrap();
        let loaded = load(&path, 13).unwrap();

        assert_eq!(loaded.as_slice(), table.as_slice());
    }

    #[test]
    fn load_rejects_wrong_size_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.bin");
        std::fs::write(&path, [0u8; 10]).unwrap();
        assert!(load(&path, 13).is_err());
    }

    #[test]
    fn load_rejects_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.bin");
        assert!(load(&path, 13).is_err());
    }
}
