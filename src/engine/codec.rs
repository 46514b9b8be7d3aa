//! Base coding, window fingerprinting, and the rolling updater.
//!
//! This module is the hard part of the crate: encoding a k-mer window into
//! an integer fingerprint, recomputing that fingerprint in O(1) as the
//! window slides one base at a time, and the canonical (strand-symmetric)
//! variant used when `--canonical` is set.

use anyhow::{bail, Result};

/// A 2-bit base code, or the sentinel for "not A/C/G/T".
pub const INVALID: u8 = 4;

/// `code(b)`: A/a->0, C/c->1, G/g->2, T/t->3, anything else (including N/n) -> INVALID.
#[inline(always)]
pub fn code(b: u8) -> u8 {
    match b {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => INVALID,
    }
}

/// Immutable window parameters for one run.
///
/// * `k`            - k-mer size, one of 13, 15, 17.
/// * `r`            - region size (contributing run length). Equals `k` unless
///   `k == 15` and a gapped layout was requested.
/// * `g`            - interval size (gap run length). Non-zero only when `k == 15`.
/// * `num_regions`  - R = k / r.
/// * `window_span`  - W = (R-1)*g + k, total bases spanned by one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub k: u32,
    pub r: u32,
    pub g: u32,
    pub num_regions: u32,
    pub window_span: usize,
}

impl WindowParams {
    /// Build and validate window parameters for a chosen k, region size, and interval size.
    ///
    /// `r` defaults to `k` and `g` to 0 when not overridden; callers pass the raw
    /// CLI-resolved values (see `cli::opts`).
    pub fn new(k: u32, r: u32, g: u32) -> Result<Self> {
        if !matches!(k, 13 | 15 | 17) {
            bail!("k-mer size must be 13, 15, or 17 (got {k})");
        }
        if (r != k || g != 0) && k != 15 {
            bail!("region-size/interval-size may only be set when k=15");
        }
        if k == 15 && !matches!(r, 1 | 3 | 5 | 15) {
            bail!("region-size must be 1, 3, 5, or 15 (got {r})");
        }
        if r == 0 || k % r != 0 {
            bail!("region-size {r} must divide k {k} evenly");
        }
        let num_regions = k / r;
        let window_span = ((num_regions - 1) * g + k) as usize;
        Ok(WindowParams {
            k,
            r,
            g,
            num_regions,
            window_span,
        })
    }

    /// Number of contributing positions per window (R*r == k).
    #[inline]
    pub fn contributing_positions(&self) -> u32 {
        self.num_regions * self.r
    }

    /// Total fingerprint domain size, 4^k.
    pub fn domain_size(&self) -> u64 {
        4u64.checked_pow(self.k).expect("k <= 17 always fits u64")
    }
}

/// Outcome of encoding a window from scratch.
pub enum WindowHash {
    /// No `N` (or other invalid base) was found; carries the forward fingerprint.
    Valid(u64),
    /// The window contains an invalid base.
    ContainsN,
}

/// `hash_sequence`: encode the window starting at `seq[0..window_span)` into a
/// forward fingerprint, or report that it contains an invalid base.
///
/// Positions whose `i mod (r+g) < r` contribute; the rest are gap positions and
/// are skipped entirely. Contributing codes are packed left to right, most
/// significant pair first, so the leftmost contributing base ends up in the
/// fingerprint's top two bits and the rightmost in its bottom two. The result
/// always fills the full `2k`-bit range (every fingerprint lies in `[0, 4^k)`).
pub fn hash_sequence(seq: &[u8], params: &WindowParams) -> WindowHash {
    debug_assert!(seq.len() >= params.window_span);
    let period = params.r + params.g;
    let mut acc: u64 = 0;
    for i in 0..params.window_span as u32 {
        if i % period < params.r {
            let c = code(seq[i as usize]);
            if c == INVALID {
                return WindowHash::ContainsN;
            }
            acc = (acc << 2) | c as u64;
        }
    }
    WindowHash::Valid(acc)
}

/// `hash_rc`: reverse-complement fingerprint of `fw`, computed from scratch.
///
/// For each of the `k` contributing 2-bit slots of `fw` (low to high), invert
/// the two bits and append to the result from low to high. Used only when a
/// window is (re)initialised; the rolling updater keeps `Rc` in step afterwards.
pub fn hash_rc(fw: u64, k: u32) -> u64 {
    let mut fw = fw;
    let mut rc: u64 = 0;
    for _ in 0..k {
        let base = fw & 3;
        rc = (rc << 2) | (base ^ 3);
        fw >>= 2;
    }
    rc
}

/// Precomputed mask pair for the rolling updater, keyed by (k, num_regions).
///
/// `seq_mask` zeroes the two low bits of every contributing region plus the two
/// highest bits overall, to be OR'd with newly shifted-in forward codes.
/// `rc_mask` is the symmetric mask for the reverse-complement accumulator.
pub fn masks(k: u32, num_regions: u32) -> Result<(u64, u64)> {
    let pair = match (k, num_regions) {
        (13, 1) => (67_108_860u64, 16_777_215u64),
        (15, 1) => (1_073_741_820, 268_435_455),
        (15, 3) => (1_070_593_020, 267_648_255),
        (15, 5) => (1_022_611_260, 255_652_815),
        (15, 15) => (0, 0),
        (17, 1) => (17_179_869_180, 4_294_967_295),
        _ => bail!("no precomputed mask for k={k}, num_regions={num_regions}"),
    };
    Ok(pair)
}

/// Forward/reverse-complement/canonical fingerprint triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hashes {
    pub fw: u64,
    pub rc: u64,
    pub canonical: u64,
}

impl Hashes {
    /// Build the triple for a freshly (re)initialised window.
    pub fn new_window(fw: u64, k: u32) -> Self {
        let rc = hash_rc(fw, k);
        Hashes {
            fw,
            rc,
            canonical: fw.min(rc),
        }
    }
}

/// `shift_hash`: advance the rolling window by one base.
///
/// `new_base_hash_array[c]` is the 2-bit code of the single new base entering
/// region `c` this step (`c` counted left to right across the window, matching
/// `Fw`'s region layout). The "jump" between regions is `2k/R` bits.
///
/// `Fw` is shifted left and masked to clear the low two bits of every region's
/// segment, then each region's new code is OR'd into that now-empty low pair,
/// keeping region 0 in `Fw`'s highest segment.
///
/// `Rc` rolls the opposite way: it is shifted right and masked to clear the
/// high two bits of every region's segment. Because `Rc` represents the same
/// contributing bases in reverse, complemented, region `c`'s new complemented
/// code lands in region `(R-1-c)`'s segment of `Rc` (region 0 ends up in `Rc`'s
/// lowest segment) rather than mirroring `Fw`'s region order.
pub fn shift_hash(
    current: &Hashes,
    new_base_hash_array: &[u8],
    k: u32,
    num_regions: u32,
) -> Result<Hashes> {
    debug_assert_eq!(new_base_hash_array.len(), num_regions as usize);
    let (seq_mask, rc_mask) = masks(k, num_regions)?;
    let jump = 2 * k / num_regions;

    let mut new_fw = (current.fw << 2) & seq_mask;
    let mut new_rc = (current.rc >> 2) & rc_mask;

    for (c, &base) in new_base_hash_array.iter().enumerate() {
        let c = c as u64;
        // Region c occupies Fw's segment [jump*(R-1-c), jump*(R-c)); the new
        // code fills that segment's low two bits.
        let fw_shift = jump as u64 * (num_regions as u64 - 1 - c);
        new_fw |= (base as u64) << fw_shift;
        // Region c's complemented code fills the high two bits of Rc's
        // segment c (region order reversed relative to Fw).
        let rc_shift = jump as u64 * c + (jump as u64 - 2);
        new_rc |= ((base as u64) ^ 3) << rc_shift;
    }

    Ok(Hashes {
        fw: new_fw,
        rc: new_rc,
        canonical: new_fw.min(new_rc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(seq: &[u8]) -> Vec<u8> {
        seq.iter().map(|&b| code(b)).collect()
    }

    fn new_codes_entering(seq: &[u8], start: usize, params: &WindowParams) -> Vec<u8> {
        let base_index = start + params.window_span - 1;
        (0..params.num_regions as usize)
            .map(|c| {
                let pos =
                    base_index - params.window_span + params.r as usize + c * (params.r + params.g) as usize;
                code(seq[pos])
            })
            .collect()
    }

    #[test]
    fn hash_sequence_packs_full_domain_ungapped() {
        let params = WindowParams::new(13, 13, 0).unwrap();
        let seq = b"ACGTACGTACGTA";
        match hash_sequence(seq, &params) {
            WindowHash::Valid(fw) => {
                let expected = codes(seq).iter().fold(0u64, |acc, &c| (acc << 2) | c as u64);
                assert_eq!(fw, expected);
                assert!(fw < params.domain_size());
            }
            WindowHash::ContainsN => panic!("clean sequence should not contain N"),
        }
    }

    #[test]
    fn hash_sequence_rejects_invalid_base() {
        let params = WindowParams::new(13, 13, 0).unwrap();
        let seq = b"ACGTACGTACGNA";
        assert!(matches!(hash_sequence(seq, &params), WindowHash::ContainsN));
    }

    #[test]
    fn hash_sequence_skips_gap_positions() {
        let params = WindowParams::new(15, 5, 2).unwrap();
        // 3 regions of 5 contributing bases each, separated by 2-base gaps
        // filled with N (the gap bases must never reach the coder).
        let seq = b"AAAAANNCCCCCNNGGGGG";
        assert_eq!(seq.len(), params.window_span);
        match hash_sequence(seq, &params) {
            WindowHash::Valid(fw) => assert_eq!(fw, 349_866),
            WindowHash::ContainsN => panic!("gap bases must not be coded"),
        }
    }

    #[test]
    fn hash_rc_is_an_involution_through_complement() {
        let params = WindowParams::new(13, 13, 0).unwrap();
        let fw = match hash_sequence(b"ACGTACGTACGTA", &params) {
            WindowHash::Valid(v) => v,
            WindowHash::ContainsN => unreachable!(),
        };
        let rc = hash_rc(fw, params.k);
        // Applying hash_rc twice returns the original fingerprint.
        assert_eq!(hash_rc(rc, params.k), fw);
    }

    #[test]
    fn hash_rc_matches_hand_complemented_sequence() {
        // "AAAA" reverse-complemented is "TTTT"; no 2-bit symbol equals its
        // own complement, so Fw and Rc are always distinct.
        let params = WindowParams::new(13, 13, 0).unwrap();
        let fw = match hash_sequence(b"AAAAAAAAAAAAA", &params) {
            WindowHash::Valid(v) => v,
            WindowHash::ContainsN => unreachable!(),
        };
        assert_eq!(fw, 0);
        let rc = hash_rc(fw, params.k);
        let expected_rc = match hash_sequence(b"TTTTTTTTTTTTT", &params) {
            WindowHash::Valid(v) => v,
            WindowHash::ContainsN => unreachable!(),
        };
        assert_eq!(rc, expected_rc);
        assert_ne!(fw, rc);
    }

    fn check_rolling_matches_from_scratch(k: u32, r: u32, g: u32, seq: &[u8]) {
        let params = WindowParams::new(k, r, g).unwrap();
        let fw0 = match hash_sequence(&seq[0..params.window_span], &params) {
            WindowHash::Valid(v) => v,
            WindowHash::ContainsN => panic!("fixture must be N-free"),
        };
        let mut current = Hashes::new_window(fw0, k);

        for start in 1..=(seq.len() - params.window_span) {
            let new_bases = new_codes_entering(seq, start, &params);
            current = shift_hash(&current, &new_bases, k, params.num_regions).unwrap();

            let expected_fw = match hash_sequence(&seq[start..start + params.window_span], &params) {
                WindowHash::Valid(v) => v,
                WindowHash::ContainsN => panic!("fixture must be N-free"),
            };
            let expected_rc = hash_rc(expected_fw, k);

            assert_eq!(current.fw, expected_fw, "fw mismatch at window start {start}");
            assert_eq!(current.rc, expected_rc, "rc mismatch at window start {start}");
            assert_eq!(current.canonical, expected_fw.min(expected_rc));
        }
    }

    #[test]
    fn rolling_update_matches_from_scratch_ungapped() {
        let seq = b"ACGTAGCTAGCTAGGCTAACCGGTTACGATCGATCGTAGCTAGCATCGATCGATGCTAGC";
        check_rolling_matches_from_scratch(13, 13, 0, seq);
        check_rolling_matches_from_scratch(15, 15, 0, seq);
        check_rolling_matches_from_scratch(17, 17, 0, seq);
    }

    #[test]
    fn rolling_update_matches_from_scratch_gapped() {
        let seq = b"ACGTAGCTAGCTAGGCTAACCGGTTACGATCGATCGTAGCTAGCATCGATCGATGCTAGC";
        check_rolling_matches_from_scratch(15, 3, 2, seq);
        check_rolling_matches_from_scratch(15, 5, 1, seq);
        check_rolling_matches_from_scratch(15, 1, 0, seq);
    }

    #[test]
    fn masks_known_pairs_match_spec_table() {
        assert_eq!(masks(13, 1).unwrap(), (67_108_860, 16_777_215));
        assert_eq!(masks(15, 1).unwrap(), (1_073_741_820, 268_435_455));
        assert_eq!(masks(15, 3).unwrap(), (1_070_593_020, 267_648_255));
        assert_eq!(masks(15, 5).unwrap(), (1_022_611_260, 255_652_815));
        assert_eq!(masks(15, 15).unwrap(), (0, 0));
        assert_eq!(masks(17, 1).unwrap(), (17_179_869_180, 4_294_967_295));
        assert!(masks(13, 3).is_err());
    }
}
