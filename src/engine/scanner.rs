//! The sequence scanner: walks one record's bases, driving the window
//! encoder and rolling updater, restarting across runs of `N`, and applying
//! either the BUILD phase action (count) or the EXTRACT phase action
//! (band membership + masking).

use anyhow::Result;

use super::codec::{code, hash_sequence, Hashes, WindowHash, WindowParams, INVALID};
use super::table::CountTable;

/// One scanning event, fed to the phase-specific callback.
enum Event {
    /// A live window ending at `base_index`, whose leftmost contributing
    /// base is at `p`.
    Window { hashes: Hashes, p: usize, base_index: usize },
    /// A position that was stepped over without becoming a window's
    /// leftmost base (an `N`-skip, or the unreachable tail of the final
    /// window) but still needs the masking test applied.
    Tail { p: usize },
}

/// Drives the window encoder/rolling updater over `seq`, calling `on_event`
/// once per live window and once per skipped/tail position. Shared between
/// BUILD and EXTRACT so the sliding and N-restart logic lives in one place.
fn walk(seq: &[u8], params: &WindowParams, mut on_event: impl FnMut(Event)) {
    let w = params.window_span;
    let l = seq.len();
    if l < w {
        return;
    }

    let mut start = 0usize;
    'windows: loop {
        // Step 2: find the next position with no N in its window.
        let (window_start, fw) = loop {
            if start + w > l {
                break 'windows;
            }
            match hash_sequence(&seq[start..start + w], params) {
                WindowHash::Valid(fw) => break (start, fw),
                WindowHash::ContainsN => {
                    on_event(Event::Tail { p: start });
                    start += 1;
                }
            }
        };

        let mut hashes = Hashes::new_window(fw, params.k);
        let mut base_index = window_start + w - 1;
        let mut last_p = window_start;
        on_event(Event::Window {
            hashes,
            p: window_start,
            base_index,
        });

        // Step 4: slide one base at a time.
        loop {
            let next_base_index = base_index + 1;
            if next_base_index >= l {
                break;
            }

            let mut new_codes: Vec<u8> = Vec::with_capacity(params.num_regions as usize);
            let mut saw_invalid = false;
            for c in 0..params.num_regions as usize {
                let pos = next_base_index - w + params.r as usize
                    + c * (params.r + params.g) as usize;
                let code = code(seq[pos]);
                if code == INVALID {
                    saw_invalid = true;
                }
                new_codes.push(code);
            }

            if saw_invalid {
                // Mask the unreached tail of the abandoned window, then
                // restart initialisation from the failed position.
                for p in (last_p + 1)..=base_index {
                    on_event(Event::Tail { p });
                }
                start = next_base_index;
                continue 'windows;
            }

            hashes = super::codec::shift_hash(&hashes, &new_codes, params.k, params.num_regions)
                .expect("mask table covers every (k, num_regions) the CLI accepts");
            base_index = next_base_index;
            let p = base_index - w + 1;
            last_p = p;
            on_event(Event::Window { hashes, p, base_index });
        }

        // Step 5: mask the trailing bases of the final window, then stop.
        for p in (last_p + 1)..=base_index {
            on_event(Event::Tail { p });
        }
        break;
    }
}

fn indexed_fingerprint(hashes: &Hashes, canonical: bool) -> u64 {
    if canonical {
        hashes.canonical
    } else {
        hashes.fw
    }
}

/// BUILD phase action: increment the count table for every live window.
pub fn scan_build(seq: &[u8], params: &WindowParams, canonical: bool, table: &mut CountTable) {
    walk(seq, params, |event| {
        if let Event::Window { hashes, .. } = event {
            table.incr(indexed_fingerprint(&hashes, canonical));
        }
    });
}

/// Masking policy selected for an EXTRACT run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPolicy {
    Disabled,
    Normal,
    Strict,
}

struct NormalState {
    end_newest_kmer: u64,
}

struct StrictState {
    /// Indexed by position mod (r+g); 0 means "never set".
    final_indices: Vec<u64>,
}

enum MaskState {
    Disabled,
    Normal(NormalState),
    Strict(StrictState),
}

impl MaskState {
    fn new(policy: MaskPolicy, period: usize) -> Self {
        match policy {
            MaskPolicy::Disabled => MaskState::Disabled,
            MaskPolicy::Normal => MaskState::Normal(NormalState { end_newest_kmer: 0 }),
            MaskPolicy::Strict => MaskState::Strict(StrictState {
                final_indices: vec![0; period],
            }),
        }
    }

    /// Record that the window ending at `base_index`, whose first region
    /// spans `[p, p+r)`, was in-band.
    fn record_in_band(&mut self, p: usize, r: usize, period: usize, base_index: u64) {
        match self {
            MaskState::Disabled => {}
            MaskState::Normal(s) => s.end_newest_kmer = base_index,
            MaskState::Strict(s) => {
                for q in p..p + r {
                    s.final_indices[q % period] = q as u64;
                }
            }
        }
    }

    /// Whether position `p` should be masked to `N` given the current state.
    fn should_mask(&self, p: usize, period: usize) -> bool {
        match self {
            MaskState::Disabled => false,
            MaskState::Normal(s) => p as u64 > s.end_newest_kmer || s.end_newest_kmer == 0,
            MaskState::Strict(s) => {
                let fi = s.final_indices[p % period];
                fi == 0 || p as u64 > fi
            }
        }
    }
}

/// The result of an EXTRACT scan over one record.
pub struct ExtractOutcome {
    pub kmer_hits: u64,
}

/// EXTRACT phase action: look up each live window, track band membership,
/// mask bases outside the coverage of any in-band window, and report how
/// many windows were in-band.
pub fn scan_extract(
    seq: &mut [u8],
    params: &WindowParams,
    canonical: bool,
    table: &CountTable,
    min_val: u32,
    max_val: u32,
) -> Result<ExtractOutcome> {
    scan_extract_with_policy(seq, params, canonical, table, min_val, max_val, MaskPolicy::Normal)
}

/// Like [`scan_extract`], but with an explicit masking policy (the CLI maps
/// `--disable-mask`/`--strict-mask`/neither onto this).
pub fn scan_extract_with_policy(
    seq: &mut [u8],
    params: &WindowParams,
    canonical: bool,
    table: &CountTable,
    min_val: u32,
    max_val: u32,
    policy: MaskPolicy,
) -> Result<ExtractOutcome> {
    let period = (params.r + params.g) as usize;
    let mut mask_state = MaskState::new(policy, period.max(1));
    let mut kmer_hits: u64 = 0;
    let mut masked = vec![false; seq.len()];

    walk(seq, params, |event| match event {
        Event::Window { hashes, p, base_index } => {
            let indexed = indexed_fingerprint(&hashes, canonical);
            let v = table.get(indexed);
            if v >= min_val && v <= max_val {
                kmer_hits += 1;
                mask_state.record_in_band(p, params.r as usize, period.max(1), base_index as u64);
            }
            if mask_state.should_mask(p, period.max(1)) {
                masked[p] = true;
            }
        }
        Event::Tail { p } => {
            if mask_state.should_mask(p, period.max(1)) {
                masked[p] = true;
            }
        }
    });

    for (pos, &m) in masked.iter().enumerate() {
        if m {
            seq[pos] = b'N';
        }
    }

    Ok(ExtractOutcome { kmer_hits })
}
