//! Command-line surface: flags, validation, and the CLI-to-engine mapping.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{value_parser, ArgGroup, Parser, ValueEnum};

use crate::engine::codec::WindowParams;
use crate::engine::phases::{ExtractPolicy, Mode};
use crate::engine::scanner::MaskPolicy;

/// Which phase(s) a run requests, as spelled on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliMode {
    Hist,
    Extract,
    Both,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Hist => Mode::Hist,
            CliMode::Extract => Mode::Extract,
            CliMode::Both => Mode::Both,
        }
    }
}

/// Count and query fixed-width k-mer occurrences in FASTA/FASTQ input.
#[derive(Parser)]
#[command(
    name = "kmer-census",
    about = "Count and query k-mer occurrences in DNA sequence files",
    version
)]
#[clap(group = ArgGroup::new("table_source").args(&["in_path", "out_path"]).multiple(false))]
#[clap(group = ArgGroup::new("verbosity").args(&["quiet", "verbose"]).multiple(false))]
#[clap(group = ArgGroup::new("mask_choice").args(&["disable_mask", "strict_mask"]).multiple(false))]
pub struct Cli {
    /// Phase(s) to run.
    #[clap(value_enum)]
    pub mode: CliMode,

    /// Input FASTA/FASTQ files to scan.
    #[clap(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// k-mer size [13, 15, or 17].
    #[clap(short = 'k', long = "kmer-size", value_parser = value_parser!(u32).range(13..=17), required = true, help_heading = "Core")]
    pub kmer_size: u32,

    /// Load a stored count table instead of running BUILD.
    #[clap(short = 'i', long = "in", value_parser, group = "table_source", help_heading = "Table")]
    pub in_path: Option<PathBuf>,

    /// Save the count table after BUILD.
    #[clap(short = 'o', long = "out", value_parser, group = "table_source", help_heading = "Table")]
    pub out_path: Option<PathBuf>,

    /// EXTRACT: lower band bound on k-mer counts.
    #[clap(short = 'a', long = "min", help_heading = "Extract")]
    pub min: Option<u32>,

    /// EXTRACT: upper band bound on k-mer counts.
    #[clap(short = 'b', long = "max", help_heading = "Extract")]
    pub max: Option<u32>,

    /// EXTRACT: minimum in-band windows per record to emit it (default 50
    /// when neither this nor --max-difference is set).
    #[clap(short = 'u', long = "cutoff", help_heading = "Extract")]
    pub cutoff: Option<u64>,

    /// EXTRACT: maximum shortfall from a record's maximum possible window
    /// count; the effective cutoff becomes
    /// `min(--cutoff if set, L - k + 1 - N)`, clamped at zero.
    #[clap(short = 'x', long = "max-difference", help_heading = "Extract")]
    pub max_difference: Option<u64>,

    /// Use the canonical (strand-symmetric) fingerprint.
    #[clap(short = 'c', long = "canonical", help_heading = "Core")]
    pub canonical: bool,

    /// Region size; only valid when k=15. Defaults to k.
    #[clap(short = 'r', long = "region-size", value_parser = value_parser!(u32).range(1..=15), help_heading = "Gapped windows (k=15 only)")]
    pub region_size: Option<u32>,

    /// Interval (gap) size; only valid when k=15. Defaults to 0.
    #[clap(short = 'g', long = "interval-size", help_heading = "Gapped windows (k=15 only)")]
    pub interval_size: Option<u32>,

    /// EXTRACT: disable masking of non-hitting bases.
    #[clap(short = 'd', long = "disable-mask", group = "mask_choice", help_heading = "Extract")]
    pub disable_mask: bool,

    /// EXTRACT: strict masking (requires k=15).
    #[clap(short = 's', long = "strict-mask", group = "mask_choice", help_heading = "Extract")]
    pub strict_mask: bool,

    /// Suppress progress messages.
    #[clap(short = 'q', long = "quiet", group = "verbosity")]
    pub quiet: bool,

    /// Print progress messages (the default; present for symmetry with -q).
    #[clap(short = 'v', long = "verbose", group = "verbosity")]
    pub verbose: bool,
}

/// Everything the CLI needed to decide, boiled down for the phase driver.
pub struct Resolved {
    pub params: WindowParams,
    pub canonical: bool,
    pub mode: Mode,
    pub quiet: bool,
    pub extract_policy: Option<ExtractPolicy>,
}

impl Cli {
    pub fn resolve(&self) -> Result<Resolved> {
        let r = self.region_size.unwrap_or(self.kmer_size);
        let g = self.interval_size.unwrap_or(0);
        if (self.region_size.is_some() || self.interval_size.is_some()) && self.kmer_size != 15 {
            bail!("-r/--region-size and -g/--interval-size are only valid when k=15");
        }
        let params = WindowParams::new(self.kmer_size, r, g)?;

        let mode: Mode = self.mode.into();

        if !mode.wants_extract() && (self.disable_mask || self.strict_mask) {
            bail!("-d/--disable-mask and -s/--strict-mask are only valid in extract mode");
        }

        let extract_policy = if mode.wants_extract() {
            let min_val = self
                .min
                .ok_or_else(|| anyhow::anyhow!("-a/--min is required in extract mode"))?;
            let max_val = self
                .max
                .ok_or_else(|| anyhow::anyhow!("-b/--max is required in extract mode"))?;
            if min_val == 0 {
                bail!("-a/--min must be greater than 0 in extract mode");
            }
            if max_val == 0 {
                bail!("-b/--max must be greater than 0 in extract mode");
            }
            if min_val > max_val {
                bail!("-a/--min ({min_val}) must not exceed -b/--max ({max_val})");
            }
            if self.strict_mask && self.kmer_size != 15 {
                bail!("-s/--strict-mask requires k=15");
            }
            let mask_policy = if self.disable_mask {
                MaskPolicy::Disabled
            } else if self.strict_mask {
                MaskPolicy::Strict
            } else {
                MaskPolicy::Normal
            };
            Some(ExtractPolicy {
                min_val,
                max_val,
                cutoff: self.cutoff,
                max_difference: self.max_difference,
                mask_policy,
            })
        } else {
            None
        };

        Ok(Resolved {
            params,
            canonical: self.canonical,
            mode,
            quiet: self.quiet,
            extract_policy,
        })
    }
}
