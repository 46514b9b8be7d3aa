//! Phase driver: sequences BUILD, HIST, and EXTRACT over the input files.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use super::codec::WindowParams;
use super::histogram::Histogram;
use super::scanner::{scan_build, scan_extract_with_policy, MaskPolicy};
use super::persist;
use super::table::CountTable;
use crate::io::records::RecordReader;

/// Which phases a run requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Hist,
    Extract,
    Both,
}

impl Mode {
    pub fn wants_hist(self) -> bool {
        matches!(self, Mode::Hist | Mode::Both)
    }

    pub fn wants_extract(self) -> bool {
        matches!(self, Mode::Extract | Mode::Both)
    }
}

/// Resolved EXTRACT policy, one value per record since `--max-difference`
/// makes the cutoff depend on record length.
pub struct ExtractPolicy {
    pub min_val: u32,
    pub max_val: u32,
    pub cutoff: Option<u64>,
    pub max_difference: Option<u64>,
    pub mask_policy: MaskPolicy,
}

impl ExtractPolicy {
    /// Resolve the effective cutoff for a record of length `len`, per the
    /// `--max-difference` rule in the external CLI contract: the cutoff
    /// becomes `min(--cutoff if set, L - k + 1 - max_difference)`, clamped
    /// at zero. Falls back to 50 when neither flag is set.
    fn resolve_cutoff(&self, len: usize, window_span: usize) -> u64 {
        match self.max_difference {
            Some(max_diff) => {
                let max_possible = (len + 1).saturating_sub(window_span) as u64;
                let from_difference = max_possible.saturating_sub(max_diff);
                match self.cutoff {
                    Some(c) => c.min(from_difference),
                    None => from_difference,
                }
            }
            None => self.cutoff.unwrap_or(50),
        }
    }
}

/// Progress messages, preserved verbatim as observable behaviour.
const MSG_BUILD: &str = "Counting k-mers into hash table";
const MSG_HIST: &str = "Computing histogram";
const MSG_EXTRACT: &str = "Extracting reads with desired k-mer coverage";

/// Drives the run end to end: load-or-build the table, then run HIST and/or
/// EXTRACT as requested.
pub struct Run<'a> {
    pub params: &'a WindowParams,
    pub canonical: bool,
    pub in_path: Option<&'a Path>,
    pub out_path: Option<&'a Path>,
    pub input_files: &'a [PathBuf],
    pub mode: Mode,
    pub extract_policy: Option<&'a ExtractPolicy>,
    pub quiet: bool,
}

impl<'a> Run<'a> {
    fn report(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    /// A per-file progress bar over `self.input_files`, styled after
    /// `reference.rs`'s per-chromosome bar. Hidden entirely under `--quiet`.
    fn file_progress(&self) -> ProgressBar {
        if self.quiet || self.input_files.is_empty() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(self.input_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("       {bar:40} {pos}/{len} files [{elapsed_precise}]")
                .unwrap(),
        );
        pb
    }

    pub fn execute(&self, stdout: &mut impl Write) -> Result<()> {
        let table = match self.in_path {
            Some(path) => persist::load(path, self.params.k)?,
            None => {
                let mut table = CountTable::build(self.params.k)?;
                self.report(MSG_BUILD);
                let pb = self.file_progress();
                for path in self.input_files {
                    self.build_one_file(path, &mut table)?;
                    pb.inc(1);
                }
                pb.finish_and_clear();
                if let Some(out_path) = self.out_path {
                    if let Err(e) = persist::save(&table, out_path) {
                        eprintln!("WARNING: {e:#}");
                    }
                }
                table
            }
        };

        if self.mode.wants_hist() {
            self.report(MSG_HIST);
            let histogram = Histogram::build(&table);
            histogram.write_report(&mut *stdout)?;
        }

        if self.mode.wants_extract() {
            self.report(MSG_EXTRACT);
            let policy = self
                .extract_policy
                .context("internal error: extract mode selected without a resolved policy")?;
            let pb = self.file_progress();
            for path in self.input_files {
                self.extract_one_file(path, &table, policy, &mut *stdout)?;
                pb.inc(1);
            }
            pb.finish_and_clear();
        }

        Ok(())
    }

    fn open_reader(path: &Path) -> Result<RecordReader<BufReader<File>>> {
        let file = File::open(path).with_context(|| format!("opening input file {}", path.display()))?;
        Ok(RecordReader::new(BufReader::new(file)))
    }

    fn build_one_file(&self, path: &Path, table: &mut CountTable) -> Result<()> {
        let mut reader = Self::open_reader(path)?;
        while let Some(record) = reader.next_record()? {
            scan_build(&record.seq, self.params, self.canonical, table);
        }
        Ok(())
    }

    fn extract_one_file(
        &self,
        path: &Path,
        table: &CountTable,
        policy: &ExtractPolicy,
        stdout: &mut impl Write,
    ) -> Result<()> {
        let mut reader = Self::open_reader(path)?;
        while let Some(mut record) = reader.next_record()? {
            let cutoff = policy.resolve_cutoff(record.seq.len(), self.params.window_span);
            let outcome = scan_extract_with_policy(
                &mut record.seq,
                self.params,
                self.canonical,
                table,
                policy.min_val,
                policy.max_val,
                policy.mask_policy,
            )?;
            if outcome.kmer_hits >= cutoff {
                write_fasta_record(stdout, &record.name, outcome.kmer_hits, &record.seq)?;
            }
        }
        Ok(())
    }
}

fn write_fasta_record(out: &mut impl Write, name: &str, kmer_hits: u64, seq: &[u8]) -> Result<()> {
    writeln!(out, ">{name} {kmer_hits}").context("writing extracted record header")?;
    out.write_all(seq).context("writing extracted record sequence")?;
    writeln!(out).context("writing extracted record sequence")?;
    Ok(())
}

pub fn stdout_writer() -> io::BufWriter<io::Stdout> {
    io::BufWriter::new(io::stdout())
}
