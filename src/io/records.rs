//! FASTA/FASTQ record reader.
//!
//! Format is auto-detected from the first non-empty byte of the file:
//! `>` for FASTA, `@` for FASTQ. Everything other than uppercase/lowercase
//! A/C/G/T is treated as N downstream; the reader itself passes sequence
//! bytes through unchanged.

use std::io::BufRead;

use anyhow::{bail, Context, Result};

/// One record: a name, its sequence, and (FASTQ only) quality string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
}

impl Record {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Fasta,
    Fastq,
}

/// Streams records out of one already-open file, auto-detecting format on
/// the first line.
pub struct RecordReader<R> {
    lines: std::io::Lines<R>,
    format: Option<Format>,
    pending_header: Option<String>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            lines: reader.lines(),
            format: None,
            pending_header: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(line) => Ok(Some(line.context("reading input line")?)),
            None => Ok(None),
        }
    }

    fn detect_format(&mut self) -> Result<Option<Format>> {
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            let format = match line.as_bytes()[0] {
                b'>' => Format::Fasta,
                b'@' => Format::Fastq,
                _ => bail!("malformed input: record must start with '>' or '@'"),
            };
            self.format = Some(format);
            self.pending_header = Some(line);
            return Ok(Some(format));
        }
    }

    /// Read the next record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let format = match self.format {
            Some(f) => f,
            None => match self.detect_format()? {
                Some(f) => f,
                None => return Ok(None),
            },
        };

        let header = match self.pending_header.take() {
            Some(h) => h,
            None => match self.next_line()? {
                Some(h) => h,
                None => return Ok(None),
            },
        };

        match format {
            Format::Fasta => self.read_fasta(&header).map(Some),
            Format::Fastq => self.read_fastq(&header).map(Some),
        }
    }

    fn read_fasta(&mut self, header: &str) -> Result<Record> {
        if !header.starts_with('>') {
            bail!("malformed input: expected FASTA header starting with '>'");
        }
        let name = header[1..].to_string();
        let mut seq = Vec::new();

        loop {
            match self.next_line()? {
                None => break,
                Some(line) => {
                    if line.starts_with('>') {
                        self.pending_header = Some(line);
                        break;
                    }
                    seq.extend_from_slice(line.as_bytes());
                }
            }
        }

        Ok(Record {
            name,
            seq,
            qual: None,
        })
    }

    fn read_fastq(&mut self, header: &str) -> Result<Record> {
        if !header.starts_with('@') {
            bail!("malformed input: expected FASTQ header starting with '@'");
        }
        let name = header[1..].to_string();
        let mut seq = Vec::new();

        loop {
            let line = self
                .next_line()?
                .context("malformed input: FASTQ record truncated before '+' separator")?;
            if line.starts_with('+') {
                break;
            }
            seq.extend_from_slice(line.as_bytes());
        }

        let mut qual = Vec::with_capacity(seq.len());
        while qual.len() < seq.len() {
            let line = self
                .next_line()?
                .context("malformed input: FASTQ record truncated before quality string ended")?;
            qual.extend_from_slice(line.as_bytes());
        }
        if qual.len() != seq.len() {
            bail!(
                "malformed input: FASTQ quality length {} does not match sequence length {}",
                qual.len(),
                seq.len()
            );
        }

        Ok(Record {
            name,
            seq,
            qual: Some(qual),
        })
    }
}
