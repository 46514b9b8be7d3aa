//! Record I/O: the FASTA/FASTQ reader.

pub mod records;
