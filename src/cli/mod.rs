//! Command-line parsing and CLI-to-engine option resolution.

pub mod opts;
