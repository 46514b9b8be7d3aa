//! The rolling k-mer engine: codec, count table, histogram, persistence,
//! scanner, and phase driver.

pub mod codec;
pub mod histogram;
pub mod persist;
pub mod phases;
pub mod scanner;
pub mod table;
