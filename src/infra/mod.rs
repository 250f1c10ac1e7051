//! I/O around the domain: the price feed and its disk cache.

pub mod albion;
pub mod cache;
