//! Command handlers. Each returns data; printing is left to the caller.

pub mod export;
pub mod listings;
pub mod scrape;
