mod client;
mod hash;

pub use client::{Fetcher, HttpFetcher};
pub use hash::HashAlgorithm;
