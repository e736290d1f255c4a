use std::path::PathBuf;

use reqwest::Url;

use crate::core::distribution::{BuildOptions, DEFAULT_SERVER_PARALLELISM};
use crate::core::downloader::HashAlgorithm;
use crate::core::error::{DistroError, DistroResult};
use crate::core::promotion::PROMOTIONS_URL;

/// Everything a run needs to know, gathered by the binary from its
/// arguments and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    /// Normalized: has a protocol and ends with `/`.
    pub base_url: String,
    pub discard_output: bool,
    pub invalidate_cache: bool,
    pub fail_fast: bool,
    pub hash_algorithm: HashAlgorithm,
    pub parallelism: usize,
    pub promotions_url: String,
}

impl Settings {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> DistroResult<Self> {
        Ok(Self {
            root: root.into(),
            base_url: normalize_base_url(base_url)?,
            discard_output: false,
            invalidate_cache: false,
            fail_fast: false,
            hash_algorithm: HashAlgorithm::default(),
            parallelism: DEFAULT_SERVER_PARALLELISM,
            promotions_url: PROMOTIONS_URL.to_string(),
        })
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            discard_output: self.discard_output,
            invalidate_cache: self.invalidate_cache,
            fail_fast: self.fail_fast,
            parallelism: self.parallelism,
            ..BuildOptions::default()
        }
    }
}

/// Give `raw` a protocol if it is a bare `localhost` address, and a
/// trailing slash.
pub fn normalize_base_url(raw: &str) -> DistroResult<String> {
    let invalid = |reason: &str| DistroError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    let candidate = if trimmed.contains("//") {
        trimmed.to_string()
    } else if trimmed.to_ascii_lowercase().starts_with("localhost") {
        format!("http://{}", trimmed)
    } else {
        return Err(invalid("missing protocol (http:// or https://)"));
    };

    let mut url = Url::parse(&candidate).map_err(|e| invalid(&e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.to_string())
}
