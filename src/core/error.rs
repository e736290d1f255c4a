use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the distribution generator.
/// Every module returns `Result<T, DistroError>`.
#[derive(Debug, Error)]
pub enum DistroError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // ── Versions ────────────────────────────────────────
    #[error("Malformed game version '{0}'")]
    MalformedVersion(String),

    #[error("Version range {range} overlaps already registered range {existing}")]
    OverlappingRange { range: String, existing: String },

    #[error("Unsupported game version {0}: no resolver segment covers it")]
    UnsupportedGameVersion(String),

    // ── Promotions ──────────────────────────────────────
    #[error("Failed to fetch promotion index from {url}: {reason}")]
    PromotionFetch { url: String, reason: String },

    #[error("Could not resolve loader version '{query}' for Minecraft {game_version}")]
    UnresolvedLoaderVersion { game_version: String, query: String },

    // ── Artifacts ───────────────────────────────────────
    #[error("Artifact {path} unavailable: {reason}")]
    ArtifactUnavailable { path: String, reason: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("Loader profile error: {0}")]
    LoaderProfile(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Servers ─────────────────────────────────────────
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Server id already exists: {0}")]
    DuplicateServerId(String),

    // ── Configuration ───────────────────────────────────
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type DistroResult<T> = Result<T, DistroError>;

impl From<std::io::Error> for DistroError {
    fn from(source: std::io::Error) -> Self {
        DistroError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl DistroError {
    /// Shorthand for the IO variant, used with `map_err`.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DistroError::Io { path, source }
    }
}

// The distribution records failures as plain text next to the servers that
// did resolve, so the error serializes as its display string.
impl serde::Serialize for DistroError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_helper_keeps_path() {
        let err = DistroError::io("/tmp/x")(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        match err {
            DistroError::Io { path, .. } => assert_eq!(path, PathBuf::from("/tmp/x")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn serializes_as_message() {
        let err = DistroError::DuplicateServerId("alpha".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Server id already exists: alpha\"");
    }
}
