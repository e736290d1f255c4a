use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::downloader::HashAlgorithm;
use crate::core::version::MinecraftVersion;

/// Format version written into every distribution document.
pub const DISTRIBUTION_FORMAT_VERSION: &str = "1.0.0";

/// Kinds of module a launcher can install.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModuleType {
    /// The hosted Forge jar launchers put on the classpath.
    ForgeUniversal,
    /// The Forge installer jar, hosted when no universal jar exists.
    LoaderInstaller,
    /// The loader's own `version.json`.
    VersionManifest,
    Library,
}

/// One installable file with everything needed to verify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Path relative to the distribution root, `/`-separated.
    pub path: String,
    /// Where launchers download the file (base URL + path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub size: u64,
    pub hash: String,
    pub algorithm: HashAlgorithm,
}

impl Artifact {
    /// Describe `bytes` as the artifact stored at `path`.
    pub fn describe(
        path: &str,
        url: Option<String>,
        bytes: &[u8],
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            path: path.to_string(),
            url,
            size: bytes.len() as u64,
            hash: algorithm.digest(bytes),
            algorithm,
        }
    }
}

/// A resolved, addressable unit of installable content.
///
/// Sub-modules keep their declaration order; launchers build classpaths
/// from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub artifact: Artifact,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_modules: Vec<Module>,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        module_type: ModuleType,
        artifact: Artifact,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            module_type,
            artifact,
            sub_modules: Vec::new(),
        }
    }

    pub fn with_sub_modules(mut self, sub_modules: Vec<Module>) -> Self {
        self.sub_modules = sub_modules;
        self
    }

    /// Depth-first walk over this module and every descendant.
    pub fn walk(&self) -> Vec<&Module> {
        let mut out = vec![self];
        for sub in &self.sub_modules {
            out.extend(sub.walk());
        }
        out
    }
}

/// A server entry in the distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerManifest {
    pub id: String,
    pub minecraft_version: MinecraftVersion,
    pub modules: Vec<Module>,
}

/// A server that could not be resolved, kept next to the ones that were.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerFailure {
    pub id: String,
    pub reason: String,
}

/// The aggregate document describing every configured server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub base_url: String,
    pub servers: Vec<ServerManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ServerFailure>,
}

impl Distribution {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            version: DISTRIBUTION_FORMAT_VERSION.to_string(),
            generated_at: Utc::now(),
            base_url: base_url.into(),
            servers: Vec::new(),
            failures: Vec::new(),
        }
    }
}
