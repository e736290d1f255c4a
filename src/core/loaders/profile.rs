// ─── Loader Profiles ───
// Library declarations read out of Forge's own `version.json`, in both the
// pre-1.13 and the installer-era layouts.

use std::io::Read;

use serde::Deserialize;
use tracing::warn;

use crate::core::error::{DistroError, DistroResult};
use crate::core::maven::{MavenArtifact, FORGE_MAVEN, LEGACY_FORGE_MAVEN, MOJANG_LIBRARIES};

/// One library a loader declares, with where to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDecl {
    /// Maven coordinate as declared.
    pub id: String,
    pub name: String,
    pub url: String,
    /// Path inside a Maven repository layout.
    pub repo_path: String,
    /// Upstream SHA-1, when the manifest declares one.
    pub sha1: Option<String>,
}

// ── Pre-1.13 layout ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LegacyVersionJson {
    #[serde(default)]
    libraries: Vec<LegacyLibrary>,
}

#[derive(Debug, Deserialize)]
struct LegacyLibrary {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

// ── Installer-era layout ────────────────────────────────

#[derive(Debug, Deserialize)]
struct VersionJson {
    #[serde(default)]
    libraries: Vec<VersionLibrary>,
}

#[derive(Debug, Deserialize)]
struct VersionLibrary {
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    downloads: Option<LibraryDownloads>,
}

#[derive(Debug, Deserialize)]
struct LibraryDownloads {
    #[serde(default)]
    artifact: Option<DownloadArtifact>,
}

#[derive(Debug, Deserialize)]
struct DownloadArtifact {
    path: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    sha1: Option<String>,
}

/// Read one entry out of a jar held in memory.
pub fn read_jar_entry(jar: &[u8], name: &str) -> DistroResult<Vec<u8>> {
    let cursor = std::io::Cursor::new(jar);
    let mut archive = zip::ZipArchive::new(cursor)?;
    let mut file = archive
        .by_name(name)
        .map_err(|e| DistroError::LoaderProfile(format!("Missing {}: {}", name, e)))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Libraries from a pre-1.13 `version.json` (bundled in the universal jar).
///
/// The Forge artifact itself is skipped since it is the module these
/// libraries hang off. Entries without a repository come from Mojang's.
pub fn legacy_libraries(version_json: &[u8]) -> DistroResult<Vec<LibraryDecl>> {
    let parsed: LegacyVersionJson = serde_json::from_slice(version_json)
        .map_err(|e| DistroError::LoaderProfile(format!("Invalid legacy version.json: {}", e)))?;

    let mut out = Vec::with_capacity(parsed.libraries.len());
    for lib in parsed.libraries {
        let Ok(artifact) = MavenArtifact::parse(&lib.name) else {
            warn!("Skipping library with unparseable coordinate '{}'", lib.name);
            continue;
        };
        if is_forge_itself(&artifact) {
            continue;
        }

        let repo = legacy_repository(lib.url.as_deref());
        out.push(LibraryDecl {
            id: lib.name.clone(),
            name: artifact.artifact_id.clone(),
            url: artifact.url(&repo),
            repo_path: artifact.repo_path(),
            sha1: None,
        });
    }
    Ok(out)
}

/// Libraries from an installer-era `version.json`.
///
/// Entries whose download URL is empty are produced by the installer at
/// install time and cannot be hosted, so they are skipped.
pub fn installer_libraries(version_json: &[u8]) -> DistroResult<Vec<LibraryDecl>> {
    let parsed: VersionJson = serde_json::from_slice(version_json)
        .map_err(|e| DistroError::LoaderProfile(format!("Invalid version.json: {}", e)))?;

    let mut out = Vec::with_capacity(parsed.libraries.len());
    for lib in parsed.libraries {
        let name = short_name(&lib.name);

        if let Some(download) = lib.downloads.and_then(|d| d.artifact) {
            if download.url.trim().is_empty() {
                continue;
            }
            out.push(LibraryDecl {
                id: lib.name,
                name,
                url: download.url,
                repo_path: download.path,
                sha1: download.sha1,
            });
            continue;
        }

        let Ok(artifact) = MavenArtifact::parse(&lib.name) else {
            warn!("Skipping library with unparseable coordinate '{}'", lib.name);
            continue;
        };
        let repo = lib
            .url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| FORGE_MAVEN.to_string());
        out.push(LibraryDecl {
            url: artifact.url(&repo),
            repo_path: artifact.repo_path(),
            id: lib.name,
            name,
            sha1: None,
        });
    }
    Ok(out)
}

fn is_forge_itself(artifact: &MavenArtifact) -> bool {
    artifact.same_artifact("net.minecraftforge", "forge")
        || artifact.same_artifact("net.minecraftforge", "minecraftforge")
}

fn legacy_repository(url: Option<&str>) -> String {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        None => MOJANG_LIBRARIES.to_string(),
        Some(u) if u.contains(LEGACY_FORGE_MAVEN) => FORGE_MAVEN.to_string(),
        Some(u) => u.to_string(),
    }
}

fn short_name(coordinate: &str) -> String {
    coordinate
        .split(':')
        .nth(1)
        .unwrap_or(coordinate)
        .to_string()
}
