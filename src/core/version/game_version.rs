// ─── Game Version ───
// Numeric Minecraft release versions (`1.12.2`, `1.13`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{DistroError, DistroResult};

/// A release version of the base game.
///
/// Ordering is numeric per component, so `1.9 < 1.10`. A missing patch
/// component is stored as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinecraftVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl MinecraftVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major.minor[.patch]`.
    pub fn parse(text: &str) -> DistroResult<Self> {
        let malformed = || DistroError::MalformedVersion(text.to_string());

        let parts = text
            .trim()
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                part.parse::<u32>().map_err(|_| malformed())
            })
            .collect::<DistroResult<Vec<u32>>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(malformed()),
        }
    }

    /// The spelling Forge uses in promotion keys and artifact versions:
    /// the patch component is dropped when it is zero (`1.13`, `1.12.2`).
    pub fn short(&self) -> String {
        if self.patch == 0 {
            format!("{}.{}", self.major, self.minor)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for MinecraftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for MinecraftVersion {
    type Err = DistroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MinecraftVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.short())
    }
}

impl<'de> Deserialize<'de> for MinecraftVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
