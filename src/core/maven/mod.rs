mod artifact;

pub use artifact::MavenArtifact;

/// Well-known Maven repositories used by the Forge ecosystem.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";

/// Retired Forge host still referenced by pre-1.13 library manifests.
pub const LEGACY_FORGE_MAVEN: &str = "files.minecraftforge.net/maven";
