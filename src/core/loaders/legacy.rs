use async_trait::async_trait;
use tracing::{debug, info};

use super::context::ResolverContext;
use super::pipeline::library_path;
use super::profile::{legacy_libraries, read_jar_entry};
use super::resolver::ModuleResolver;
use crate::core::distribution::{Module, ModuleType};
use crate::core::error::DistroResult;
use crate::core::maven::{MavenArtifact, FORGE_MAVEN};
use crate::core::promotion::LoaderQuery;
use crate::core::version::MinecraftVersion;

/// Game versions whose Forge builds were published from a version branch
/// and may carry a `-<gameVersion>` suffix on the artifact version.
const BRANCH_SUFFIXED: [MinecraftVersion; 2] = [
    MinecraftVersion::new(1, 7, 10),
    MinecraftVersion::new(1, 8, 9),
];

/// Forge for 1.7 through 1.12: a single universal jar that carries its
/// own `version.json`.
pub struct LegacyUniversalResolver {
    ctx: ResolverContext,
}

impl LegacyUniversalResolver {
    pub fn new(ctx: ResolverContext) -> Self {
        Self { ctx }
    }

    /// Artifact versions to try, most specific first.
    fn candidate_versions(&self, forge_version: &str) -> Vec<String> {
        let mut versions = Vec::with_capacity(2);
        if BRANCH_SUFFIXED.contains(&self.ctx.game_version) {
            versions.push(format!("{}-{}", forge_version, self.ctx.game_version.short()));
        }
        versions.push(forge_version.to_string());
        versions
    }
}

#[async_trait]
impl ModuleResolver for LegacyUniversalResolver {
    async fn resolve(&self, query: &LoaderQuery) -> DistroResult<Module> {
        let ctx = &self.ctx;
        let build = ctx.resolve_build(query).await?;
        let forge_version = ctx.forge_version(&build);
        info!(
            "Resolving Forge {} for {} (server {})",
            build, ctx.game_version, ctx.options.server_id
        );

        let coordinates: Vec<MavenArtifact> = self
            .candidate_versions(&forge_version)
            .iter()
            .map(|v| MavenArtifact::forge(v, "universal"))
            .collect();
        let candidates: Vec<(String, String)> = coordinates
            .iter()
            .map(|c| (library_path(&c.repo_path()), c.url(FORGE_MAVEN)))
            .collect();

        let pipeline = ctx.pipeline();
        let (artifact, jar, position) = pipeline.first_available(&candidates).await?;
        let universal = &coordinates[position];
        debug!("Using {} for Forge {}", universal, build);

        let version_json = read_jar_entry(&jar, "version.json")?;
        let libraries = pipeline.libraries(legacy_libraries(&version_json)?).await?;

        Ok(
            Module::new(universal.to_string(), "Minecraft Forge", ModuleType::ForgeUniversal, artifact)
                .with_sub_modules(libraries),
        )
    }

    fn era(&self) -> &'static str {
        "legacy-universal"
    }
}
