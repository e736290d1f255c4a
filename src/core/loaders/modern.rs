use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::info;

use super::context::ResolverContext;
use super::forge::{version_manifest, InstallerSource};
use super::pipeline::library_path;
use super::profile::installer_libraries;
use super::resolver::ModuleResolver;
use crate::core::distribution::{Module, ModuleType};
use crate::core::error::DistroResult;
use crate::core::maven::{MavenArtifact, FORGE_MAVEN};
use crate::core::promotion::LoaderQuery;

/// Forge for 1.17 onwards. There is no universal jar any more: the
/// installer is what launchers download and run.
pub struct ModernInstallerResolver {
    ctx: ResolverContext,
}

impl ModernInstallerResolver {
    pub fn new(ctx: ResolverContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ModuleResolver for ModernInstallerResolver {
    async fn resolve(&self, query: &LoaderQuery) -> DistroResult<Module> {
        let ctx = &self.ctx;
        let build = ctx.resolve_build(query).await?;
        let forge_version = ctx.forge_version(&build);
        info!(
            "Resolving Forge {} for {} (server {})",
            build, ctx.game_version, ctx.options.server_id
        );

        let installer = MavenArtifact::forge(&forge_version, "installer");
        let installer_path = library_path(&installer.repo_path());
        let installer_url = installer.url(FORGE_MAVEN);

        let pipeline = ctx.pipeline();
        let (artifact, jar) = pipeline
            .artifact_with_bytes(&installer_path, || {
                pipeline.fetch(&installer_path, &installer_url, None).boxed()
            })
            .await?;

        let (manifest, version_json) =
            version_manifest(ctx, &build, InstallerSource::Bytes(&jar)).await?;

        let mut sub_modules = vec![manifest];
        sub_modules.extend(pipeline.libraries(installer_libraries(&version_json)?).await?);

        Ok(Module::new(
            installer.to_string(),
            "Minecraft Forge (installer)",
            ModuleType::LoaderInstaller,
            artifact,
        )
        .with_sub_modules(sub_modules))
    }

    fn era(&self) -> &'static str {
        "modern-installer"
    }
}
