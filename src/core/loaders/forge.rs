use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::info;

use super::context::ResolverContext;
use super::pipeline::{library_path, VERSIONS_ROOT};
use super::profile::{installer_libraries, read_jar_entry};
use super::resolver::ModuleResolver;
use crate::core::distribution::{Module, ModuleType};
use crate::core::error::DistroResult;
use crate::core::maven::{MavenArtifact, FORGE_MAVEN};
use crate::core::promotion::LoaderQuery;

/// Forge for 1.13 through 1.16.
///
/// The installer jar carries the loader's `version.json`; the hosted loader
/// jar is the separate `-universal` artifact.
pub struct InstallerProfileResolver {
    ctx: ResolverContext,
}

impl InstallerProfileResolver {
    pub fn new(ctx: ResolverContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ModuleResolver for InstallerProfileResolver {
    async fn resolve(&self, query: &LoaderQuery) -> DistroResult<Module> {
        let ctx = &self.ctx;
        let build = ctx.resolve_build(query).await?;
        let forge_version = ctx.forge_version(&build);
        info!(
            "Resolving Forge {} for {} (server {})",
            build, ctx.game_version, ctx.options.server_id
        );

        let installer = MavenArtifact::forge(&forge_version, "installer");
        let (manifest, version_json) =
            version_manifest(ctx, &build, InstallerSource::Remote(&installer)).await?;

        let universal = MavenArtifact::forge(&forge_version, "universal");
        let pipeline = ctx.pipeline();
        let artifact = pipeline
            .remote(
                &library_path(&universal.repo_path()),
                &universal.url(FORGE_MAVEN),
                None,
            )
            .await?;

        let mut sub_modules = vec![manifest];
        sub_modules.extend(pipeline.libraries(installer_libraries(&version_json)?).await?);

        Ok(
            Module::new(universal.to_string(), "Minecraft Forge", ModuleType::ForgeUniversal, artifact)
                .with_sub_modules(sub_modules),
        )
    }

    fn era(&self) -> &'static str {
        "installer-profile"
    }
}

/// Where the installer jar holding `version.json` comes from.
pub(super) enum InstallerSource<'a> {
    /// Fetched from the Forge maven only when the manifest is not cached.
    Remote(&'a MavenArtifact),
    /// Already in hand.
    Bytes(&'a [u8]),
}

/// The loader's `version.json` as a hosted module, plus its content.
pub(super) async fn version_manifest(
    ctx: &ResolverContext,
    build: &str,
    installer: InstallerSource<'_>,
) -> DistroResult<(Module, Vec<u8>)> {
    let id = format!("{}-forge-{}", ctx.game_version.short(), build);
    let path = format!("{}/{}/{}.json", VERSIONS_ROOT, id, id);
    let pipeline = ctx.pipeline();

    let (artifact, bytes) = match installer {
        InstallerSource::Remote(coordinate) => {
            let installer_path = library_path(&coordinate.repo_path());
            let installer_url = coordinate.url(FORGE_MAVEN);
            pipeline
                .artifact_with_bytes(&path, || {
                    async {
                        let jar = pipeline.fetch(&installer_path, &installer_url, None).await?;
                        read_jar_entry(&jar, "version.json")
                    }
                    .boxed()
                })
                .await?
        }
        InstallerSource::Bytes(jar) => {
            pipeline
                .artifact_with_bytes(&path, || {
                    futures_util::future::ready(read_jar_entry(jar, "version.json")).boxed()
                })
                .await?
        }
    };

    let module = Module::new(id, "Minecraft Forge (version.json)", ModuleType::VersionManifest, artifact);
    Ok((module, bytes))
}
