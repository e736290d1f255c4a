//! Handlers behind each CLI subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use forge_distro::core::cache::write_atomic;
use forge_distro::core::downloader::HttpFetcher;
use forge_distro::core::error::{DistroError, DistroResult};
use forge_distro::core::loaders::ResolveOptions;
use forge_distro::core::promotion::{
    resolve_in, Channel, LoaderQuery, PromotionCache, PromotionResolver, PROMOTIONS_URL,
};
use forge_distro::core::state::{AppState, Settings};
use forge_distro::core::version::MinecraftVersion;

use crate::cli::{Cli, Commands, DistroArgs, GenerateTarget, InitTarget, ServerArgs};

/// Used when a command never embeds artifact URLs.
const UNUSED_BASE_URL: &str = "http://localhost/";

pub async fn run(cli: Cli) -> DistroResult<()> {
    let Cli {
        root,
        base_url,
        command,
    } = cli;

    match command {
        Commands::Init {
            target: InitTarget::Root,
        } => init_root(require_root(root)?).await,
        Commands::Generate {
            target: GenerateTarget::Server(args),
        } => generate_server(require_root(root)?, args).await,
        Commands::Generate {
            target: GenerateTarget::Distro(args),
        } => generate_distro(require_root(root)?, require_base_url(base_url)?, args).await,
        Commands::LatestForge { version } => latest_forge(&version).await,
        Commands::RecommendedForge { version } => recommended_forge(&version).await,
        Commands::Test { mc_ver, forge_ver } => {
            test_resolve(require_root(root)?, require_base_url(base_url)?, &mc_ver, &forge_ver)
                .await
        }
    }
}

fn require_root(root: Option<PathBuf>) -> DistroResult<PathBuf> {
    let root = root.ok_or_else(|| DistroError::Other("ROOT is not set (use --root or ROOT)".into()))?;
    debug!("Root set to {:?}", root);
    Ok(root)
}

fn require_base_url(base_url: Option<String>) -> DistroResult<String> {
    let base_url = base_url
        .ok_or_else(|| DistroError::Other("BASE_URL is not set (use --base-url or BASE_URL)".into()))?;
    debug!("Base URL set to {}", base_url);
    Ok(base_url)
}

async fn init_root(root: PathBuf) -> DistroResult<()> {
    let state = AppState::new(Settings::new(root, UNUSED_BASE_URL)?)?;
    state.init_root().await?;
    info!("Successfully created new root at {:?}", state.settings.root);
    Ok(())
}

async fn generate_server(root: PathBuf, args: ServerArgs) -> DistroResult<()> {
    let version = MinecraftVersion::parse(&args.version)?;
    let state = AppState::new(Settings::new(root, UNUSED_BASE_URL)?)?;
    debug!(
        "Generating server {} for Minecraft {} (Forge: {:?})",
        args.id, version, args.forge
    );

    // Channel queries are pinned so the descriptor names a concrete build.
    let loader = match args.forge.as_deref().map(LoaderQuery::parse) {
        Some(query) if query.is_channel() => {
            debug!("Resolving {} Forge version", query);
            let build = state
                .promotion_resolver()
                .resolve(&version, &query, false)
                .await?
                .ok_or_else(|| DistroError::UnresolvedLoaderVersion {
                    game_version: version.short(),
                    query: query.to_string(),
                })?;
            debug!("Forge version set to {}", build);
            Some(LoaderQuery::Explicit(build))
        }
        other => other,
    };

    state
        .manifest_builder()
        .create_server(&args.id, version, loader)
        .await?;
    Ok(())
}

async fn generate_distro(root: PathBuf, base_url: String, args: DistroArgs) -> DistroResult<()> {
    let file_name = format!("{}.json", args.name);
    let install_target = if args.install_local {
        let folder = args.helios_data_folder.clone().ok_or_else(|| {
            DistroError::Other(
                "HELIOS_DATA_FOLDER must be set when using --install-local".into(),
            )
        })?;
        Some(folder.join(&file_name))
    } else {
        None
    };

    let mut settings = Settings::new(root, &base_url)?;
    settings.discard_output = args.discard_output;
    settings.invalidate_cache = args.invalidate_cache;
    settings.fail_fast = args.fail_fast;
    settings.hash_algorithm = args.hash_algorithm;
    settings.parallelism = args.parallelism;
    debug!("{:?}", settings);

    let state = AppState::new(settings)?;
    let builder = state.manifest_builder();
    let distribution = if args.servers.is_empty() {
        builder.build_all().await?
    } else {
        builder.build_selected(&args.servers).await?
    };
    let json = serde_json::to_vec_pretty(&distribution)?;

    let out_path = state.settings.root.join(&file_name);
    write_atomic(&out_path, &json).await?;
    info!("Successfully generated {}", file_name);
    info!("Saved to {:?}", out_path);

    if let Some(target) = install_target {
        info!("Installing distribution to {:?}", target);
        write_atomic(&target, &json).await?;
        info!("Success!");
    }
    Ok(())
}

fn standalone_promotions() -> DistroResult<PromotionCache> {
    Ok(PromotionCache::new(Arc::new(HttpFetcher::new()?), PROMOTIONS_URL))
}

async fn latest_forge(version: &str) -> DistroResult<()> {
    let version = MinecraftVersion::parse(version)?;
    let resolver = PromotionResolver::new(Arc::new(standalone_promotions()?));
    let query = LoaderQuery::Channel(Channel::Latest);

    match resolver.resolve(&version, &query, true).await? {
        Some(build) => info!("Latest version: Forge {} ({})", build, version.short()),
        None => info!("No build available for {}.", version.short()),
    }
    Ok(())
}

async fn recommended_forge(version: &str) -> DistroResult<()> {
    let version = MinecraftVersion::parse(version)?;
    let index = standalone_promotions()?.index().await?;

    if let Some(build) = resolve_in(&index, &version, Channel::Recommended, true) {
        info!("Recommended version: Forge {} ({})", build, version.short());
        return Ok(());
    }

    info!(
        "No recommended build for {}. Checking for latest version..",
        version.short()
    );
    match resolve_in(&index, &version, Channel::Latest, true) {
        Some(build) => info!("Latest version: Forge {} ({})", build, version.short()),
        None => info!("No build available for {}.", version.short()),
    }
    Ok(())
}

async fn test_resolve(
    root: PathBuf,
    base_url: String,
    mc_ver: &str,
    forge_ver: &str,
) -> DistroResult<()> {
    let version = MinecraftVersion::parse(mc_ver)?;
    let state = AppState::new(Settings::new(root, &base_url)?)?;
    let options = ResolveOptions::new(&state.settings.root, "test", &state.settings.base_url);

    let resolver = state
        .registry
        .select(&version, &options)
        .ok_or_else(|| DistroError::UnsupportedGameVersion(version.short()))?;
    let module = resolver.resolve(&LoaderQuery::parse(forge_ver)).await?;

    println!("{}", serde_json::to_string_pretty(&module)?);
    Ok(())
}
