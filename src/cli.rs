//! Command line definitions (clap derive).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use forge_distro::core::distribution::DEFAULT_SERVER_PARALLELISM;
use forge_distro::core::downloader::HashAlgorithm;

/// Generate launcher distribution manifests for Forge servers.
#[derive(Parser, Debug)]
#[command(name = "forge-distro", author, version)]
pub struct Cli {
    /// Distribution root directory
    #[arg(long, global = true, env = "ROOT")]
    pub root: Option<PathBuf>,

    /// Base URL of the file host serving the root
    #[arg(long, global = true, env = "BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create structures
    #[command(alias = "i")]
    Init {
        #[command(subcommand)]
        target: InitTarget,
    },

    /// Generate server descriptors and distributions
    #[command(alias = "g")]
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },

    /// Print the latest promoted Forge build
    LatestForge {
        /// Minecraft version
        version: String,
    },

    /// Print the recommended Forge build, or the latest if there is none
    RecommendedForge {
        /// Minecraft version
        version: String,
    },

    /// Resolve one Forge module tree and print it
    Test {
        /// Minecraft version
        #[arg(value_name = "MC_VER")]
        mc_ver: String,
        /// Forge build, or `latest` / `recommended`
        #[arg(value_name = "FORGE_VER")]
        forge_ver: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum InitTarget {
    /// Create an empty root layout
    Root,
}

#[derive(Subcommand, Debug)]
pub enum GenerateTarget {
    /// Write a new server descriptor
    Server(ServerArgs),

    /// Build the distribution from every server under the root
    Distro(DistroArgs),
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Server id
    pub id: String,

    /// Minecraft version
    pub version: String,

    /// Forge build, or `latest` / `recommended` (pinned when written)
    #[arg(long)]
    pub forge: Option<String>,
}

#[derive(Args, Debug)]
pub struct DistroArgs {
    /// Distribution file name, without `.json`
    #[arg(default_value = "distribution")]
    pub name: String,

    /// Also copy the distribution into the local Helios data folder
    #[arg(long)]
    pub install_local: bool,

    /// Delete materialized files once hashed
    #[arg(long)]
    pub discard_output: bool,

    /// Ignore and delete cached metadata as it is encountered
    #[arg(long)]
    pub invalidate_cache: bool,

    /// Only build these server ids (repeatable); all servers when omitted
    #[arg(long = "server", value_name = "ID")]
    pub servers: Vec<String>,

    /// Stop at the first server that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Servers resolved at once
    #[arg(long, default_value_t = DEFAULT_SERVER_PARALLELISM)]
    pub parallelism: usize,

    /// Digest recorded for each artifact
    #[arg(long, default_value = "md5")]
    pub hash_algorithm: HashAlgorithm,

    /// Helios launcher data folder used by `--install-local`
    #[arg(long, env = "HELIOS_DATA_FOLDER")]
    pub helios_data_folder: Option<PathBuf>,
}
