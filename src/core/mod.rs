// ─── Forge Distro Core ───
// Builds launcher distribution manifests for Forge servers.
//
// Architecture:
//   core/
//     version/      game versions and version ranges
//     promotion/    Forge promotion index, channel queries
//     maven/        artifact coordinates and repository hosts
//     downloader/   fetch trait over reqwest, content digests
//     cache/        artifact metadata store, per-path locks, atomic writes
//     loaders/      resolver registry and one resolver per Forge era
//     server/       server descriptors on disk
//     distribution/ module model and the manifest builder
//     state/        settings and wiring for the command line

pub mod cache;
pub mod distribution;
pub mod downloader;
pub mod error;
pub mod http;
pub mod loaders;
pub mod maven;
pub mod promotion;
pub mod server;
pub mod state;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;
