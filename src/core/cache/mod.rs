mod locks;
mod store;

pub use locks::PathLocks;
pub use store::{write_atomic, ArtifactStore, DiskArtifactStore, ARTIFACT_CACHE_DIR};
