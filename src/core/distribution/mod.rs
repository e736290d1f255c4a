pub mod builder;
pub mod model;

pub use builder::{BuildOptions, ManifestBuilder, DEFAULT_SERVER_PARALLELISM};
pub use model::{
    Artifact, Distribution, Module, ModuleType, ServerFailure, ServerManifest,
    DISTRIBUTION_FORMAT_VERSION,
};
