pub mod context;
pub mod forge;
pub mod legacy;
pub mod modern;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod resolver;

pub use context::{ResolveOptions, ResolverContext, ResolverServices, DEFAULT_LIBRARY_CONCURRENCY};
pub use forge::InstallerProfileResolver;
pub use legacy::LegacyUniversalResolver;
pub use modern::ModernInstallerResolver;
pub use pipeline::{ArtifactPipeline, LIBRARY_ROOT, VERSIONS_ROOT};
pub use registry::{ResolverFactory, ResolverRegistry};
pub use resolver::ModuleResolver;
