use async_trait::async_trait;

use crate::core::distribution::Module;
use crate::core::error::DistroResult;
use crate::core::promotion::LoaderQuery;

/// Produces the module tree for one (game version, loader build) pair.
///
/// One implementation exists per Forge packaging era; the registry picks
/// the right one from the game version.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, query: &LoaderQuery) -> DistroResult<Module>;

    /// Short name of the packaging era, for logs.
    fn era(&self) -> &'static str;
}
