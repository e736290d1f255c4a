mod index;
mod query;
mod resolver;

pub use index::{PromotionCache, PromotionIndex, PROMOTIONS_TTL_SECS, PROMOTIONS_URL};
pub use query::{Channel, LoaderQuery};
pub use resolver::{resolve_in, PromotionResolver};
