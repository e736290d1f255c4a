pub mod game_version;
pub mod range;

pub use game_version::MinecraftVersion;
pub use range::VersionRange;
