pub mod manager;
pub mod model;

pub use manager::{ServerManager, SERVERS_DIR, SERVER_DESCRIPTOR};
pub use model::ServerConfig;
