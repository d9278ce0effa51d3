pub mod config;
pub mod handlers;
pub mod server;

pub use config::ServerConfig;
pub use handlers::{parse_format, parse_node_list};
pub use server::{AppState, create_router};
