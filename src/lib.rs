pub mod auth;
pub mod config;
pub mod crypt;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod provision;
pub mod server;
pub mod shadow;
pub mod utils;

pub use dispatch::Dispatcher;
pub use server::Server;
