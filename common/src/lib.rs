pub mod config;
pub mod models;
pub mod utils;
pub mod wallet;

pub use self::config::*;
pub use self::utils::*;
