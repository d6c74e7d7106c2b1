pub mod config;
pub mod traits;
