pub mod config;
pub mod error;
pub mod evaluate;
pub mod github;
pub mod scrape;

pub use config::Config;
pub use error::{PrbenchError, Result};
