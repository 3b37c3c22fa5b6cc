pub mod config;
pub mod error;

pub use config::{BotConfig, Config, ProviderConfig};
pub use error::{Result, TutorbotError};
