pub mod command;
pub mod error;
pub mod handler;
pub mod runner;
pub mod telegram;
pub mod youtube;

pub use command::BotCommand;
pub use error::{BotError, Result};
pub use handler::{CommandHandler, RequestDefaults};
pub use runner::BotRunner;
pub use telegram::TelegramApi;
