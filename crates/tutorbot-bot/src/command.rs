/// A chat command understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    /// `/search <question>`; the question may be empty
    Search(String),
    /// `/youtube <query>`
    Youtube(String),
    Unknown(String),
}

impl BotCommand {
    /// Parse a message text the way Telegram addresses commands (`/cmd@botname args`).
    ///
    /// Returns `None` for plain text, and for commands addressed to a different bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let body = text.strip_prefix('/')?;

        let (head, args) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };

        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };

        if let (Some(target), Some(username)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(username.trim_start_matches('@')) {
                return None;
            }
        }

        if name.is_empty() {
            return None;
        }

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "search" => BotCommand::Search(args.to_string()),
            "youtube" => BotCommand::Youtube(args.to_string()),
            _ => BotCommand::Unknown(name.to_string()),
        };
        Some(command)
    }
}
