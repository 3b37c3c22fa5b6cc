use crate::error::Result;
use crate::handler::CommandHandler;
use crate::telegram::{next_offset, split_message, TelegramApi, Update};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Long-polls Telegram and answers each update on its own task.
pub struct BotRunner {
    api: Arc<TelegramApi>,
    handler: CommandHandler,
    poll_timeout_seconds: u64,
    poll_error_backoff: Duration,
}

impl BotRunner {
    pub fn new(api: Arc<TelegramApi>, handler: CommandHandler, poll_timeout_seconds: u64) -> Self {
        Self {
            api,
            handler,
            poll_timeout_seconds,
            poll_error_backoff: Duration::from_secs(1),
        }
    }

    pub fn with_poll_error_backoff(mut self, backoff: Duration) -> Self {
        self.poll_error_backoff = backoff;
        self
    }

    /// Poll until `shutdown` is cancelled, then wait for in-flight replies.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!("Starting bot...");
        let mut offset = 0;
        let mut tasks = JoinSet::new();

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.api.get_updates(offset, self.poll_timeout_seconds) => polled,
            };

            match polled {
                Ok(updates) => {
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        let api = Arc::clone(&self.api);
                        let handler = self.handler.clone();
                        let span = tracing::info_span!("update", update_id = update.update_id);
                        tasks.spawn(
                            async move { process_update(&api, &handler, update).await }
                                .instrument(span),
                        );
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Polling for updates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_error_backoff) => {}
                    }
                }
            }

            while let Some(finished) = tasks.try_join_next() {
                log_join(finished);
            }
        }

        info!(in_flight = tasks.len(), "Shutting down, waiting for in-flight replies");
        while let Some(finished) = tasks.join_next().await {
            log_join(finished);
        }
        info!("Bot stopped");
        Ok(())
    }
}

fn log_join(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Update task failed");
    }
}

/// Answer one update. Updates without a text message are skipped.
pub async fn process_update(api: &TelegramApi, handler: &CommandHandler, update: Update) {
    let Some(message) = update.message else {
        debug!("Skipping update without a message");
        return;
    };
    let Some(text) = message.text.as_deref() else {
        debug!("Skipping message without text");
        return;
    };

    let Some(reply) = handler.handle(text).await else {
        return;
    };

    let chunks = split_message(&reply);
    if chunks.len() > 1 {
        debug!(parts = chunks.len(), "Reply split into several messages");
    }
    for chunk in chunks {
        if let Err(e) = api.send_message(message.chat.id, chunk).await {
            error!(chat_id = message.chat.id, error = %e, "Failed to send reply");
            return;
        }
    }
}
