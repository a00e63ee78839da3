use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, error, info};

use crate::signal::SignalSource;
use crate::store::SubscriberStore;
use crate::telegram::messages;
use crate::telegram::{TelegramClient, Update};

/// Pause before retrying after a failed getUpdates call
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Recognized bot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Signal,
    Subscribe,
    Unsubscribe,
    Unknown,
}

/// Worker that long-polls Telegram for commands and answers them
pub struct GatewayWorker {
    client: Arc<TelegramClient>,
    signal_source: Arc<dyn SignalSource>,
    subscribers: Arc<SubscriberStore>,
    symbol: String,
    interval_min: u64,
}

impl GatewayWorker {
    pub fn new(
        client: Arc<TelegramClient>,
        signal_source: Arc<dyn SignalSource>,
        subscribers: Arc<SubscriberStore>,
        symbol: String,
        interval_min: u64,
    ) -> Self {
        Self {
            client,
            signal_source,
            subscribers,
            symbol,
            interval_min,
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!("Command gateway started");

        let mut offset = 0i64;

        loop {
            match self.client.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    error!("Failed to fetch updates: {e:#}");
                    time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Handle a single inbound update. Always replies to commands, even when
    /// storage has degraded to defaults; reply failures are only logged.
    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text else {
            return;
        };
        let chat_id = message.chat.id;

        // Plain chatter is ignored; only commands get a reply
        let Some(command) = parse_command(&text) else {
            return;
        };

        debug!("Command {:?} from chat {}", command, chat_id);

        let reply = match command {
            Command::Start => messages::welcome(&self.symbol, self.interval_min),
            Command::Help => messages::help(),
            Command::Signal => {
                let signal = self.signal_source.next_signal().await;
                messages::format_signal(&signal, &self.symbol)
            }
            Command::Subscribe => {
                if self.subscribers.add(chat_id).await {
                    info!("Chat {} subscribed", chat_id);
                    messages::subscribed(self.interval_min)
                } else {
                    messages::already_subscribed()
                }
            }
            Command::Unsubscribe => {
                if self.subscribers.remove(chat_id).await {
                    info!("Chat {} unsubscribed", chat_id);
                    messages::unsubscribed()
                } else {
                    messages::not_subscribed()
                }
            }
            Command::Unknown => messages::unknown_command(),
        };

        if let Err(e) = self.client.send_message(chat_id, &reply).await {
            error!("Failed to reply to chat {}: {}", chat_id, e);
        }
    }
}

/// Parse the leading command out of a message, tolerating `@botname`
/// suffixes. Returns None for non-command text.
fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }

    let name = first.split('@').next().unwrap_or(first);

    Some(match name {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/signal" => Command::Signal,
        "/subscribe" => Command::Subscribe,
        "/unsubscribe" => Command::Unsubscribe,
        _ => Command::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command("/signal"), Some(Command::Signal));
        assert_eq!(parse_command("/subscribe"), Some(Command::Subscribe));
        assert_eq!(parse_command("/unsubscribe"), Some(Command::Unsubscribe));
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help extra words"), Some(Command::Help));
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(parse_command("/signal@gold_bot"), Some(Command::Signal));
    }

    #[test]
    fn unknown_slash_command_is_flagged() {
        assert_eq!(parse_command("/price"), Some(Command::Unknown));
    }

    #[test]
    fn plain_text_is_ignored() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command(""), None);
    }
}
