//! Chat notifier adapters.
//!
//! - `TelegramNotifier` - Sends payment notices through the Telegram Bot API
//! - `LoggingNotifier` - Logs notices when no bot token is configured

mod logging_notifier;
mod telegram_notifier;

pub use logging_notifier::LoggingNotifier;
pub use telegram_notifier::{render_payment_message, TelegramConfig, TelegramNotifier};
