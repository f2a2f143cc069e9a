//! Payment alerts sent to a Telegram chat through the Bot API.

use std::{fmt::Debug, path::Path};

use teloxide::{
    RequestError,
    prelude::*,
    types::{ChatId, InputFile, ParseMode, Recipient},
};
use url::Url;

/// The public Telegram Bot API.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// The errors that may occur while sending a notification.
///
/// Notifications are best-effort, so these errors are logged and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The bot token or the chat ID was not provided at start up.
    #[error("the Telegram bot token or chat ID is not configured")]
    NotConfigured,

    /// The Bot API base URL could not be parsed.
    #[error("invalid Telegram API URL \"{url}\": {source}")]
    InvalidApiUrl {
        /// The URL as it was configured.
        url: String,
        /// The parse error.
        source: url::ParseError,
    },

    /// The uploaded image could not be read back from disk.
    #[error("could not read image \"{path}\": {source}")]
    ReadImage {
        /// The path of the image.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The request could not be sent or the reply could not be read.
    #[error("request to Telegram failed: {0}")]
    Request(RequestError),

    /// The Bot API replied with `ok: false`.
    #[error("Telegram rejected the message: {description}")]
    Rejected {
        /// The error description from the Bot API.
        description: String,
    },
}

impl From<RequestError> for NotificationError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Api(api_error) => NotificationError::Rejected {
                description: api_error.to_string(),
            },
            other => NotificationError::Request(other),
        }
    }
}

/// A client for sending photos to a single Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
    chat_id: String,
}

impl Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.bot.api_url().as_str())
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Create a notifier that posts to `chat_id` as the bot identified by `bot_token`.
    ///
    /// `api_url` is the base URL of the Bot API, usually [DEFAULT_TELEGRAM_API_URL].
    /// A numeric `chat_id` is a chat ID, anything else is used as a channel username.
    ///
    /// # Errors
    /// Returns [NotificationError::InvalidApiUrl] if `api_url` is not a valid URL.
    pub fn new(api_url: &str, bot_token: &str, chat_id: &str) -> Result<Self, NotificationError> {
        let api_url = Url::parse(api_url).map_err(|source| NotificationError::InvalidApiUrl {
            url: api_url.to_owned(),
            source,
        })?;

        let recipient = match chat_id.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(chat_id.to_owned()),
        };

        Ok(Self {
            bot: Bot::new(bot_token).set_api_url(api_url),
            recipient,
            chat_id: chat_id.to_owned(),
        })
    }

    /// The chat that receives the notifications.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send `photo` to the chat with a Markdown formatted `caption`.
    ///
    /// # Errors
    /// Returns an error if the request fails or the Bot API does not accept the photo.
    pub async fn send_photo(
        &self,
        photo: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<(), NotificationError> {
        // Captions use the legacy Markdown syntax, MarkdownV2 would need `!` escaped.
        #[allow(deprecated)]
        let parse_mode = ParseMode::Markdown;

        self.bot
            .send_photo(
                self.recipient.clone(),
                InputFile::memory(photo).file_name(file_name.to_owned()),
            )
            .caption(caption)
            .parse_mode(parse_mode)
            .await?;

        Ok(())
    }
}

/// The Markdown caption announcing a payment from `name`.
pub fn payment_caption(name: &str, transaction_id: &str) -> String {
    format!("💸 *New Payment Received!*\n\n👤 *Name:* {name}\n🆔 *Transaction ID:* {transaction_id}")
}

/// Send the screenshot at `image_path` to the chat along with the sender's details.
///
/// # Errors
/// Returns an error if `notifier` is `None`, the image cannot be read, or the photo cannot be sent.
pub async fn notify_payment(
    notifier: Option<&TelegramNotifier>,
    image_path: &Path,
    name: &str,
    transaction_id: &str,
) -> Result<(), NotificationError> {
    let notifier = notifier.ok_or(NotificationError::NotConfigured)?;

    let photo = tokio::fs::read(image_path)
        .await
        .map_err(|source| NotificationError::ReadImage {
            path: image_path.display().to_string(),
            source,
        })?;
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_owned());

    notifier
        .send_photo(photo, &file_name, &payment_caption(name, transaction_id))
        .await
}
