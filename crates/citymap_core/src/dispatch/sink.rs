//! Outbound side of the dispatch layer.
//!
//! The chat transport implements `ReplySink`; handlers never see the
//! network client.

use crate::model::preference::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Transport-assigned message handle, used for later edits.
pub type MessageId = i64;

/// One button in a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Delivery failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Edit target already shows the requested content.
    NotModified,
    Transport(String),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotModified => write!(f, "message is not modified"),
            Self::Transport(message) => write!(f, "delivery failed: {message}"),
        }
    }
}

impl Error for DeliveryError {}

pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Reply operations a chat transport offers to the dispatcher.
pub trait ReplySink {
    fn send_text(&mut self, chat_id: UserId, text: &str) -> DeliveryResult<MessageId>;

    /// Sends a message with one button per choice.
    fn send_choices(
        &mut self,
        chat_id: UserId,
        text: &str,
        choices: &[Choice],
    ) -> DeliveryResult<MessageId>;

    /// Uploads the file at `photo`. The file may be deleted once this returns.
    fn send_photo(
        &mut self,
        chat_id: UserId,
        photo: &Path,
        caption: &str,
    ) -> DeliveryResult<MessageId>;

    /// Replaces text and buttons of an earlier message. Empty `choices`
    /// removes the buttons.
    fn edit_text(
        &mut self,
        chat_id: UserId,
        message_id: MessageId,
        text: &str,
        choices: &[Choice],
    ) -> DeliveryResult<()>;

    fn delete_message(&mut self, chat_id: UserId, message_id: MessageId) -> DeliveryResult<()>;

    /// Acknowledges a button press; `alert` asks for a modal notice.
    fn answer_callback(&mut self, callback_id: &str, text: &str, alert: bool)
        -> DeliveryResult<()>;
}
