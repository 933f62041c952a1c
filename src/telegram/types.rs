//! Bot API wire types and message classification

use serde::{Deserialize, Serialize};

/// Envelope returned by every Bot API method
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// Incoming update (only message updates are used)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One resolution of a sent photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

/// Result of `getFile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
}

/// What a message asks the bot to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Start,
    GetLink,
    /// Photo, carrying the file id of the largest resolution
    Photo(String),
    Text,
    /// Unknown commands, stickers, documents, ...
    Other,
}

/// Classify a message
///
/// Commands may carry a `@botname` suffix and trailing arguments.
pub fn classify(message: &Message) -> Incoming {
    let largest = message
        .photo
        .as_deref()
        .and_then(|sizes| sizes.iter().max_by_key(|p| p.width as u64 * p.height as u64));
    if let Some(photo) = largest {
        return Incoming::Photo(photo.file_id.clone());
    }

    match message.text.as_deref() {
        Some(text) if text.starts_with('/') => {
            let word = text.split_whitespace().next().unwrap_or_default();
            let command = word.split('@').next().unwrap_or_default();
            match command {
                "/start" => Incoming::Start,
                "/getlink" => Incoming::GetLink,
                _ => Incoming::Other,
            }
        }
        Some(_) => Incoming::Text,
        None => Incoming::Other,
    }
}
