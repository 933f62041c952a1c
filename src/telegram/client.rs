//! Telegram Bot API client

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{ApiResponse, File, Update};

/// Public Bot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Bot API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("bot api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("file {0} has no download path")]
    MissingFilePath(String),

    #[error("file download failed with status {0}")]
    Download(reqwest::StatusCode),
}

// Request URLs embed the bot token, so they are stripped before the error
// can be displayed or logged
impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// Thin client over the Bot API methods the relay needs
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{base}/bot{token}`; holds the secret, never logged
    method_base: String,
    /// `{base}/file/bot{token}`
    file_base: String,
}

impl TelegramClient {
    /// Create a client for the public Bot API
    ///
    /// `request_timeout` must exceed the long-poll timeout.
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self, TelegramError> {
        Self::with_base_url(DEFAULT_API_URL, token, request_timeout)
    }

    /// Create a client against a custom API server
    pub fn with_base_url(
        base_url: &str,
        token: &str,
        request_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let base_url = base_url.trim_end_matches('/');
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            method_base: format!("{}/bot{}", base_url, token),
            file_base: format!("{}/file/bot{}", base_url, token),
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.method_base, method))
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse<R> = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(TelegramError::Api {
                    code: i64::from(status.as_u16()),
                    description: status.to_string(),
                })
            }
        };

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let code = body.error_code.unwrap_or(i64::from(status.as_u16()));
                let description = body.description.unwrap_or_default();
                warn!("Bot API {} failed: {} {}", method, code, description);
                Err(TelegramError::Api { code, description })
            }
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Send a plain-text message
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    /// Resolve a file id to a downloadable path
    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Download a file by the path returned from `getFile`
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TelegramError> {
        let response = self
            .client
            .get(format!("{}/{}", self.file_base, file_path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelegramError::Download(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch the bytes behind a photo file id
    pub async fn download_photo(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| TelegramError::MissingFilePath(file_id.to_string()))?;
        let data = self.download_file(&path).await?;
        debug!("Downloaded photo {} ({} bytes)", file_id, data.len());
        Ok(data)
    }

    /// Route updates to `url` instead of `getUpdates`
    ///
    /// Telegram echoes `secret_token` in the `X-Telegram-Bot-Api-Secret-Token`
    /// header of every delivery.
    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "setWebhook",
                &json!({
                    "url": url,
                    "secret_token": secret_token,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;
        Ok(())
    }

    /// Remove any webhook so `getUpdates` works
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}
