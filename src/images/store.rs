//! Session-keyed image storage
//!
//! Images live in the `images` table keyed by session id. A put replaces
//! whatever was stored under the key (delete then insert, one transaction);
//! records are never updated in place and never expire.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::RelayError;
use crate::sessions::SessionId;

/// Fallback when the magic bytes are not recognised
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Image record from storage
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub session_id: SessionId,
    pub data: Vec<u8>,
    pub created_at: String,
}

impl ImageRecord {
    /// MIME type derived from the stored bytes
    pub fn content_type(&self) -> &'static str {
        sniff_content_type(&self.data)
    }

    /// File extension matching [`ImageRecord::content_type`]
    pub fn extension(&self) -> &'static str {
        match self.content_type() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }

    /// Strong validator for HTTP caching (SHA-256 of the content)
    pub fn etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }
}

/// Identify common image formats by their leading bytes
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

/// Blob store over the `images` table
#[derive(Clone)]
pub struct ImageStore {
    pool: SqlitePool,
}

impl ImageStore {
    /// Create a new image store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store `data` under `session_id`, replacing any previous image
    pub async fn put(&self, session_id: &SessionId, data: &[u8]) -> Result<(), RelayError> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM images WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO images (session_id, image_data, created_at) VALUES (?, ?, ?)")
            .bind(session_id.as_str())
            .bind(data)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Stored image for session {} ({} bytes)", session_id, data.len());
        Ok(())
    }

    /// Get the image stored under `session_id`
    pub async fn get(&self, session_id: &SessionId) -> Result<ImageRecord, RelayError> {
        let row: Option<(Vec<u8>, String)> =
            sqlx::query_as("SELECT image_data, created_at FROM images WHERE session_id = ?")
                .bind(session_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        let (data, created_at) = row.ok_or_else(|| RelayError::not_found(session_id))?;
        Ok(ImageRecord {
            session_id: session_id.clone(),
            data,
            created_at,
        })
    }

    /// Check if an image exists
    pub async fn exists(&self, session_id: &SessionId) -> Result<bool, RelayError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM images WHERE session_id = ?")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_pool;

    fn sid(raw: &str) -> SessionId {
        SessionId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = ImageStore::new(test_pool().await);
        let id = sid("ab12cd34");
        let data = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];

        store.put(&id, &data).await.unwrap();
        let record = store.get(&id).await.unwrap();

        assert_eq!(record.data, data);
        assert_eq!(record.session_id, id);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let pool = test_pool().await;
        let store = ImageStore::new(pool.clone());
        let id = sid("ab12cd34");

        store.put(&id, b"first image, longer").await.unwrap();
        store.put(&id, b"second").await.unwrap();

        assert_eq!(store.get(&id).await.unwrap().data, b"second");

        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM images")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = ImageStore::new(test_pool().await);
        let result = store.get(&sid("zzzzzzzz")).await;
        assert!(matches!(result, Err(RelayError::RecordNotFound(ref s)) if s == "zzzzzzzz"));
    }

    #[tokio::test]
    async fn test_empty_blob_round_trips() {
        let store = ImageStore::new(test_pool().await);
        let id = sid("00000000");
        store.put(&id, &[]).await.unwrap();
        assert!(store.get(&id).await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = ImageStore::new(test_pool().await);
        store.put(&sid("aaaaaaaa"), b"a").await.unwrap();
        store.put(&sid("bbbbbbbb"), b"b").await.unwrap();

        assert_eq!(store.get(&sid("aaaaaaaa")).await.unwrap().data, b"a");
        assert_eq!(store.get(&sid("bbbbbbbb")).await.unwrap().data, b"b");
    }

    #[tokio::test]
    async fn test_exists() {
        let store = ImageStore::new(test_pool().await);
        let id = sid("ab12cd34");
        assert!(!store.exists(&id).await.unwrap());
        store.put(&id, b"x").await.unwrap();
        assert!(store.exists(&id).await.unwrap());
    }

    #[test]
    fn test_sniff_content_type() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xDB]), "image/jpeg");
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(sniff_content_type(b"GIF89a..."), "image/gif");
        assert_eq!(sniff_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(sniff_content_type(b"plain text"), DEFAULT_CONTENT_TYPE);
        assert_eq!(sniff_content_type(&[]), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_etag_is_content_hash() {
        let record = ImageRecord {
            session_id: sid("ab12cd34"),
            data: b"test".to_vec(),
            created_at: String::new(),
        };
        // Known SHA-256 of "test"
        assert_eq!(
            record.etag(),
            "\"9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08\""
        );
        assert_eq!(record.extension(), "jpg");
    }
}
