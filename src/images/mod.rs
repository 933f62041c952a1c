//! Image storage module
//!
//! Provides:
//! - Session-keyed blob storage (one image per session id)
//! - Content-type sniffing and content hashing for HTTP serving

mod store;

pub use store::{sniff_content_type, ImageRecord, ImageStore};
