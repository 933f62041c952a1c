//! Scenario tests
//!
//! - Sharing: link, upload, view, relink
//! - Durability: pending sessions across restarts

pub mod durability;
pub mod sharing;
