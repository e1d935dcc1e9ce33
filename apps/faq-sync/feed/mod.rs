//! Source feed: the authoritative FAQ list.

mod drupal;
pub mod models;

pub use drupal::{DEFAULT_FEED_URL, DrupalFaqFeed};

use crate::types::FaqRecord;
use anyhow::Result;
use async_trait::async_trait;

/// Anything that can produce the current, complete FAQ list.
#[async_trait]
pub trait FaqSource: Send + Sync {
    async fn fetch_faqs(&self) -> Result<Vec<FaqRecord>>;
}
