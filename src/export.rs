//! Flashcard export hand-off
//!
//! The pipeline does not build cards itself; it hands the enriched caption and
//! the playback position to a [`CardExporter`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Caption;

/// Everything an exporter receives for one card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub caption: Caption,
    pub current_time: f64,
    /// Resolved media URL, as supplied by the player
    pub media_url: Option<String>,
}

/// Result of a successful export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub exporter: String,
    pub caption_id: String,
}

#[async_trait]
pub trait CardExporter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn export(&self, request: ExportRequest) -> Result<ExportReceipt>;
}

/// Exporter that only logs the request
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExporter;

#[async_trait]
impl CardExporter for LoggingExporter {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn export(&self, request: ExportRequest) -> Result<ExportReceipt> {
        let caption = &request.caption;
        tracing::info!(
            caption_id = %caption.id,
            current_time = request.current_time,
            media_url = ?request.media_url,
            tokens = caption.tokens.as_ref().map(Vec::len).unwrap_or(0),
            "Export requested for {:?}",
            caption.text
        );
        Ok(ExportReceipt {
            exporter: self.name().to_string(),
            caption_id: caption.id.clone(),
        })
    }
}
