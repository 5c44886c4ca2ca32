//! Display Control Handler
//!
//! Protocol-side entry point for client monitor layout changes. Runs on the
//! I/O side: it only forwards layout values to the display loop and awaits
//! the result, never touching heads itself.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::multimon::manager::{LayoutAck, LayoutError};
use crate::multimon::types::{MonitorDescriptor, MonitorLayoutMessage, Rectangle};
use crate::server::display_loop::LayoutSubmitter;

/// Display control handler
///
/// Cheap to clone; clones share the last acknowledged desktop bounds.
#[derive(Debug, Clone)]
pub struct DisplayControlHandler {
    submitter: LayoutSubmitter,

    /// Generation and client bounds of the newest applied layout
    desktop: Arc<RwLock<(u64, Rectangle)>>,
}

impl DisplayControlHandler {
    /// Create a handler feeding the given display loop
    pub fn new(submitter: LayoutSubmitter) -> Self {
        Self {
            submitter,
            desktop: Arc::new(RwLock::new((0, Rectangle::default()))),
        }
    }

    /// Handle a client request for a layout change
    ///
    /// Completes once the display loop has fully processed the layout.
    ///
    /// # Errors
    ///
    /// Returns the layout's rejection, or [`LayoutError::Unavailable`] when
    /// the display loop is gone.
    pub async fn request_layout(&self, layout: MonitorLayoutMessage) -> Result<LayoutAck, LayoutError> {
        debug!("Client requested layout change: {} monitors", layout.monitors.len());

        let reply = self.submitter.submit(layout)?;
        let result = reply.wait().await?;

        match &result {
            Ok(ack) => {
                self.record(ack).await;
                info!(
                    "Layout {} acknowledged: desktop {}x{}",
                    ack.generation, ack.client_bounds.width, ack.client_bounds.height
                );
            }
            Err(e) => warn!("Layout change rejected: {}", e),
        }

        result
    }

    /// Handle a plain desktop resize from a client without monitor layout
    /// support
    ///
    /// Treated as a layout with a single primary monitor at the origin.
    pub async fn request_desktop_size(&self, width: u32, height: u32) -> Result<LayoutAck, LayoutError> {
        let monitor = MonitorDescriptor::new(0, 0, width, height, true);
        self.request_layout(MonitorLayoutMessage::new(vec![monitor]))
            .await
    }

    /// Client bounds of the newest applied layout
    pub async fn desktop_bounds(&self) -> Rectangle {
        self.desktop.read().await.1
    }

    /// Keep the bounds of the highest generation seen; replies to
    /// concurrent requests can resume in any order
    async fn record(&self, ack: &LayoutAck) {
        let mut desktop = self.desktop.write().await;
        if ack.generation > desktop.0 {
            *desktop = (ack.generation, ack.client_bounds);
        } else {
            debug!(
                "Ignoring bounds of layout {} (have {})",
                ack.generation, desktop.0
            );
        }
    }
}
