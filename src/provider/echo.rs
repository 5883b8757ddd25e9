//! Adapter that talks to nobody. Read receipts are logged and accepted;
//! history runs out after a fixed number of pages.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use log::info;

use crate::provider::{AdapterError, ChatAdapter};

pub struct EchoAdapter {
    history_pages: u32,
    pages_loaded: AtomicU32,
}

impl EchoAdapter {
    /// `history_pages` older pages are available before history runs out.
    pub fn new(history_pages: u32) -> Self {
        Self {
            history_pages,
            pages_loaded: AtomicU32::new(0),
        }
    }
}

impl Default for EchoAdapter {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ChatAdapter for EchoAdapter {
    fn name(&self) -> &str {
        "echo"
    }

    async fn send_read_receipt(&self, message_id: &str) -> Result<(), AdapterError> {
        info!("Read receipt for {}", message_id);
        Ok(())
    }

    async fn load_previous_messages(&self, count: u32) -> Result<bool, AdapterError> {
        let page = self.pages_loaded.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Loaded page {} ({} messages)", page, count);
        Ok(page >= self.history_pages)
    }
}
