use std::sync::atomic::Ordering;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::envelope::{ClientDescriptor, FrameSize, Message};

use super::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heights {
    pub content_height: u32,
    pub page_height: u32,
    pub scroll_top: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Widths {
    pub content_width: u32,
    pub page_width: u32,
    pub scroll_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSizeReport {
    pub heights: Heights,
    pub widths: Widths,
}

fn px(content: u32, visible: u32) -> String {
    if content == visible {
        String::new()
    } else {
        format!("{content}px")
    }
}

impl Client {
    pub fn size(&self) -> FrameSizeReport {
        let m = self.inner.host.document_metrics();
        FrameSizeReport {
            heights: Heights {
                content_height: m.scroll_height,
                page_height: m.client_height,
                scroll_top: m.scroll_top,
            },
            widths: Widths {
                content_width: m.scroll_width,
                page_width: m.client_width,
                scroll_left: m.scroll_left,
            },
        }
    }

    /// Ask the parent to resize the frame. Without an explicit size, only the
    /// dimensions whose content overflows (or underflows) the viewport are
    /// sent. Returns whether a message went out.
    pub fn resize(&self, client: Option<ClientDescriptor>, size: Option<FrameSize>) -> Result<bool> {
        let client = self.checked_client(client).map_err(CanvasError::InvalidClient)?;
        let size = size.unwrap_or_else(|| {
            let m = self.inner.host.document_metrics();
            FrameSize {
                height: px(m.scroll_height, m.client_height),
                width: px(m.scroll_width, m.client_width),
            }
        });
        if size.is_empty() {
            return Ok(false);
        }
        self.postit(
            None,
            Message::Resize {
                config: client.into(),
                size,
            },
        )?;
        Ok(true)
    }

    /// Start (or stop, with `enabled == Some(false)`) the resize poll loop.
    ///
    /// Each call supersedes earlier loops. Starting needs a tokio runtime.
    pub fn autogrow(
        &self,
        client: Option<ClientDescriptor>,
        enabled: Option<bool>,
        interval: Option<Duration>,
    ) -> Result<Option<JoinHandle<()>>> {
        let generation = self.inner.autogrow_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !enabled.unwrap_or(true) {
            tracing::debug!("autogrow disabled");
            return Ok(None);
        }

        let runtime = Handle::try_current()
            .map_err(|e| CanvasError::Internal(format!("autogrow requires a tokio runtime: {e}")))?;
        let interval = interval.unwrap_or_else(|| self.inner.cfg.client.autogrow_interval());
        let this = self.clone();

        let handle = runtime.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if this.inner.autogrow_generation.load(Ordering::SeqCst) != generation {
                    break;
                }
                if let Err(e) = this.resize(client.clone(), None) {
                    tracing::warn!(code = e.code().as_str(), error = %e, "autogrow stopped");
                    break;
                }
            }
        });
        Ok(Some(handle))
    }
}
