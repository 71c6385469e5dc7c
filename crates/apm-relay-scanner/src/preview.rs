//! Live preview surfaces and operator cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::camera::Frame;

/// Shared flag the operator sets to abort a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request. The owner calls this before starting a
    /// scan; previews never clear the token themselves.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Where frames are shown to the operator while scanning.
pub trait Preview: Send {
    /// Show one frame.
    fn show(&mut self, frame: &Frame);

    /// Whether the operator asked to stop. Checked once per frame.
    fn cancel_requested(&mut self) -> bool;

    /// Tear the preview down.
    fn close(&mut self);
}

/// Factory for previews, one per scan.
pub trait PreviewSurface: Send + Sync {
    /// Open a preview labelled `label`.
    fn open(&self, label: &str) -> Box<dyn Preview>;
}

/// Preview without a window; frames go to the debug log and cancellation
/// comes from a [`CancelToken`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    token: CancelToken,
}

impl HeadlessSurface {
    /// Surface driven by `token`.
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }

    /// Token the operator uses to cancel.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl PreviewSurface for HeadlessSurface {
    fn open(&self, label: &str) -> Box<dyn Preview> {
        debug!("Preview '{}' opened", label);
        Box::new(HeadlessPreview {
            label: label.to_string(),
            token: self.token.clone(),
            frames_shown: 0,
        })
    }
}

struct HeadlessPreview {
    label: String,
    token: CancelToken,
    frames_shown: u64,
}

impl Preview for HeadlessPreview {
    fn show(&mut self, frame: &Frame) {
        self.frames_shown += 1;
        debug!(
            "{}: frame {} ({}x{})",
            self.label,
            self.frames_shown,
            frame.width(),
            frame.height()
        );
    }

    fn cancel_requested(&mut self) -> bool {
        self.token.is_cancelled()
    }

    fn close(&mut self) {
        debug!(
            "Preview '{}' closed after {} frames",
            self.label, self.frames_shown
        );
    }
}
