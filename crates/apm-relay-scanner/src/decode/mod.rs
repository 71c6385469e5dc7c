//! Barcode decoders.

mod code128;
mod qr;

pub use code128::Code128Decoder;
pub(crate) use code128::{checksum, PATTERNS, START_B, START_C, STOP_PATTERN};
pub use qr::QrDecoder;

use std::sync::Arc;

use crate::camera::Frame;

/// Finds barcode payloads in a frame.
pub trait Decoder: Send + Sync {
    /// Decoder name for logging.
    fn name(&self) -> &str;

    /// Payloads found in `frame`, most confident first. Empty when none.
    fn decode(&self, frame: &Frame) -> Vec<String>;
}

/// Runs several decoders over each frame, in order, and stops at the first
/// that finds anything.
pub struct DecoderChain {
    decoders: Vec<Arc<dyn Decoder>>,
    name: String,
}

impl DecoderChain {
    /// Chain trying `decoders` in the given order.
    pub fn new(decoders: Vec<Arc<dyn Decoder>>) -> Self {
        let name = decoders
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join("+");
        Self { decoders, name }
    }

    /// Code 128 first, then QR.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(Code128Decoder::new()),
            Arc::new(QrDecoder::new()),
        ])
    }
}

impl Decoder for DecoderChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, frame: &Frame) -> Vec<String> {
        self.decoders
            .iter()
            .map(|decoder| decoder.decode(frame))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }
}
