//! # apm-relay-scanner
//!
//! Reads an identifier from a camera within a deadline.
//!
//! This crate provides:
//! - Capability traits for cameras, previews and decoders
//! - A capability probe so a missing camera or decoder is reported up front
//! - The scan loop with timeout, frame-gap detection and operator cancel
//! - A Code 128 scanline decoder and a QR decoder, chained
//! - An image-folder camera for replaying captured frames
//! - Video4Linux capture with the `v4l` feature
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on apm-relay-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod decode;
pub mod preview;
pub mod session;
pub mod testing;

// Re-export commonly used types
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub use camera::V4lSource;
pub use camera::{hardware_source, Camera, CameraSource, Frame, ImageFolderCamera};
pub use decode::{Code128Decoder, Decoder, DecoderChain, QrDecoder};
pub use preview::{CancelToken, HeadlessSurface, Preview, PreviewSurface};
pub use session::{ScanBackend, ScanRequest, ScanSession, Scanner, MIN_SCAN_TIMEOUT};
