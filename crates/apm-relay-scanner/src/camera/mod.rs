//! Camera capability and the built-in camera sources.
//!
//! - [`ImageFolderCamera`] replays captured frames from a directory
//! - `V4lSource` captures from `/dev/videoN` on Linux (`v4l` feature)

mod folder;
#[cfg(all(feature = "v4l", target_os = "linux"))]
mod video;

use std::sync::Arc;

use apm_relay_core::Result;

pub use folder::ImageFolderCamera;
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub use video::V4lSource;

/// One captured frame.
pub type Frame = image::DynamicImage;

/// An opened camera device.
///
/// The device is held exclusively until [`Camera::release`] is called.
pub trait Camera: Send {
    /// Read the next frame; `None` when the read failed.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Give the device back.
    fn release(&mut self);
}

/// Something that can open cameras by index.
pub trait CameraSource: Send + Sync {
    /// Human-readable source name for logging.
    fn name(&self) -> &str;

    /// Open camera `camera_id`; fails with [`apm_relay_core::Error::DeviceUnavailable`].
    fn open(&self, camera_id: u32) -> Result<Box<dyn Camera>>;
}

/// Capture hardware compiled into this build, if any.
pub fn hardware_source() -> Option<Arc<dyn CameraSource>> {
    #[cfg(all(feature = "v4l", target_os = "linux"))]
    {
        Some(Arc::new(V4lSource::new()))
    }

    #[cfg(not(all(feature = "v4l", target_os = "linux")))]
    {
        None
    }
}
