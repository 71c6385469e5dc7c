//! Video4Linux capture devices.

use std::io;
use std::time::Duration;

use apm_relay_core::{Error, Result};
use image::{DynamicImage, GrayImage, ImageFormat};
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::{Camera, CameraSource, Frame};

const BUFFER_COUNT: u32 = 4;

/// Longest a single read may block before it counts as a failed read.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Pixel layouts the relay can turn into frames, in order of preference.
/// Luma is all the decoders use, so the packed formats come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Yuyv,
    Grey,
    Mjpeg,
}

const PREFERRED: [PixelFormat; 3] = [PixelFormat::Yuyv, PixelFormat::Grey, PixelFormat::Mjpeg];

impl PixelFormat {
    fn fourcc(self) -> FourCC {
        FourCC::new(match self {
            PixelFormat::Yuyv => b"YUYV",
            PixelFormat::Grey => b"GREY",
            PixelFormat::Mjpeg => b"MJPG",
        })
    }

    fn from_fourcc(fourcc: &FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"GREY" => Some(PixelFormat::Grey),
            b"MJPG" => Some(PixelFormat::Mjpeg),
            _ => None,
        }
    }
}

/// Frame geometry agreed with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    pixels: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
}

/// Camera source over `/dev/video{camera_id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V4lSource;

impl V4lSource {
    /// Source for the local video devices.
    pub fn new() -> Self {
        Self
    }
}

impl CameraSource for V4lSource {
    fn name(&self) -> &str {
        "v4l2"
    }

    fn open(&self, camera_id: u32) -> Result<Box<dyn Camera>> {
        let unavailable = |e: io::Error| {
            debug!("/dev/video{}: {}", camera_id, e);
            Error::DeviceUnavailable(camera_id)
        };

        let device = Device::new(camera_id as usize).map_err(unavailable)?;
        let layout = negotiate(&device).map_err(unavailable)?;
        let mut stream =
            Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT).map_err(unavailable)?;
        stream.set_timeout(READ_TIMEOUT);

        info!(
            "Camera {} opened: {}x{} {:?}",
            camera_id, layout.width, layout.height, layout.pixels
        );
        Ok(Box::new(V4lCamera {
            stream: Some(stream),
            layout,
            camera_id,
        }))
    }
}

fn negotiate(device: &Device) -> io::Result<Layout> {
    let mut format = device.format()?;
    for wanted in PREFERRED {
        format.fourcc = wanted.fourcc();
        let applied = device.set_format(&format)?;
        if let Some(pixels) = PixelFormat::from_fourcc(&applied.fourcc) {
            return Ok(Layout {
                pixels,
                width: applied.width,
                height: applied.height,
                stride: applied.stride,
            });
        }
    }
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "device offers none of YUYV, GREY, MJPG",
    ))
}

struct V4lCamera {
    stream: Option<Stream<'static>>,
    layout: Layout,
    camera_id: u32,
}

impl Camera for V4lCamera {
    fn read_frame(&mut self) -> Option<Frame> {
        let stream = self.stream.as_mut()?;
        let (buffer, meta) = match CaptureStream::next(stream) {
            Ok(captured) => captured,
            Err(e) => {
                debug!("camera {}: read failed: {}", self.camera_id, e);
                return None;
            }
        };
        // some drivers leave bytesused at zero for full buffers
        let used = match meta.bytesused as usize {
            0 => buffer.len(),
            n => n.min(buffer.len()),
        };
        to_frame(&self.layout, &buffer[..used])
    }

    fn release(&mut self) {
        // dropping the stream stops capture and unmaps the buffers
        if self.stream.take().is_some() {
            debug!("camera {}: stream stopped", self.camera_id);
        }
    }
}

fn to_frame(layout: &Layout, data: &[u8]) -> Option<Frame> {
    match layout.pixels {
        PixelFormat::Mjpeg => match image::load_from_memory_with_format(data, ImageFormat::Jpeg) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("MJPG frame undecodable: {}", e);
                None
            }
        },
        PixelFormat::Yuyv => luma_plane(data, layout, 2),
        PixelFormat::Grey => luma_plane(data, layout, 1),
    }
}

/// Pull the luma samples out of a packed frame; `step` is the byte distance
/// between two luma samples on a row.
fn luma_plane(data: &[u8], layout: &Layout, step: usize) -> Option<Frame> {
    let width = layout.width as usize;
    let height = layout.height as usize;
    let stride = (layout.stride as usize).max(width * step);
    if data.len() < stride * (height.saturating_sub(1)) + width * step {
        return None;
    }

    let mut luma = Vec::with_capacity(width * height);
    for row in data.chunks(stride).take(height) {
        luma.extend(row.iter().step_by(step).take(width));
    }
    GrayImage::from_raw(layout.width, layout.height, luma).map(DynamicImage::ImageLuma8)
}
