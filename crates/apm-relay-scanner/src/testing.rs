//! Test fixtures: a Code 128 renderer and scripted cameras.
//!
//! Exposed so the controller and binary crates can drive a full scan without
//! a physical camera.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use apm_relay_core::{Error, Result};
use image::{DynamicImage, GrayImage, Luma};

use crate::camera::{Camera, CameraSource, Frame};
use crate::decode::{checksum, PATTERNS, START_B, START_C, STOP_PATTERN};

const QUIET_MODULES: u32 = 10;

/// Encode `text` as Code 128 symbols including start and checksum.
///
/// Even-length digit strings use set C, everything else set B. Returns
/// `None` for characters outside printable ASCII.
pub fn encode(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() {
        return None;
    }
    let mut symbols = if text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_digit()) {
        let digits = text.as_bytes();
        let mut symbols = vec![START_C];
        for pair in digits.chunks(2) {
            symbols.push((pair[0] - b'0') * 10 + (pair[1] - b'0'));
        }
        symbols
    } else {
        let mut symbols = vec![START_B];
        for byte in text.bytes() {
            if !(32..=127).contains(&byte) {
                return None;
            }
            symbols.push(byte - 32);
        }
        symbols
    };
    symbols.push(checksum(&symbols));
    Some(symbols)
}

/// Render symbols (start..checksum) plus the stop pattern, black on white.
pub fn render_symbols(symbols: &[u8], module_px: u32, height: u32) -> GrayImage {
    let module_px = module_px.max(1);
    let mut widths: Vec<u8> = Vec::new();
    for &value in symbols {
        widths.extend_from_slice(&PATTERNS[value as usize]);
    }
    widths.extend_from_slice(&STOP_PATTERN);

    let modules: u32 = widths.iter().map(|&w| u32::from(w)).sum::<u32>() + 2 * QUIET_MODULES;
    let mut img = GrayImage::from_pixel(modules * module_px, height.max(1), Luma([255]));
    let mut x = QUIET_MODULES * module_px;
    for (i, &width) in widths.iter().enumerate() {
        let span = u32::from(width) * module_px;
        if i % 2 == 0 {
            for dx in x..x + span {
                for y in 0..img.height() {
                    img.put_pixel(dx, y, Luma([0]));
                }
            }
        }
        x += span;
    }
    img
}

/// Encode and render `text`.
pub fn render_code128(text: &str, module_px: u32, height: u32) -> Option<GrayImage> {
    encode(text).map(|symbols| render_symbols(&symbols, module_px, height))
}

/// A frame carrying `text` as a barcode.
pub fn barcode_frame(text: &str) -> Frame {
    match render_code128(text, 2, 40) {
        Some(img) => DynamicImage::ImageLuma8(img),
        None => blank_frame(),
    }
}

/// A white frame with nothing to decode.
pub fn blank_frame() -> Frame {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 32, Luma([255])))
}

/// Camera source that plays a fixed script of reads and counts device use.
///
/// `None` entries are failed reads. The script loops; an empty script
/// always fails.
#[derive(Clone)]
pub struct ScriptedSource {
    script: Vec<Option<Frame>>,
    frame_interval: Duration,
    fail_open: bool,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// Source playing `script`.
    pub fn new(script: Vec<Option<Frame>>) -> Self {
        Self {
            script,
            frame_interval: Duration::from_millis(5),
            fail_open: false,
            opens: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source whose device never opens.
    pub fn unopenable() -> Self {
        let mut source = Self::new(Vec::new());
        source.fail_open = true;
        source
    }

    /// Set the delay per read.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Times the device was opened.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Times the device was released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Frames read, failed reads included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CameraSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&self, camera_id: u32) -> Result<Box<dyn Camera>> {
        if self.fail_open {
            return Err(Error::DeviceUnavailable(camera_id));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedCamera {
            source: self.clone(),
            next: 0,
        }))
    }
}

struct ScriptedCamera {
    source: ScriptedSource,
    next: usize,
}

impl Camera for ScriptedCamera {
    fn read_frame(&mut self) -> Option<Frame> {
        self.source.reads.fetch_add(1, Ordering::SeqCst);
        if !self.source.frame_interval.is_zero() {
            std::thread::sleep(self.source.frame_interval);
        }
        let script = &self.source.script;
        if script.is_empty() {
            return None;
        }
        let frame = script[self.next % script.len()].clone();
        self.next += 1;
        frame
    }

    fn release(&mut self) {
        self.source.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_picks_set() {
        assert_eq!(encode("1234").unwrap()[0], START_C);
        assert_eq!(encode("123").unwrap()[0], START_B);
        assert_eq!(encode("AB").unwrap()[0], START_B);
        assert!(encode("").is_none());
        assert!(encode("é").is_none());
    }

    #[test]
    fn test_render_width() {
        // start + 1 data + checksum = 33 modules, stop 13, quiet 20
        let img = render_symbols(&encode("A").unwrap(), 2, 5);
        assert_eq!(img.width(), (33 + 13 + 20) * 2);
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(QUIET_MODULES * 2, 0)[0], 0);
    }

    #[test]
    fn test_scripted_camera_counts() {
        let source = ScriptedSource::new(vec![None, Some(blank_frame())])
            .with_frame_interval(Duration::ZERO);
        let mut camera = source.open(0).unwrap();
        assert!(camera.read_frame().is_none());
        assert!(camera.read_frame().is_some());
        assert!(camera.read_frame().is_none());
        camera.release();
        assert_eq!(source.opens(), 1);
        assert_eq!(source.reads(), 3);
        assert_eq!(source.releases(), 1);
    }
}
