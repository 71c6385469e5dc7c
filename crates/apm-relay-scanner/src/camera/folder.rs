//! Camera that replays captured frames from a directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use apm_relay_core::{Error, Result};
use tracing::{debug, info};

use super::{Camera, CameraSource, Frame};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Camera source that replays image files from a directory.
///
/// Files are played in name order and the sequence loops, so a folder of
/// frames captured at the counter behaves like a live camera pointed at the
/// same card. A folder bound to a camera index with
/// [`ImageFolderCamera::for_camera`] refuses to open as any other index.
#[derive(Debug, Clone)]
pub struct ImageFolderCamera {
    dir: PathBuf,
    frame_interval: Duration,
    camera_id: Option<u32>,
}

impl ImageFolderCamera {
    /// Replay frames from `dir` at roughly 30 frames per second.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frame_interval: Duration::from_millis(33),
            camera_id: None,
        }
    }

    /// Only answer to camera `camera_id`.
    pub fn for_camera(mut self, camera_id: u32) -> Self {
        self.camera_id = Some(camera_id);
        self
    }

    /// Set the wait between frames.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    fn list_frames(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();
        Ok(frames)
    }
}

impl CameraSource for ImageFolderCamera {
    fn name(&self) -> &str {
        "image-folder"
    }

    fn open(&self, camera_id: u32) -> Result<Box<dyn Camera>> {
        if self.camera_id.is_some_and(|bound| bound != camera_id) {
            debug!(
                "{} replays camera {:?}, not {}",
                self.dir.display(),
                self.camera_id,
                camera_id
            );
            return Err(Error::DeviceUnavailable(camera_id));
        }
        let frames = Self::list_frames(&self.dir).map_err(|e| {
            debug!("cannot list {}: {}", self.dir.display(), e);
            Error::DeviceUnavailable(camera_id)
        })?;
        if frames.is_empty() {
            debug!("no frames in {}", self.dir.display());
            return Err(Error::DeviceUnavailable(camera_id));
        }
        info!(
            "Camera {} opened from {} ({} frames)",
            camera_id,
            self.dir.display(),
            frames.len()
        );
        Ok(Box::new(FolderPlayback {
            frames,
            next: 0,
            frame_interval: self.frame_interval,
        }))
    }
}

struct FolderPlayback {
    frames: Vec<PathBuf>,
    next: usize,
    frame_interval: Duration,
}

impl Camera for FolderPlayback {
    fn read_frame(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();
        match image::open(path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("frame {} unreadable: {}", path.display(), e);
                None
            }
        }
    }

    fn release(&mut self) {
        self.frames.clear();
    }
}
