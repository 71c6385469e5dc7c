//! The scan loop and the capability-checked scanner.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use apm_relay_core::{Error, Result, ScannerSettings};
use tracing::{debug, info, warn};

use crate::camera::{hardware_source, Camera, CameraSource, ImageFolderCamera};
use crate::decode::{Decoder, DecoderChain};
use crate::preview::{CancelToken, HeadlessSurface, Preview, PreviewSurface};

/// Shortest timeout a scan will honor.
pub const MIN_SCAN_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest gap between good frames before the camera is considered dead.
pub const MAX_FRAME_GAP: Duration = Duration::from_secs(1);

const READ_RETRY: Duration = Duration::from_millis(10);

/// Parameters for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Camera index.
    pub camera_id: u32,
    /// Requested timeout; raised to [`MIN_SCAN_TIMEOUT`].
    pub timeout: Duration,
    /// Preview label.
    pub display_label: String,
}

impl ScanRequest {
    /// Request for `camera_id` with `timeout`.
    pub fn new(camera_id: u32, timeout: Duration) -> Self {
        Self {
            camera_id,
            timeout,
            display_label: "Barcode Scanner".to_string(),
        }
    }

    /// Request built from configuration.
    pub fn from_settings(settings: &ScannerSettings) -> Self {
        Self {
            camera_id: settings.camera_id,
            timeout: settings.scan_timeout(),
            display_label: settings.window_title.clone(),
        }
    }

    /// Timeout after applying the floor.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.max(MIN_SCAN_TIMEOUT)
    }
}

/// The three capabilities a scan needs, verified present.
#[derive(Clone)]
pub struct ScanBackend {
    camera: Arc<dyn CameraSource>,
    decoder: Arc<dyn Decoder>,
    preview: Arc<dyn PreviewSurface>,
}

impl ScanBackend {
    /// Check that every capability is present.
    ///
    /// Fails with [`Error::CapabilityUnavailable`] naming each missing part.
    pub fn probe(
        camera: Option<Arc<dyn CameraSource>>,
        decoder: Option<Arc<dyn Decoder>>,
        preview: Option<Arc<dyn PreviewSurface>>,
    ) -> Result<Self> {
        match (camera, decoder, preview) {
            (Some(camera), Some(decoder), Some(preview)) => Ok(Self {
                camera,
                decoder,
                preview,
            }),
            (camera, decoder, preview) => {
                let missing: Vec<&str> = [
                    (camera.is_none(), "camera capture"),
                    (decoder.is_none(), "barcode decoder"),
                    (preview.is_none(), "preview"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(Error::CapabilityUnavailable(format!(
                    "missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl fmt::Debug for ScanBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanBackend")
            .field("camera", &self.camera.name())
            .field("decoder", &self.decoder.name())
            .finish()
    }
}

/// An opened camera and preview for the duration of one scan.
///
/// Both are released when the session drops, whatever the outcome.
pub struct ScanSession {
    camera: Box<dyn Camera>,
    preview: Box<dyn Preview>,
    camera_id: u32,
    released: bool,
}

impl ScanSession {
    /// Open the camera, then the preview.
    pub fn open(backend: &ScanBackend, request: &ScanRequest) -> Result<Self> {
        let camera = backend.camera.open(request.camera_id)?;
        let preview = backend.preview.open(&request.display_label);
        Ok(Self {
            camera,
            preview,
            camera_id: request.camera_id,
            released: false,
        })
    }

    /// Read frames until a barcode decodes, the operator cancels, the
    /// camera stops delivering, or the deadline passes.
    pub fn run(&mut self, decoder: &dyn Decoder, timeout: Duration) -> Result<String> {
        let timeout = timeout.max(MIN_SCAN_TIMEOUT);
        let started = Instant::now();
        let deadline = started + timeout;
        let mut last_frame = started;

        loop {
            let Some(frame) = self.camera.read_frame() else {
                if self.preview.cancel_requested() {
                    info!("Scan cancelled by operator");
                    return Err(Error::CancelledByOperator);
                }
                if last_frame.elapsed() > MAX_FRAME_GAP {
                    warn!("Camera {} stopped delivering frames", self.camera_id);
                    return Err(Error::NoFrame);
                }
                std::thread::sleep(READ_RETRY);
                continue;
            };
            last_frame = Instant::now();

            let decoded = decoder
                .decode(&frame)
                .into_iter()
                .map(|payload| payload.trim().to_string())
                .find(|payload| !payload.is_empty());
            if let Some(value) = decoded {
                info!("Barcode read after {}ms", started.elapsed().as_millis());
                return Ok(value);
            }

            self.preview.show(&frame);
            if self.preview.cancel_requested() {
                info!("Scan cancelled by operator");
                return Err(Error::CancelledByOperator);
            }
            if Instant::now() > deadline {
                return Err(Error::Timeout(timeout.as_millis() as u64));
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.camera.release();
        self.preview.close();
        debug!("Camera {} released", self.camera_id);
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scanner with its availability decided up front.
#[derive(Debug)]
pub struct Scanner {
    settings: ScannerSettings,
    backend: std::result::Result<ScanBackend, String>,
}

impl Scanner {
    /// Scanner over a probed backend.
    pub fn new(settings: ScannerSettings, backend: Result<ScanBackend>) -> Self {
        let backend = if settings.enabled {
            backend.map_err(|e| match e {
                Error::CapabilityUnavailable(reason) => reason,
                other => other.to_string(),
            })
        } else {
            Err("scanner disabled in configuration".to_string())
        };
        if let Err(reason) = &backend {
            info!("Scanner unavailable: {}", reason);
        }
        Self { settings, backend }
    }

    /// Scanner with the built-in parts.
    ///
    /// The camera is the frame folder when `frames_dir` is set, otherwise the
    /// capture hardware compiled into this build. Frames go through Code 128
    /// then QR decoding, and the headless preview is cancelled through
    /// `token`.
    pub fn from_settings(settings: ScannerSettings, token: CancelToken) -> Self {
        let camera: Option<Arc<dyn CameraSource>> = match &settings.frames_dir {
            Some(dir) => Some(Arc::new(
                ImageFolderCamera::new(dir).for_camera(settings.camera_id),
            )),
            None => hardware_source(),
        };
        if let Some(camera) = &camera {
            debug!("Scanner camera source: {}", camera.name());
        }
        let backend = ScanBackend::probe(
            camera,
            Some(Arc::new(DecoderChain::standard())),
            Some(Arc::new(HeadlessSurface::new(token))),
        );
        Self::new(settings, backend)
    }

    /// Whether scans can run.
    pub fn is_available(&self) -> bool {
        self.backend.is_ok()
    }

    /// Why scans cannot run, if they cannot.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.backend.as_ref().err().map(String::as_str)
    }

    /// Scanner configuration.
    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Scan with the configured camera and timeout.
    pub fn scan(&self) -> Result<String> {
        self.scan_with(&ScanRequest::from_settings(&self.settings))
    }

    /// Scan with explicit parameters.
    ///
    /// Blocks the calling thread; run it on a blocking-capable worker.
    pub fn scan_with(&self, request: &ScanRequest) -> Result<String> {
        let backend = self
            .backend
            .as_ref()
            .map_err(|reason| Error::CapabilityUnavailable(reason.clone()))?;
        info!(
            "Scanning camera {} (timeout {}ms)",
            request.camera_id,
            request.effective_timeout().as_millis()
        );
        let mut session = ScanSession::open(backend, request)?;
        session.run(backend.decoder.as_ref(), request.timeout)
    }
}
