//! Camera capture backed by the nokhwa crate.
//!
//! Frames are captured on a background thread into a small ring of buffers;
//! the session polls for the latest complete frame. Stopping (explicitly or
//! via `Drop`) joins the thread and releases the device.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;

use super::{CameraFrame, FrameSource, SourceFactory};

/// Camera-backed frame source for one session.
pub struct CameraCapture {
    /// Latest captured frames - triple buffered
    frames: [Arc<Mutex<Option<CameraFrame>>>; 3],
    /// Index of the latest complete frame
    latest_frame_idx: Arc<AtomicU64>,
    /// Whether capture is running
    running: Arc<AtomicBool>,
    /// Capture thread handle
    thread_handle: Option<std::thread::JoinHandle<()>>,
    /// Frame counter
    frame_count: Arc<AtomicU64>,
    /// Highest frame number already handed to the session
    last_taken: Option<u64>,
}

impl CameraCapture {
    /// Open a camera and start the capture thread.
    ///
    /// # Arguments
    /// * `camera_index` - The camera index to use (0 for default)
    /// * `width`/`height` - Requested frame size
    /// * `mirror` - Flip frames horizontally (selfie view)
    pub fn new(camera_index: u32, width: u32, height: u32, mirror: bool) -> Result<Self, String> {
        let frames: [Arc<Mutex<Option<CameraFrame>>>; 3] = [
            Arc::new(Mutex::new(None)),
            Arc::new(Mutex::new(None)),
            Arc::new(Mutex::new(None)),
        ];
        let latest_frame_idx = Arc::new(AtomicU64::new(0));
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));

        // Clone for the capture thread
        let frames_clone = frames.clone();
        let latest_frame_idx_clone = latest_frame_idx.clone();
        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();

        let thread_handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                Self::capture_thread(
                    camera_index,
                    width,
                    height,
                    mirror,
                    frames_clone,
                    latest_frame_idx_clone,
                    running_clone,
                    frame_count_clone,
                );
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        Ok(Self {
            frames,
            latest_frame_idx,
            running,
            thread_handle: Some(thread_handle),
            frame_count,
            last_taken: None,
        })
    }

    /// Camera capture thread
    fn capture_thread(
        camera_index: u32,
        width: u32,
        height: u32,
        mirror: bool,
        frames: [Arc<Mutex<Option<CameraFrame>>>; 3],
        latest_frame_idx: Arc<AtomicU64>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        log::info!("Starting camera capture thread (camera {})", camera_index);

        let index = CameraIndex::Index(camera_index);

        // Ask for the requested resolution first, then fall back.
        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
            nokhwa::utils::Resolution::new(width, height),
        ));

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera at {}x{}: {:?}", width, height, e);

                // Last resort: let the backend pick the format
                let fallback = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                match Camera::new(index, fallback) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::error!("Failed to open camera with all format attempts: {:?}", e2);
                        running.store(false, Ordering::Release);
                        return;
                    }
                }
            }
        };

        if let Err(e) = camera.open_stream() {
            log::error!("Failed to open camera stream: {:?}", e);
            running.store(false, Ordering::Release);
            return;
        }

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        let mut write_idx: u64 = 0;

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(frame) => match frame.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        let frame_num = frame_count.fetch_add(1, Ordering::Relaxed);

                        let mut camera_frame = CameraFrame {
                            data: image.into_raw(),
                            width: frame.resolution().width(),
                            height: frame.resolution().height(),
                            frame_number: frame_num,
                            timestamp: Instant::now(),
                        };
                        if mirror {
                            camera_frame.flip_horizontal();
                        }

                        let slot = (write_idx % 3) as usize;
                        *frames[slot].lock() = Some(camera_frame);

                        latest_frame_idx.store(write_idx, Ordering::Release);
                        write_idx = write_idx.wrapping_add(1);
                    }
                    Err(e) => {
                        log::warn!("Failed to decode frame: {:?}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }

        running.store(false, Ordering::Release);
        log::info!("Camera capture thread stopped");
    }

    /// Get the latest captured frame regardless of novelty.
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        let idx = self.latest_frame_idx.load(Ordering::Acquire);
        let slot = (idx % 3) as usize;
        self.frames[slot].lock().clone()
    }

    /// Total frames captured so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Stop capturing and release the device.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Option<CameraFrame> {
        let frame = self.latest_frame()?;
        if self.last_taken == Some(frame.frame_number) {
            return None;
        }
        self.last_taken = Some(frame.frame_number);
        Some(frame)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Opens one [`CameraCapture`] per connecting session, mirroring the
/// original per-connection device acquisition.
pub struct CameraSourceFactory {
    camera_index: u32,
    width: u32,
    height: u32,
    mirror: bool,
}

impl CameraSourceFactory {
    pub fn new(camera_index: u32, width: u32, height: u32, mirror: bool) -> Self {
        Self {
            camera_index,
            width,
            height,
            mirror,
        }
    }
}

impl SourceFactory for CameraSourceFactory {
    fn open(&self) -> Result<Box<dyn FrameSource>, String> {
        CameraCapture::new(self.camera_index, self.width, self.height, self.mirror)
            .map(|capture| Box::new(capture) as Box<dyn FrameSource>)
    }
}
