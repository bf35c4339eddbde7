use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use splatcap_3d::camera::CameraIntrinsics;
use splatcap_3d::io::colmap::{
    create_camera, create_directory_structure, create_images_from_viewpoints, depth_dir,
    format_image_index, image_name, images_dir, sparse_dir, write_colmap_dataset,
    DEFAULT_IMAGE_PREFIX, IMAGE_INDEX_DIGITS,
};
use splatcap_3d::io::ply::{write_pointcloud_ply, PlyEncoding};
use splatcap_3d::pointcloud::PointCloud;
use splatcap_3d::trajectory::{generate_viewpoints, TrajectoryConfig, Viewpoint};
use splatcap_3d::transforms::Transform;
use splatcap_depth::encode::save_depth;
use splatcap_depth::extract::extract_depth;

use super::{CaptureConfig, CaptureError, ImageFormat};

/// Lifecycle of a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No capture running.
    #[default]
    Idle,
    /// Generating viewpoints and preparing the output directory.
    Preparing,
    /// Capturing frames.
    Capturing,
    /// Writing the sparse model and point cloud.
    Exporting,
    /// Finished, see [`CaptureResult`].
    Complete,
    /// Aborted with a message.
    Error(String),
}

/// One rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGB pixels.
    pub pixels: Vec<[u8; 3]>,
    /// Row-major reversed-Z depth samples, when depth was requested.
    pub depth: Option<Vec<f32>>,
}

/// The renderer side of a capture: produces frames and compresses color images.
pub trait CaptureBackend {
    /// Render the scene from a viewpoint.
    ///
    /// # Arguments
    ///
    /// * `viewpoint` - Camera pose in the engine frame.
    /// * `width` - Image width in pixels.
    /// * `height` - Image height in pixels.
    /// * `with_depth` - Whether to read back the depth buffer as well.
    fn capture_frame(
        &mut self,
        viewpoint: &Viewpoint,
        width: u32,
        height: u32,
        with_depth: bool,
    ) -> Result<CapturedFrame, CaptureError>;

    /// Compress and write the color pixels of a frame.
    fn save_color_image(
        &mut self,
        frame: &CapturedFrame,
        path: &Path,
        format: ImageFormat,
        jpeg_quality: u8,
    ) -> Result<(), CaptureError>;
}

/// Notifications emitted while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A frame was processed.
    Progress {
        /// Frames processed so far.
        current: usize,
        /// Total number of frames.
        total: usize,
        /// `current / total` in percent.
        percent: f32,
    },
    /// A frame could not be captured or saved.
    FrameError {
        /// Index of the frame.
        frame_index: usize,
        /// What went wrong.
        message: String,
    },
    /// The session ended.
    Complete {
        /// Whether the dataset was exported without errors.
        success: bool,
    },
}

/// Summary of a capture session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureResult {
    /// Whether the capture completed without errors.
    pub success: bool,
    /// Color images saved.
    pub frames_captured: usize,
    /// Depth maps saved.
    pub depth_maps_captured: usize,
    /// Dataset root.
    pub output_path: PathBuf,
    /// Time from start to export.
    pub total_capture_time: Duration,
    /// Fatal problems.
    pub errors: Vec<String>,
    /// Non-fatal problems.
    pub warnings: Vec<String>,
}

/// Drives a [`CaptureBackend`] along a trajectory and exports the dataset.
pub struct CaptureSession<B: CaptureBackend> {
    backend: B,
    config: CaptureConfig,
    state: CaptureState,
    viewpoints: Vec<Viewpoint>,
    intrinsics: CameraIntrinsics,
    current_index: usize,
    result: CaptureResult,
    events: Option<Sender<CaptureEvent>>,
    started_at: Option<Instant>,
}

impl<B: CaptureBackend> CaptureSession<B> {
    /// Create an idle session around a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: CaptureConfig::default(),
            state: CaptureState::Idle,
            viewpoints: Vec::new(),
            intrinsics: CameraIntrinsics::default(),
            current_index: 0,
            result: CaptureResult::default(),
            events: None,
            started_at: None,
        }
    }

    /// Send [`CaptureEvent`]s to a channel.
    pub fn with_events(mut self, sender: Sender<CaptureEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Current state.
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Fraction of frames processed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.viewpoints.is_empty() {
            return 0.0;
        }
        self.current_index as f32 / self.viewpoints.len() as f32
    }

    /// Summary so far. Final once the state is [`CaptureState::Complete`].
    pub fn result(&self) -> &CaptureResult {
        &self.result
    }

    /// Viewpoints of the running capture.
    pub fn viewpoints(&self) -> &[Viewpoint] {
        &self.viewpoints
    }

    /// Intrinsics shared by every frame.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// The backend, e.g. to inspect what it rendered.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn emit(&self, event: CaptureEvent) {
        if let Some(sender) = &self.events {
            // a dropped receiver only means nobody listens anymore
            sender.send(event).ok();
        }
    }

    fn abort(&mut self, error: CaptureError) -> CaptureError {
        log::error!("capture failed: {error}");
        self.result.errors.push(error.to_string());
        self.state = CaptureState::Error(error.to_string());
        error
    }

    /// Validate the configuration, generate viewpoints and prepare the output directory.
    ///
    /// On success the session is in [`CaptureState::Capturing`].
    pub fn start(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::InvalidState(self.state.clone()));
        }

        let report = config.validate();
        for warning in &report.warnings {
            log::warn!("config validation: {warning}");
        }

        self.result = CaptureResult {
            output_path: config.output_directory.clone(),
            warnings: report.warnings.clone(),
            ..Default::default()
        };
        self.current_index = 0;
        self.started_at = Some(Instant::now());
        self.state = CaptureState::Preparing;

        if !report.valid {
            let message = report.warnings.join("; ");
            return Err(self.abort(CaptureError::InvalidConfig(message)));
        }

        self.viewpoints = generate_viewpoints(&config.trajectory);
        if self.viewpoints.is_empty() {
            return Err(self.abort(CaptureError::NoViewpoints));
        }
        log::info!("generated {} viewpoints for capture", self.viewpoints.len());

        self.intrinsics =
            CameraIntrinsics::from_fov(config.image_width, config.image_height, config.field_of_view);

        if let Err(e) = create_directory_structure(&config.output_directory) {
            return Err(self.abort(e.into()));
        }

        self.config = config;
        self.state = CaptureState::Capturing;
        Ok(())
    }

    /// Capture the next frame, exporting the dataset after the last one.
    ///
    /// Frame failures are recorded and reported as [`CaptureEvent::FrameError`] without
    /// stopping the session.
    ///
    /// # Returns
    ///
    /// Whether frames remain to be captured.
    pub fn process_next_frame(&mut self) -> Result<bool, CaptureError> {
        if self.state != CaptureState::Capturing {
            return Err(CaptureError::InvalidState(self.state.clone()));
        }

        let index = self.current_index;
        if let Some(viewpoint) = self.viewpoints.get(index).cloned() {
            if let Err(e) = self.capture_viewpoint(index, &viewpoint) {
                log::warn!("frame {index} failed: {e}");
                self.emit(CaptureEvent::FrameError {
                    frame_index: index,
                    message: e.to_string(),
                });
            }

            self.current_index += 1;
            let total = self.viewpoints.len();
            self.emit(CaptureEvent::Progress {
                current: self.current_index,
                total,
                percent: 100.0 * self.current_index as f32 / total as f32,
            });
        }

        if self.current_index >= self.viewpoints.len() {
            self.finish();
            return Ok(false);
        }
        Ok(true)
    }

    fn capture_viewpoint(&mut self, index: usize, viewpoint: &Viewpoint) -> Result<(), CaptureError> {
        let frame = self.backend.capture_frame(
            viewpoint,
            self.config.image_width,
            self.config.image_height,
            self.config.capture_depth,
        )?;

        let expected = (frame.width as usize)
            .checked_mul(frame.height as usize)
            .ok_or_else(|| {
                CaptureError::Backend(format!(
                    "frame dimensions {}x{} overflow",
                    frame.width, frame.height
                ))
            })?;
        if frame.pixels.len() != expected {
            return Err(CaptureError::Backend(format!(
                "frame has {} pixels, expected {expected}",
                frame.pixels.len()
            )));
        }

        let image_path = images_dir(&self.config.output_directory).join(image_name(
            DEFAULT_IMAGE_PREFIX,
            index,
            self.config.image_format.extension(),
        ));
        self.backend.save_color_image(
            &frame,
            &image_path,
            self.config.image_format,
            self.config.jpeg_quality,
        )?;
        self.result.frames_captured += 1;

        if let (true, Some(raw)) = (self.config.capture_depth, &frame.depth) {
            let depth = extract_depth(
                raw,
                frame.width as usize,
                frame.height as usize,
                &self.config.depth,
            )?;
            let depth_path = depth_dir(&self.config.output_directory).join(format!(
                "depth_{}.{}",
                format_image_index(index, IMAGE_INDEX_DIGITS),
                self.config.depth.format.extension()
            ));
            save_depth(&depth, depth_path, self.config.depth.format)?;
            self.result.depth_maps_captured += 1;
        }

        Ok(())
    }

    /// Capture every remaining frame, pausing `capture_delay` seconds between frames.
    pub fn run(&mut self) -> Result<CaptureResult, CaptureError> {
        let delay = Duration::from_secs_f64(self.config.capture_delay.max(0.0));
        while self.process_next_frame()? {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
        Ok(self.result.clone())
    }

    /// Cancel a running capture and return to [`CaptureState::Idle`].
    pub fn stop(&mut self) {
        if self.state == CaptureState::Idle {
            return;
        }
        self.result.success = false;
        self.result.errors.push("Capture cancelled by user".to_string());
        self.state = CaptureState::Idle;
        log::info!("capture cancelled after {} frames", self.current_index);
        self.emit(CaptureEvent::Complete { success: false });
    }

    fn finish(&mut self) {
        self.state = CaptureState::Exporting;
        self.result.total_capture_time = self
            .started_at
            .map(|start| start.elapsed())
            .unwrap_or_default();

        if let Err(e) = self.export_colmap() {
            log::error!("COLMAP export failed: {e}");
            self.result
                .warnings
                .push("Failed to export some COLMAP data".to_string());
        }

        if self.config.export_point_cloud {
            if let Err(e) = self.export_point_cloud() {
                log::error!("point cloud export failed: {e}");
                self.result
                    .warnings
                    .push("Failed to export point cloud".to_string());
            }
        }

        self.state = CaptureState::Complete;
        self.result.success = self.result.errors.is_empty();
        log::info!(
            "capture complete: {} frames, {} depth maps in {:.1}s",
            self.result.frames_captured,
            self.result.depth_maps_captured,
            self.result.total_capture_time.as_secs_f64()
        );
        self.emit(CaptureEvent::Complete {
            success: self.result.success,
        });
    }

    fn export_colmap(&self) -> Result<PathBuf, CaptureError> {
        let cameras = vec![create_camera(&self.intrinsics, 1)];
        let images = create_images_from_viewpoints(
            &self.viewpoints,
            &self.intrinsics,
            DEFAULT_IMAGE_PREFIX,
            self.config.image_format.extension(),
        );
        let sparse = write_colmap_dataset(
            &self.config.output_directory,
            &cameras,
            &images,
            &[],
            self.config.colmap_format,
        )?;
        Ok(sparse)
    }

    fn export_point_cloud(&self) -> Result<(), CaptureError> {
        let cloud = PointCloud::from_viewpoints(&self.viewpoints, self.config.trajectory.focus_point);
        let path = sparse_dir(&self.config.output_directory).join("points3D.ply");
        write_pointcloud_ply(path, &cloud, PlyEncoding::BinaryLittleEndian)?;
        Ok(())
    }
}

/// Camera poses a trajectory would visit, without capturing anything.
pub fn preview_trajectory(config: &TrajectoryConfig) -> Vec<Transform> {
    generate_viewpoints(config)
        .iter()
        .map(Viewpoint::transform)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[derive(Default)]
    struct FlatBackend {
        saved: Vec<PathBuf>,
        fail_on: Option<usize>,
        calls: usize,
    }

    impl CaptureBackend for FlatBackend {
        fn capture_frame(
            &mut self,
            _viewpoint: &Viewpoint,
            width: u32,
            height: u32,
            with_depth: bool,
        ) -> Result<CapturedFrame, CaptureError> {
            self.calls += 1;
            if self.fail_on == Some(self.calls - 1) {
                return Err(CaptureError::Backend("render target lost".to_string()));
            }
            let n = (width * height) as usize;
            Ok(CapturedFrame {
                width,
                height,
                pixels: vec![[128, 128, 128]; n],
                depth: with_depth.then(|| vec![0.5; n]),
            })
        }

        fn save_color_image(
            &mut self,
            _frame: &CapturedFrame,
            path: &Path,
            _format: ImageFormat,
            _jpeg_quality: u8,
        ) -> Result<(), CaptureError> {
            std::fs::write(path, b"")?;
            self.saved.push(path.to_path_buf());
            Ok(())
        }
    }

    fn config(root: &Path) -> CaptureConfig {
        let mut config = CaptureConfig {
            output_directory: root.to_path_buf(),
            image_width: 8,
            image_height: 6,
            capture_delay: 0.0,
            ..Default::default()
        };
        config.trajectory.num_rings = 1;
        config.trajectory.views_per_ring = 4;
        config
    }

    #[test]
    fn test_state_transitions() -> Result<(), CaptureError> {
        let dir = tempfile::tempdir()?;
        let mut session = CaptureSession::new(FlatBackend::default());
        assert_eq!(session.state(), &CaptureState::Idle);
        assert!(matches!(
            session.process_next_frame(),
            Err(CaptureError::InvalidState(CaptureState::Idle))
        ));

        session.start(config(dir.path()))?;
        assert_eq!(session.state(), &CaptureState::Capturing);
        assert_eq!(session.viewpoints().len(), 4);
        assert!(matches!(
            session.start(config(dir.path())),
            Err(CaptureError::InvalidState(CaptureState::Capturing))
        ));

        assert!(session.process_next_frame()?);
        assert_eq!(session.progress(), 0.25);

        session.stop();
        assert_eq!(session.state(), &CaptureState::Idle);
        assert!(!session.result().success);
        assert_eq!(session.result().errors, vec!["Capture cancelled by user".to_string()]);
        Ok(())
    }

    #[test]
    fn test_run_with_events() -> Result<(), CaptureError> {
        let dir = tempfile::tempdir()?;
        let (tx, rx) = mpsc::channel();
        let backend = FlatBackend {
            fail_on: Some(2),
            ..Default::default()
        };
        let mut session = CaptureSession::new(backend).with_events(tx);
        session.start(config(dir.path()))?;
        let result = session.run()?;

        assert_eq!(session.state(), &CaptureState::Complete);
        assert!(result.success);
        assert_eq!(result.frames_captured, 3);
        assert_eq!(result.depth_maps_captured, 3);
        assert_eq!(session.backend().saved.len(), 3);
        assert!(dir.path().join("depth/depth_00000.depth.raw").is_file());
        assert!(dir.path().join("sparse/0/points3D.ply").is_file());

        let events = rx.try_iter().collect::<Vec<_>>();
        assert!(events.contains(&CaptureEvent::FrameError {
            frame_index: 2,
            message: "Capture backend error: render target lost".to_string(),
        }));
        assert_eq!(
            events.last(),
            Some(&CaptureEvent::Complete { success: true })
        );
        let progress = events
            .iter()
            .filter(|e| matches!(e, CaptureEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 4);
        Ok(())
    }

    struct OversizedBackend;

    impl CaptureBackend for OversizedBackend {
        fn capture_frame(
            &mut self,
            _viewpoint: &Viewpoint,
            _width: u32,
            _height: u32,
            _with_depth: bool,
        ) -> Result<CapturedFrame, CaptureError> {
            Ok(CapturedFrame {
                width: u32::MAX,
                height: u32::MAX,
                pixels: Vec::new(),
                depth: None,
            })
        }

        fn save_color_image(
            &mut self,
            _frame: &CapturedFrame,
            _path: &Path,
            _format: ImageFormat,
            _jpeg_quality: u8,
        ) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    #[test]
    fn test_oversized_frames_are_frame_errors() -> Result<(), CaptureError> {
        let dir = tempfile::tempdir()?;
        let (tx, rx) = mpsc::channel();
        let mut session = CaptureSession::new(OversizedBackend).with_events(tx);
        session.start(config(dir.path()))?;
        let result = session.run()?;

        assert_eq!(result.frames_captured, 0);
        let frame_errors = rx
            .try_iter()
            .filter(|e| matches!(e, CaptureEvent::FrameError { .. }))
            .count();
        assert_eq!(frame_errors, 4);
        Ok(())
    }

    #[test]
    fn test_start_rejects_bad_depth_planes() -> Result<(), CaptureError> {
        let dir = tempfile::tempdir()?;
        let mut config = config(dir.path());
        config.depth.near_plane = 1000.0;
        config.depth.far_plane = 10.0;

        let mut session = CaptureSession::new(FlatBackend::default());
        let result = session.start(config);
        assert!(matches!(result, Err(CaptureError::InvalidConfig(_))));
        assert!(matches!(session.state(), CaptureState::Error(_)));
        Ok(())
    }

    #[test]
    fn test_start_invalid_config() {
        let mut session = CaptureSession::new(FlatBackend::default());
        let result = session.start(CaptureConfig::default());
        assert!(matches!(result, Err(CaptureError::InvalidConfig(_))));
        assert!(matches!(session.state(), CaptureState::Error(_)));
        assert_eq!(session.result().errors.len(), 1);
    }

    #[test]
    fn test_preview_trajectory() {
        let config = TrajectoryConfig {
            num_rings: 2,
            views_per_ring: 3,
            ..Default::default()
        };
        assert_eq!(preview_trajectory(&config).len(), 6);
    }
}
