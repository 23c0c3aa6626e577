// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture flow: capture -> detect -> preview -> accept / retake.
//
// `CaptureFlow` drives the bridge and writes each new `CaptureState` into a
// `StateCell`. The screen passes its signal; tests pass a plain recorder.
// Failures are logged here and returned so the UI can show a toast; the state
// is always left on the camera view when one happens.

use std::sync::Arc;
use std::time::Duration;

use dioxus::prelude::*;
use snapcrop_bridge::traits::{CaptureDevice, PhotoConsumer, RectangleDetector};
use snapcrop_core::AppConfig;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::state::CaptureState;
use snapcrop_core::types::{AcceptedPhoto, CaptureOptions, DetectedImages};
use tracing::{debug, error, info};

/// Somewhere the flow can read and replace the screen's state.
pub trait StateCell {
    fn snapshot(&self) -> CaptureState;
    fn replace(&mut self, state: CaptureState);
}

impl StateCell for Signal<CaptureState> {
    fn snapshot(&self) -> CaptureState {
        self.read().clone()
    }

    fn replace(&mut self, state: CaptureState) {
        *self.write() = state;
    }
}

/// Orchestrates one capture screen. Cheap to clone.
#[derive(Clone)]
pub struct CaptureFlow {
    camera: Arc<dyn CaptureDevice>,
    detector: Arc<dyn RectangleDetector>,
    consumer: Arc<dyn PhotoConsumer>,
    options: CaptureOptions,
    detection_timeout: Option<Duration>,
}

impl CaptureFlow {
    pub fn new(
        camera: Arc<dyn CaptureDevice>,
        detector: Arc<dyn RectangleDetector>,
        consumer: Arc<dyn PhotoConsumer>,
        config: &AppConfig,
    ) -> Self {
        Self {
            camera,
            detector,
            consumer,
            options: config.capture,
            detection_timeout: config.detection_timeout(),
        }
    }

    /// Override the detector deadline.
    pub fn with_detection_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.detection_timeout = timeout;
        self
    }

    pub fn camera_ready(&self) -> bool {
        self.camera.is_ready()
    }

    /// Take a photo and immediately run detection on it.
    ///
    /// Does nothing while the camera is not ready.
    pub async fn request_capture(&self, cell: &mut impl StateCell) -> Result<()> {
        if !self.camera.is_ready() {
            debug!("shutter pressed before camera is ready; ignoring");
            return Ok(());
        }

        let photo = self.camera.capture_photo(self.options).await.inspect_err(|e| {
            error!(error = %e, "photo capture failed");
        })?;
        if photo.base64.is_empty() {
            error!(uri = %photo.uri, "camera returned a photo without image data");
            self.camera.release(&photo.uri);
            return Err(SnapCropError::Capture("camera returned no image data".into()));
        }
        info!(
            uri = %photo.uri,
            bytes = photo.base64.len(),
            "photo captured"
        );

        let previous = cell.snapshot();
        if !previous.photo_location().is_empty() && previous.photo_location() != photo.uri {
            self.camera.release(previous.photo_location());
        }
        cell.replace(previous.with_capture(photo));
        self.run_detection(cell).await
    }

    /// Send the current photo to the rectangle detector.
    ///
    /// On success the state moves to the preview; on failure it goes back to
    /// the camera view with the photo kept.
    pub async fn run_detection(&self, cell: &mut impl StateCell) -> Result<()> {
        let current = cell.snapshot();
        if current.content().is_empty() {
            debug!("no photo to run detection on");
            if current.is_detecting() {
                cell.replace(current.with_detection_failure(current.ticket()));
            }
            return Ok(());
        }
        let pending = if current.is_detecting() {
            current
        } else {
            let pending = current.awaiting_detection();
            cell.replace(pending.clone());
            pending
        };
        let ticket = pending.ticket();

        match self.detect(pending.content().to_string()).await {
            Ok(images) => {
                info!(%ticket, has_crop = images.cropped.is_some(), "showing preview");
                cell.replace(cell.snapshot().with_detection(ticket, images));
                Ok(())
            }
            Err(e) => {
                error!(%ticket, error = %e, "rectangle detection failed");
                cell.replace(cell.snapshot().with_detection_failure(ticket));
                Err(e)
            }
        }
    }

    /// Drop the photo and go back to the camera view.
    pub fn discard_photo(&self, cell: &mut impl StateCell) {
        let current = cell.snapshot();
        if !current.photo_location().is_empty() {
            self.camera.release(current.photo_location());
        }
        debug!("photo discarded");
        cell.replace(current.discard());
    }

    /// Hand the previewed photo to the downstream consumer.
    pub fn accept_photo(&self, state: &CaptureState) -> Result<AcceptedPhoto> {
        let photo = state.accepted().ok_or(SnapCropError::NothingToAccept)?;
        self.consumer.accept(photo.clone()).inspect_err(|e| {
            error!(error = %e, "photo hand-off failed");
        })?;
        Ok(photo)
    }

    async fn detect(&self, content: String) -> Result<DetectedImages> {
        let detection = self.detector.detect(content);
        match self.detection_timeout {
            Some(limit) => tokio::time::timeout(limit, detection)
                .await
                .map_err(|_| SnapCropError::DetectionTimedOut(limit))?,
            None => detection.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use snapcrop_bridge::callback::{
        ErrorCallback, ErrorFirstCallback, ErrorFirstDetector, ErrorFirstModule, InFlight,
        SplitCallbackDetector, SplitCallbackModule, SuccessCallback,
    };
    use snapcrop_core::FlowPhase;
    use snapcrop_core::types::CapturedPhoto;

    use super::*;
    use crate::services::handoff::HandoffInbox;

    /// Records every state written by the flow.
    #[derive(Default)]
    struct Recorder {
        state: CaptureState,
        history: Vec<CaptureState>,
    }

    impl StateCell for Recorder {
        fn snapshot(&self) -> CaptureState {
            self.state.clone()
        }

        fn replace(&mut self, state: CaptureState) {
            self.history.push(state.clone());
            self.state = state;
        }
    }

    enum CameraScript {
        Photo(&'static str, &'static str),
        Denied,
        NotReady,
    }

    struct FakeCamera {
        script: CameraScript,
        calls: Mutex<u32>,
        released: Mutex<Vec<String>>,
    }

    impl FakeCamera {
        fn new(script: CameraScript) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(0),
                released: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }

        fn released(&self) -> Vec<String> {
            self.released.lock().unwrap().clone()
        }
    }

    impl CaptureDevice for FakeCamera {
        fn is_ready(&self) -> bool {
            !matches!(self.script, CameraScript::NotReady)
        }

        fn capture_photo(&self, options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>> {
            *self.calls.lock().unwrap() += 1;
            assert_eq!(options, CaptureOptions::default());
            let result = match self.script {
                CameraScript::Photo(b64, uri) => Ok(CapturedPhoto::new(b64, uri)),
                CameraScript::Denied => Err(SnapCropError::CameraPermissionDenied),
                CameraScript::NotReady => Err(SnapCropError::CameraUnavailable),
            };
            Box::pin(async move { result })
        }

        fn release(&self, uri: &str) {
            self.released.lock().unwrap().push(uri.to_string());
        }
    }

    /// Android-shaped native module.
    struct SplitModule(Option<&'static str>);

    impl SplitCallbackModule for SplitModule {
        fn check_for_rectangle(&self, image: String, on_error: ErrorCallback, on_success: SuccessCallback) -> InFlight {
            assert_eq!(image, "AAA");
            match self.0 {
                None => on_success(vec![Some("ORIGIN_B64".into()), Some("CROP_B64".into())]),
                Some(msg) => on_error(msg.into()),
            }
            InFlight::done()
        }
    }

    /// iOS-shaped native module.
    struct ErrorFirst(Option<&'static str>);

    impl ErrorFirstModule for ErrorFirst {
        fn check_for_rectangle(&self, image: String, callback: ErrorFirstCallback) -> InFlight {
            assert_eq!(image, "AAA");
            match self.0 {
                None => callback(None, vec![vec![Some("ORIGIN_B64".into()), Some("CROP_B64".into())]]),
                Some(msg) => callback(Some(msg.into()), Vec::new()),
            }
            InFlight::done()
        }
    }

    /// Never answers but keeps its callbacks alive.
    #[derive(Default)]
    struct Silent(Mutex<Vec<ErrorFirstCallback>>);

    impl ErrorFirstModule for Silent {
        fn check_for_rectangle(&self, _image: String, callback: ErrorFirstCallback) -> InFlight {
            self.0.lock().unwrap().push(callback);
            InFlight::done()
        }
    }

    fn flow(camera: Arc<FakeCamera>, detector: Arc<dyn RectangleDetector>) -> (CaptureFlow, Arc<HandoffInbox>) {
        let inbox = Arc::new(HandoffInbox::new());
        let flow = CaptureFlow::new(camera, detector, inbox.clone(), &AppConfig::default());
        (flow, inbox)
    }

    fn happy_camera() -> Arc<FakeCamera> {
        FakeCamera::new(CameraScript::Photo("AAA", "file:///p.jpg"))
    }

    fn detectors(error: Option<&'static str>) -> Vec<Arc<dyn RectangleDetector>> {
        vec![
            Arc::new(SplitCallbackDetector::new(SplitModule(error))),
            Arc::new(ErrorFirstDetector::new(ErrorFirst(error))),
        ]
    }

    #[tokio::test]
    async fn capture_then_detect_previews_for_both_conventions() {
        for detector in detectors(None) {
            let (flow, _) = flow(happy_camera(), detector);
            let mut cell = Recorder::default();

            flow.request_capture(&mut cell).await.unwrap();

            let state = cell.snapshot();
            assert_eq!(state.content(), "AAA");
            assert_eq!(state.origin(), "ORIGIN_B64");
            assert_eq!(state.cropped(), "CROP_B64");
            assert!(state.is_previewing());
            assert_eq!(state.photo_location(), "file:///p.jpg");

            // Detecting was visible in between, with the old output cleared.
            assert_eq!(cell.history[0].phase(), FlowPhase::Detecting);
            assert_eq!(cell.history[0].origin(), "");
        }
    }

    #[tokio::test]
    async fn detection_failure_keeps_photo_and_reports() {
        for detector in detectors(Some("no rectangle")) {
            let (flow, _) = flow(happy_camera(), detector);
            let mut cell = Recorder::default();

            let err = flow.request_capture(&mut cell).await.unwrap_err();
            assert!(matches!(err, SnapCropError::Detection(_)));

            let state = cell.snapshot();
            assert_eq!(state.content(), "AAA");
            assert_eq!(state.origin(), "");
            assert_eq!(state.cropped(), "");
            assert!(!state.is_previewing());
            assert_eq!(state.phase(), FlowPhase::Capturing);
            assert_eq!(state.photo_location(), "file:///p.jpg");
        }
    }

    #[tokio::test]
    async fn discard_from_preview_resets_everything() {
        let (flow, _) = flow(happy_camera(), detectors(None).remove(0));
        let mut cell = Recorder::default();
        flow.request_capture(&mut cell).await.unwrap();

        flow.discard_photo(&mut cell);
        assert_eq!(cell.snapshot(), CaptureState::new());
        flow.discard_photo(&mut cell);
        assert_eq!(cell.snapshot(), CaptureState::new());
    }

    #[tokio::test]
    async fn not_ready_camera_is_a_no_op() {
        let camera = FakeCamera::new(CameraScript::NotReady);
        let (flow, _) = flow(camera.clone(), detectors(None).remove(0));
        let mut cell = Recorder::default();

        flow.request_capture(&mut cell).await.unwrap();
        assert_eq!(camera.calls(), 0);
        assert!(cell.history.is_empty());
    }

    #[tokio::test]
    async fn capture_failure_leaves_state_untouched() {
        let (flow, _) = flow(FakeCamera::new(CameraScript::Denied), detectors(None).remove(0));
        let mut cell = Recorder::default();

        let err = flow.request_capture(&mut cell).await.unwrap_err();
        assert!(matches!(err, SnapCropError::CameraPermissionDenied));
        assert!(cell.history.is_empty());
        assert_eq!(cell.snapshot().phase(), FlowPhase::Capturing);
    }

    #[tokio::test]
    async fn hung_detector_times_out() {
        let detector: Arc<dyn RectangleDetector> = Arc::new(ErrorFirstDetector::new(Silent::default()));
        let (flow, _) = flow(happy_camera(), detector);
        let flow = flow.with_detection_timeout(Some(Duration::from_millis(20)));
        let mut cell = Recorder::default();

        let err = flow.request_capture(&mut cell).await.unwrap_err();
        assert!(matches!(err, SnapCropError::DetectionTimedOut(limit) if limit == Duration::from_millis(20)));
        assert_eq!(cell.snapshot().phase(), FlowPhase::Capturing);
        assert_eq!(cell.snapshot().content(), "AAA");
    }

    #[tokio::test]
    async fn run_detection_retries_kept_photo() {
        let (failing, _) = flow(happy_camera(), detectors(Some("blurry")).remove(0));
        let mut cell = Recorder::default();
        assert!(failing.request_capture(&mut cell).await.is_err());

        let (working, _) = flow(happy_camera(), detectors(None).remove(0));
        working.run_detection(&mut cell).await.unwrap();
        assert!(cell.snapshot().is_previewing());
        assert_eq!(cell.snapshot().photo_location(), "file:///p.jpg");
    }

    #[tokio::test]
    async fn run_detection_without_photo_does_nothing() {
        let (flow, _) = flow(happy_camera(), detectors(None).remove(0));
        let mut cell = Recorder::default();
        flow.run_detection(&mut cell).await.unwrap();
        assert!(cell.history.is_empty());
    }

    #[tokio::test]
    async fn accept_hands_off_previewed_photo() {
        let (flow, inbox) = flow(happy_camera(), detectors(None).remove(0));
        let mut cell = Recorder::default();

        let err = flow.accept_photo(&cell.snapshot()).unwrap_err();
        assert!(matches!(err, SnapCropError::NothingToAccept));

        flow.request_capture(&mut cell).await.unwrap();
        let accepted = flow.accept_photo(&cell.snapshot()).unwrap();
        assert_eq!(accepted.cropped, "CROP_B64");
        assert_eq!(inbox.latest().unwrap().photo_location, "file:///p.jpg");
    }

    #[tokio::test]
    async fn photo_without_image_data_returns_to_camera() {
        let camera = FakeCamera::new(CameraScript::Photo("", "file:///p.jpg"));
        let (flow, _) = flow(camera.clone(), detectors(None).remove(0));
        let mut cell = Recorder::default();

        let err = flow.request_capture(&mut cell).await.unwrap_err();
        assert!(matches!(err, SnapCropError::Capture(_)));
        assert_eq!(cell.snapshot().phase(), FlowPhase::Capturing);
        assert!(cell.history.is_empty());
        assert_eq!(camera.released(), vec!["file:///p.jpg".to_string()]);
        assert_eq!(err.kind(), snapcrop_core::error::FailureKind::Capture);
    }

    #[tokio::test]
    async fn detecting_without_content_falls_back_to_camera() {
        let (flow, _) = flow(happy_camera(), detectors(None).remove(0));
        let mut cell = Recorder {
            state: CaptureState::new().with_capture(CapturedPhoto::new("", "file:///p.jpg")),
            history: Vec::new(),
        };
        assert!(cell.snapshot().is_detecting());

        flow.run_detection(&mut cell).await.unwrap();
        assert_eq!(cell.snapshot().phase(), FlowPhase::Capturing);
    }

    #[tokio::test]
    async fn discard_releases_the_photo() {
        let camera = happy_camera();
        let (flow, _) = flow(camera.clone(), detectors(None).remove(0));
        let mut cell = Recorder::default();
        flow.request_capture(&mut cell).await.unwrap();

        flow.discard_photo(&mut cell);
        flow.discard_photo(&mut cell);
        assert_eq!(camera.released(), vec!["file:///p.jpg".to_string()]);
    }

    #[tokio::test]
    async fn recapture_releases_the_previous_photo() {
        let camera = happy_camera();
        let (flow, _) = flow(camera.clone(), detectors(None).remove(0));
        let mut cell = Recorder {
            state: CaptureState::new().with_capture(CapturedPhoto::new("OLD", "file:///old.jpg")),
            history: Vec::new(),
        };

        flow.request_capture(&mut cell).await.unwrap();
        assert_eq!(camera.released(), vec!["file:///old.jpg".to_string()]);
        assert_eq!(cell.snapshot().photo_location(), "file:///p.jpg");
    }
}
