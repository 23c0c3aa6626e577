// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS platform bridge over a plain C ABI.
//
// The Swift host owns the camera session and the rectangle-detection module.
// At launch it registers one request hook for each with
// `snapcrop_register_camera` / `snapcrop_register_detector`. Rust calls a hook
// with a request handle; Swift answers on any thread through
// `snapcrop_camera_complete` / `snapcrop_detector_complete`.
//
// Detection follows the error-first convention: `error` is null on success
// and `data_json` is a JSON array whose first element is `[origin, cropped]`
// (`cropped` may be null). It is normalized by `ErrorFirstDetector`.
//
// Strings passed into Rust are borrowed for the duration of the call only.

#![cfg(target_os = "ios")]

use std::ffi::{CStr, CString, c_char};
use std::sync::{Arc, LazyLock, OnceLock};

use futures::future::BoxFuture;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::{CaptureOptions, CapturedPhoto};
use tokio::sync::oneshot;

use crate::callback::{ErrorFirstCallback, ErrorFirstDetector, ErrorFirstModule, InFlight};
use crate::pending::CallbackRegistry;
use crate::traits::*;

/// `void (*)(uint64_t handle, float quality, bool base64)`
pub type CameraRequestFn = extern "C" fn(handle: u64, quality: f32, encode_base64: bool);
/// `void (*)(uint64_t handle, const char *image_base64)`
pub type DetectorRequestFn = extern "C" fn(handle: u64, image_base64: *const c_char);

static CAMERA_HOOK: OnceLock<CameraRequestFn> = OnceLock::new();
static DETECTOR_HOOK: OnceLock<DetectorRequestFn> = OnceLock::new();

type CaptureReply = oneshot::Sender<Result<CapturedPhoto>>;

static CAPTURES: LazyLock<CallbackRegistry<CaptureReply>> = LazyLock::new(CallbackRegistry::new);
static DETECTIONS: LazyLock<CallbackRegistry<ErrorFirstCallback>> =
    LazyLock::new(CallbackRegistry::new);

/// Swift error string meaning the user closed the camera without a photo.
const CANCELLED: &str = "cancelled";
/// Swift error string meaning camera access was refused.
const PERMISSION_DENIED: &str = "permission-denied";

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// iOS implementation of the SnapCrop platform bridge.
pub struct IosBridge {
    camera: Arc<IosCamera>,
    detector: Arc<ErrorFirstDetector<SwiftRectangleModule>>,
}

impl IosBridge {
    pub fn new() -> Self {
        Self {
            camera: Arc::new(IosCamera),
            detector: Arc::new(ErrorFirstDetector::new(SwiftRectangleModule)),
        }
    }
}

impl Default for IosBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for IosBridge {
    fn platform_name(&self) -> &str {
        "iOS"
    }

    fn camera(&self) -> Arc<dyn CaptureDevice> {
        self.camera.clone()
    }

    fn detector(&self) -> Arc<dyn RectangleDetector> {
        self.detector.clone()
    }
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera session owned by the Swift host.
pub struct IosCamera;

impl CaptureDevice for IosCamera {
    fn is_ready(&self) -> bool {
        CAMERA_HOOK.get().is_some()
    }

    fn capture_photo(&self, options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>> {
        Box::pin(async move {
            let hook = *CAMERA_HOOK
                .get()
                .ok_or_else(|| SnapCropError::Bridge("camera hook not registered".into()))?;
            let (tx, rx) = oneshot::channel();
            // Released if the caller stops waiting before Swift answers.
            let parked = CAPTURES.park_scoped(tx);
            let handle = parked.handle();
            tracing::info!(handle, "iOS: capture requested");
            hook(handle, options.quality, options.encode_base64);
            rx.await
                .map_err(|_| SnapCropError::Capture("camera request was dropped".into()))?
        })
    }
}

// ---------------------------------------------------------------------------
// Rectangle detector
// ---------------------------------------------------------------------------

/// Error-first detector module backed by the Swift detector hook.
pub struct SwiftRectangleModule;

impl ErrorFirstModule for SwiftRectangleModule {
    fn check_for_rectangle(&self, image_base64: String, callback: ErrorFirstCallback) -> InFlight {
        let Some(hook) = DETECTOR_HOOK.get().copied() else {
            callback(Some("detector hook not registered".into()), Vec::new());
            return InFlight::done();
        };
        let image = match CString::new(image_base64) {
            Ok(image) => image,
            Err(_) => {
                callback(Some("image payload contains a NUL byte".into()), Vec::new());
                return InFlight::done();
            }
        };
        let parked = DETECTIONS.park_scoped(callback);
        tracing::info!(handle = parked.handle(), "iOS: detection requested");
        hook(parked.handle(), image.as_ptr());
        InFlight::holding(parked)
    }
}

// ---------------------------------------------------------------------------
// C entry points called by the Swift host
// ---------------------------------------------------------------------------

/// Register the camera request hook. Later registrations are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn snapcrop_register_camera(hook: CameraRequestFn) {
    if CAMERA_HOOK.set(hook).is_err() {
        tracing::warn!("camera hook already registered");
    }
}

/// Register the detector request hook. Later registrations are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn snapcrop_register_detector(hook: DetectorRequestFn) {
    if DETECTOR_HOOK.set(hook).is_err() {
        tracing::warn!("detector hook already registered");
    }
}

/// Complete a capture request. On failure `error` is non-null.
///
/// # Safety
///
/// Each pointer must be null or a valid NUL-terminated UTF-8 string that
/// stays alive for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn snapcrop_camera_complete(
    handle: u64,
    error: *const c_char,
    base64: *const c_char,
    uri: *const c_char,
) {
    let Some(reply) = CAPTURES.take(handle) else {
        return;
    };
    // SAFETY: forwarded from this function's contract.
    let (error, base64, uri) = unsafe { (opt_string(error), opt_string(base64), opt_string(uri)) };
    let result = match (error, uri) {
        (Some(e), _) if e == CANCELLED => Err(SnapCropError::CaptureCancelled),
        (Some(e), _) if e == PERMISSION_DENIED => Err(SnapCropError::CameraPermissionDenied),
        (Some(e), _) => Err(SnapCropError::Capture(e)),
        (None, Some(uri)) => Ok(CapturedPhoto::new(base64.unwrap_or_default(), uri)),
        (None, None) => Err(SnapCropError::Capture("camera returned no photo location".into())),
    };
    let _ = reply.send(result);
}

/// Complete a detection request, error-first.
///
/// # Safety
///
/// Each pointer must be null or a valid NUL-terminated UTF-8 string that
/// stays alive for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn snapcrop_detector_complete(
    handle: u64,
    error: *const c_char,
    data_json: *const c_char,
) {
    let Some(callback) = DETECTIONS.take(handle) else {
        return;
    };
    // SAFETY: forwarded from this function's contract.
    let (error, data_json) = unsafe { (opt_string(error), opt_string(data_json)) };
    if error.is_some() {
        callback(error, Vec::new());
        return;
    }
    match data_json.as_deref().map(serde_json::from_str::<Vec<Vec<Option<String>>>>) {
        Some(Ok(data)) => callback(None, data),
        Some(Err(e)) => callback(Some(format!("undecodable detector result: {e}")), Vec::new()),
        None => callback(None, Vec::new()),
    }
}

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let s = unsafe { CStr::from_ptr(ptr) };
    Some(s.to_string_lossy().into_owned())
}
