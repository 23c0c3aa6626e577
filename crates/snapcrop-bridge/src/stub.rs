// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds where no camera or detector exists (CI, headless).
//
// The camera reports itself not ready, so the shutter is a no-op; every call
// that does get through reports the camera or detector as unavailable.

use std::sync::Arc;

use futures::future::BoxFuture;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::{CaptureOptions, CapturedPhoto, DetectedImages};

use crate::traits::*;

/// No-op bridge.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Stub"
    }

    fn camera(&self) -> Arc<dyn CaptureDevice> {
        Arc::new(StubCamera)
    }

    fn detector(&self) -> Arc<dyn RectangleDetector> {
        Arc::new(UnavailableDetector)
    }
}

/// Camera that is never ready.
pub struct StubCamera;

impl CaptureDevice for StubCamera {
    fn is_ready(&self) -> bool {
        false
    }

    fn capture_photo(&self, _options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>> {
        tracing::warn!("CaptureDevice::capture_photo called on stub bridge");
        Box::pin(async { Err(SnapCropError::CameraUnavailable) })
    }
}

/// Detector for platforms without the native rectangle module.
pub struct UnavailableDetector;

impl RectangleDetector for UnavailableDetector {
    fn detect(&self, _image_base64: String) -> BoxFuture<'_, Result<DetectedImages>> {
        tracing::warn!("RectangleDetector::detect called without a native module");
        Box::pin(async { Err(SnapCropError::DetectorUnavailable) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_is_inert() {
        let bridge = StubBridge;
        assert!(!bridge.camera().is_ready());
        let err = bridge.detector().detect("AAA".into()).await.unwrap_err();
        assert!(matches!(err, SnapCropError::DetectorUnavailable));
        let err = bridge.camera().capture_photo(CaptureOptions::default()).await.unwrap_err();
        assert!(matches!(err, SnapCropError::CameraUnavailable));
    }
}
