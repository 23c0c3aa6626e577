// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// The capture screen only ever sees these traits. Which implementation sits
// behind them is decided once, in `platform_bridge()`.

use std::sync::Arc;

use futures::future::BoxFuture;
use snapcrop_core::error::Result;
use snapcrop_core::types::{AcceptedPhoto, CaptureOptions, CapturedPhoto, DetectedImages};

/// Groups the native capabilities the capture screen needs.
pub trait PlatformBridge: Send + Sync {
    /// Human-readable platform name (e.g. "iOS", "Android").
    fn platform_name(&self) -> &str;

    /// The camera for this platform.
    fn camera(&self) -> Arc<dyn CaptureDevice>;

    /// The rectangle detector for this platform, already normalized.
    fn detector(&self) -> Arc<dyn RectangleDetector>;
}

/// Take photos with the device camera.
pub trait CaptureDevice: Send + Sync {
    /// Whether the camera can be used right now. The screen does nothing on
    /// a shutter press while this is false (e.g. the view is not mounted yet).
    fn is_ready(&self) -> bool;

    /// Take a photo and return it as base64 plus the location it was stored at.
    fn capture_photo(&self, options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>>;

    /// The photo at `uri` is no longer on screen. Devices that stored it
    /// themselves may delete it; the mobile hosts manage their own files.
    fn release(&self, uri: &str) {
        let _ = uri;
    }
}

/// Find a document rectangle in a photo.
///
/// Always resolves to the `(origin, cropped)` pair or an error, whatever
/// calling convention the native module uses underneath.
pub trait RectangleDetector: Send + Sync {
    fn detect(&self, image_base64: String) -> BoxFuture<'_, Result<DetectedImages>>;
}

/// Receives a photo the user accepted. Owned by the embedding application.
pub trait PhotoConsumer: Send + Sync {
    fn accept(&self, photo: AcceptedPhoto) -> Result<()>;
}
