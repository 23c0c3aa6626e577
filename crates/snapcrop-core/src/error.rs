// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SnapCrop.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all SnapCrop operations.
#[derive(Debug, Error)]
pub enum SnapCropError {
    // -- Capture errors --
    #[error("photo capture failed: {0}")]
    Capture(String),

    #[error("camera permission denied")]
    CameraPermissionDenied,

    #[error("photo capture cancelled")]
    CaptureCancelled,

    #[error("no camera available on this platform")]
    CameraUnavailable,

    // -- Detection errors --
    #[error("rectangle detection failed: {0}")]
    Detection(String),

    #[error("rectangle detector returned a malformed result: {0}")]
    MalformedDetection(String),

    #[error("rectangle detector dropped the request without answering")]
    DetectionAbandoned,

    #[error("rectangle detection timed out after {0:?}")]
    DetectionTimedOut(Duration),

    #[error("no rectangle detector available on this platform")]
    DetectorUnavailable,

    // -- Hand-off --
    #[error("no previewed photo to accept")]
    NothingToAccept,

    #[error("photo hand-off failed: {0}")]
    Handoff(String),

    // -- Payloads / persistence --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),
}

/// Which stage of the capture flow an error belongs to.
///
/// The UI uses this to pick the notification wording; the state machine
/// falls back to `Capturing` for both `Capture` and `Detection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Capture,
    Detection,
    Handoff,
    Platform,
}

impl SnapCropError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Capture(_)
            | Self::CameraPermissionDenied
            | Self::CaptureCancelled
            | Self::CameraUnavailable
            | Self::ImageError(_)
            | Self::Io(_) => FailureKind::Capture,
            Self::Detection(_)
            | Self::MalformedDetection(_)
            | Self::DetectionAbandoned
            | Self::DetectionTimedOut(_)
            | Self::DetectorUnavailable
            | Self::Base64(_) => FailureKind::Detection,
            Self::NothingToAccept | Self::Handoff(_) => FailureKind::Handoff,
            Self::Serialization(_) | Self::Bridge(_) => FailureKind::Platform,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SnapCropError>;
