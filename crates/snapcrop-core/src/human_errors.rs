// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the capture screen's toast.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives the toast colour.

use std::time::Duration;

use crate::error::{FailureKind, SnapCropError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong this time; taking another photo may work.
    Transient,
    /// User must do something first (grant permission, hold the page flat).
    ActionRequired,
    /// Retrying will not help on this device.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanError {
    /// Plain English summary (toast heading).
    pub message: String,
    /// What the user should try (toast body).
    pub suggestion: String,
    /// Whether pressing the shutter again can fix it.
    pub retriable: bool,
    pub severity: Severity,
    pub kind: FailureKind,
}

/// Convert a `SnapCropError` into a `HumanError` for the toast.
pub fn humanize_error(err: &SnapCropError) -> HumanError {
    let kind = err.kind();
    let (message, suggestion, retriable, severity) = match err {
        // -- Capture --
        SnapCropError::CameraPermissionDenied => (
            "We can't use the camera.".to_string(),
            "Allow camera access for this app in your device settings, then try again.".to_string(),
            false,
            Severity::ActionRequired,
        ),
        SnapCropError::CaptureCancelled => (
            "No photo was taken.".into(),
            "Tap the shutter button when the page is in view.".into(),
            true,
            Severity::Transient,
        ),
        SnapCropError::Capture(detail) => (
            "The photo couldn't be taken.".into(),
            format!("Try again in a moment. ({detail})"),
            true,
            Severity::Transient,
        ),
        SnapCropError::ImageError(detail) => (
            "That picture couldn't be read.".into(),
            format!("Take the photo again. ({detail})"),
            true,
            Severity::Transient,
        ),
        SnapCropError::CameraUnavailable => (
            "This device has no camera we can use.".into(),
            "Take the photo with the phone app instead.".into(),
            false,
            Severity::Permanent,
        ),
        SnapCropError::Io(e) => (
            "The photo couldn't be saved.".into(),
            format!("Check that your device has free space, then try again. ({e})"),
            true,
            Severity::Transient,
        ),

        // -- Detection --
        SnapCropError::Detection(detail) => (
            "We couldn't find the page's edges.".into(),
            format!("Lay the page flat on a darker surface with all four corners in view. ({detail})"),
            true,
            Severity::ActionRequired,
        ),
        SnapCropError::MalformedDetection(_)
        | SnapCropError::DetectionAbandoned
        | SnapCropError::Base64(_) => (
            "Finding the page went wrong.".into(),
            "Take the photo again.".into(),
            true,
            Severity::Transient,
        ),
        SnapCropError::DetectionTimedOut(limit) => (
            "Finding the page took too long.".into(),
            format!(
                "Nothing came back after {}. Take the photo again.",
                whole_seconds(*limit)
            ),
            true,
            Severity::Transient,
        ),
        SnapCropError::DetectorUnavailable => (
            "Page detection isn't available here.".into(),
            "Page detection needs the phone app. Try again on your phone.".into(),
            false,
            Severity::Permanent,
        ),

        // -- Hand-off --
        SnapCropError::NothingToAccept => (
            "There is no photo to use yet.".into(),
            "Take a photo first.".into(),
            false,
            Severity::ActionRequired,
        ),
        SnapCropError::Handoff(detail) => (
            "The photo couldn't be passed on.".into(),
            format!("Try tapping Use photo again. ({detail})"),
            true,
            Severity::Transient,
        ),

        // -- Platform --
        SnapCropError::Bridge(detail) => (
            "Something went wrong talking to your phone.".into(),
            format!("Close and reopen the app, then try again. ({detail})"),
            true,
            Severity::Transient,
        ),
        SnapCropError::Serialization(e) => (
            "Something went wrong reading the app's data.".into(),
            format!("Close and reopen the app. ({e})"),
            false,
            Severity::Permanent,
        ),
    };

    HumanError {
        message,
        suggestion,
        retriable,
        severity,
        kind,
    }
}

/// Short label for the stage that failed, shown above the toast message.
pub fn stage_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Capture => "Camera",
        FailureKind::Detection => "Page detection",
        FailureKind::Handoff => "Saving",
        FailureKind::Platform => "App",
    }
}

/// "1 second" / "15 seconds", rounding any fraction up.
fn whole_seconds(limit: Duration) -> String {
    match limit.as_millis().div_ceil(1000) {
        1 => "1 second".to_string(),
        n => format!("{n} seconds"),
    }
}
