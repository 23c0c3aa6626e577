// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::CaptureOptions;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Options passed to the camera on every capture.
    pub capture: CaptureOptions,
    /// Give up on the detector after this many seconds. `None` waits forever.
    pub detection_timeout_secs: Option<u64>,
    /// Show the cropped image under the origin overlay when the detector found one.
    pub show_cropped_preview: bool,
    /// How long error toasts stay on screen.
    pub toast_duration_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture: CaptureOptions::default(),
            detection_timeout_secs: None,
            show_cropped_preview: true,
            toast_duration_ms: 2000,
        }
    }
}

impl AppConfig {
    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_secs.map(Duration::from_secs)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}
