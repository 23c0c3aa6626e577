// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the SnapCrop capture flow.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapCropError};

/// Options forwarded to the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    /// Whether the device must return the photo as base64.
    pub encode_base64: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 0.5,
            encode_base64: true,
        }
    }
}

impl CaptureOptions {
    /// Quality mapped onto the 1..=100 scale JPEG encoders expect.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

/// A photo returned by the capture device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPhoto {
    /// Encoded image bytes, base64.
    pub base64: String,
    /// Where the device stored the photo (`file://…`, `content://…`).
    pub uri: String,
}

impl CapturedPhoto {
    pub fn new(base64: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            uri: uri.into(),
        }
    }

    /// Decode the payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_payload(&self.base64)
    }
}

/// The detector's two output images, always in `(origin, cropped)` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedImages {
    /// The source photo with the detected boundary drawn on it.
    pub origin: String,
    /// The cropped document region. `None` when no rectangle passed validation.
    pub cropped: Option<String>,
}

impl DetectedImages {
    pub fn new(origin: impl Into<String>, cropped: Option<String>) -> Self {
        Self {
            origin: origin.into(),
            cropped,
        }
    }

    /// Build from the raw slot list a native module hands back.
    ///
    /// Slot 0 is the origin and must be present and non-empty. Slot 1 is the
    /// crop; a missing, null or empty slot means "no crop".
    pub fn from_slots(slots: Vec<Option<String>>) -> Result<Self> {
        let mut slots = slots.into_iter();
        let origin = match slots.next() {
            Some(Some(origin)) if !origin.is_empty() => origin,
            Some(_) => {
                return Err(SnapCropError::MalformedDetection(
                    "origin image is missing".into(),
                ));
            }
            None => {
                return Err(SnapCropError::MalformedDetection(
                    "result contains no images".into(),
                ));
            }
        };
        let cropped = slots.next().flatten().filter(|c| !c.is_empty());
        let extra = slots.count();
        if extra > 0 {
            tracing::debug!(extra, "ignoring extra detector output slots");
        }
        Ok(Self { origin, cropped })
    }
}

/// What the screen hands downstream when the user accepts a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedPhoto {
    pub photo_location: String,
    pub origin: String,
    /// Empty when the detector produced no crop.
    pub cropped: String,
    pub accepted_at: DateTime<Utc>,
}

impl AcceptedPhoto {
    /// The best image to show downstream: the crop if there is one.
    pub fn best_image(&self) -> &str {
        if self.cropped.is_empty() {
            &self.origin
        } else {
            &self.cropped
        }
    }
}

/// Render a base64 payload as a `data:` URI for an `<img>` element.
pub fn data_uri(mime: &str, base64: &str) -> String {
    format!("data:{mime};base64,{base64}")
}

/// Decode a base64 payload, tolerating the line breaks some native encoders
/// insert every 76 characters.
pub fn decode_payload(base64: &str) -> Result<Vec<u8>> {
    let compact: String = base64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Encode raw bytes as a standard base64 payload.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
