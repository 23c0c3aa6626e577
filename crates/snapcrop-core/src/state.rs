// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture screen state: an immutable value with explicit transitions.
//
// Every transition returns a new `CaptureState`; nothing mutates in place.
// The screen holds the current value in a signal and swaps it wholesale.

use chrono::Utc;

use crate::types::{AcceptedPhoto, CapturedPhoto, DetectedImages};

/// Which view the capture screen is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    /// Live camera view, nothing pending.
    #[default]
    Capturing,
    /// A photo was taken and is with the detector. Rendered as the camera view.
    Detecting,
    /// Detector output is on screen with accept / retake controls.
    Previewing,
}

/// Identifies the capture a detection request belongs to.
///
/// Bumped on every capture so that a response for an older photo can be
/// told apart from the one the screen is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CaptureTicket(u64);

impl std::fmt::Display for CaptureTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State owned by the capture screen.
///
/// `is_previewing()` holds iff a detection result has been applied for the
/// current `content`. Equality ignores the capture ticket.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    content: String,
    origin: String,
    cropped: String,
    phase: FlowPhase,
    photo_location: String,
    ticket: CaptureTicket,
}

impl PartialEq for CaptureState {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.origin == other.origin
            && self.cropped == other.cropped
            && self.phase == other.phase
            && self.photo_location == other.photo_location
    }
}

impl Eq for CaptureState {}

impl CaptureState {
    /// The empty state the screen starts in.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Accessors ------------------------------------------------------------

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn cropped(&self) -> &str {
        &self.cropped
    }

    pub fn photo_location(&self) -> &str {
        &self.photo_location
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn is_previewing(&self) -> bool {
        self.phase == FlowPhase::Previewing
    }

    pub fn is_detecting(&self) -> bool {
        self.phase == FlowPhase::Detecting
    }

    pub fn ticket(&self) -> CaptureTicket {
        self.ticket
    }

    // -- Transitions ----------------------------------------------------------

    /// A new photo arrived from the camera. Previous detector output is
    /// cleared and the state waits on detection for this photo.
    pub fn with_capture(&self, photo: CapturedPhoto) -> Self {
        Self {
            content: photo.base64,
            origin: String::new(),
            cropped: String::new(),
            phase: FlowPhase::Detecting,
            photo_location: photo.uri,
            ticket: CaptureTicket(self.ticket.0.wrapping_add(1)),
        }
    }

    /// Send the current photo to the detector again (e.g. after a failure).
    /// Earlier output is cleared; the ticket stays, since the photo is the same.
    pub fn awaiting_detection(&self) -> Self {
        if self.content.is_empty() {
            return self.clone();
        }
        Self {
            origin: String::new(),
            cropped: String::new(),
            phase: FlowPhase::Detecting,
            ..self.clone()
        }
    }

    /// Apply a detection result. Results for any other capture, or arriving
    /// after the photo was discarded, leave the state unchanged.
    pub fn with_detection(&self, ticket: CaptureTicket, images: DetectedImages) -> Self {
        if !self.awaits(ticket) {
            tracing::debug!(%ticket, current = %self.ticket, "dropping stale detection result");
            return self.clone();
        }
        Self {
            content: self.content.clone(),
            origin: images.origin,
            cropped: images.cropped.unwrap_or_default(),
            phase: FlowPhase::Previewing,
            photo_location: self.photo_location.clone(),
            ticket: self.ticket,
        }
    }

    /// Detection failed: back to the camera view, keeping the captured photo.
    pub fn with_detection_failure(&self, ticket: CaptureTicket) -> Self {
        if !self.awaits(ticket) {
            return self.clone();
        }
        Self {
            phase: FlowPhase::Capturing,
            ..self.clone()
        }
    }

    /// Drop the current photo and return to the live camera view.
    pub fn discard(&self) -> Self {
        Self {
            ticket: self.ticket,
            ..Self::default()
        }
    }

    /// The hand-off payload, if a preview is on screen.
    pub fn accepted(&self) -> Option<AcceptedPhoto> {
        self.is_previewing().then(|| AcceptedPhoto {
            photo_location: self.photo_location.clone(),
            origin: self.origin.clone(),
            cropped: self.cropped.clone(),
            accepted_at: Utc::now(),
        })
    }

    fn awaits(&self, ticket: CaptureTicket) -> bool {
        self.phase == FlowPhase::Detecting && self.ticket == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> CapturedPhoto {
        CapturedPhoto::new("AAA", "file:///p.jpg")
    }

    fn detected() -> DetectedImages {
        DetectedImages::new("ORIGIN_B64", Some("CROP_B64".into()))
    }

    #[test]
    fn capture_then_detection_previews_both_images() {
        let captured = CaptureState::new().with_capture(photo());
        assert!(captured.is_detecting());
        assert!(!captured.is_previewing());

        let state = captured.with_detection(captured.ticket(), detected());
        assert_eq!(state.content(), "AAA");
        assert_eq!(state.origin(), "ORIGIN_B64");
        assert_eq!(state.cropped(), "CROP_B64");
        assert!(state.is_previewing());
        assert_eq!(state.photo_location(), "file:///p.jpg");
    }

    #[test]
    fn detection_failure_keeps_photo_without_preview() {
        let captured = CaptureState::new().with_capture(photo());
        let state = captured.with_detection_failure(captured.ticket());
        assert_eq!(state.content(), "AAA");
        assert_eq!(state.origin(), "");
        assert_eq!(state.cropped(), "");
        assert!(!state.is_previewing());
        assert_eq!(state.phase(), FlowPhase::Capturing);
        assert_eq!(state.photo_location(), "file:///p.jpg");
    }

    #[test]
    fn discard_is_idempotent_and_matches_initial() {
        let captured = CaptureState::new().with_capture(photo());
        let previewing = captured.with_detection(captured.ticket(), detected());

        let once = previewing.discard();
        let twice = once.discard();
        assert_eq!(once, CaptureState::new());
        assert_eq!(once, twice);
        assert_eq!(once.photo_location(), "");
    }

    #[test]
    fn missing_crop_previews_with_empty_crop() {
        let captured = CaptureState::new().with_capture(photo());
        let state = captured.with_detection(captured.ticket(), DetectedImages::new("O", None));
        assert!(state.is_previewing());
        assert_eq!(state.cropped(), "");
    }

    #[test]
    fn stale_result_from_earlier_capture_is_ignored() {
        let first = CaptureState::new().with_capture(photo());
        let stale_ticket = first.ticket();
        let second = first.with_capture(CapturedPhoto::new("BBB", "file:///q.jpg"));

        let state = second.with_detection(stale_ticket, detected());
        assert_eq!(state, second);
        assert!(!state.is_previewing());

        let state = second.with_detection_failure(stale_ticket);
        assert!(state.is_detecting());
    }

    #[test]
    fn result_after_discard_is_ignored() {
        let captured = CaptureState::new().with_capture(photo());
        let ticket = captured.ticket();
        let discarded = captured.discard();
        let state = discarded.with_detection(ticket, detected());
        assert_eq!(state, CaptureState::new());
    }

    #[test]
    fn recapture_clears_previous_output() {
        let captured = CaptureState::new().with_capture(photo());
        let previewing = captured.with_detection(captured.ticket(), detected());
        let again = previewing.with_capture(CapturedPhoto::new("BBB", "file:///q.jpg"));
        assert_eq!(again.origin(), "");
        assert_eq!(again.cropped(), "");
        assert_eq!(again.content(), "BBB");
        assert_ne!(again.ticket(), previewing.ticket());
    }

    #[test]
    fn retry_after_failure_waits_on_same_photo() {
        let captured = CaptureState::new().with_capture(photo());
        let failed = captured.with_detection_failure(captured.ticket());
        let retry = failed.awaiting_detection();
        assert!(retry.is_detecting());
        assert_eq!(retry.ticket(), captured.ticket());

        let state = retry.with_detection(retry.ticket(), detected());
        assert!(state.is_previewing());
    }

    #[test]
    fn awaiting_detection_needs_a_photo() {
        let state = CaptureState::new().awaiting_detection();
        assert_eq!(state.phase(), FlowPhase::Capturing);
    }

    #[test]
    fn accepted_only_while_previewing() {
        let captured = CaptureState::new().with_capture(photo());
        assert!(captured.accepted().is_none());

        let previewing = captured.with_detection(captured.ticket(), detected());
        let accepted = previewing.accepted().unwrap();
        assert_eq!(accepted.photo_location, "file:///p.jpg");
        assert_eq!(accepted.best_image(), "CROP_B64");
    }
}
