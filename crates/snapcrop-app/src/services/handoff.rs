// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default downstream consumer for accepted photos.
//
// Keeps the most recently accepted photo so the `Accepted` page can show it.
// Embedders that want a different hand-off inject their own `PhotoConsumer`.

use std::sync::Mutex;

use snapcrop_bridge::traits::PhotoConsumer;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::AcceptedPhoto;

#[derive(Default)]
pub struct HandoffInbox {
    latest: Mutex<Option<AcceptedPhoto>>,
}

impl HandoffInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last photo handed off, if any.
    pub fn latest(&self) -> Option<AcceptedPhoto> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }
}

impl PhotoConsumer for HandoffInbox {
    fn accept(&self, photo: AcceptedPhoto) -> Result<()> {
        tracing::info!(
            location = %photo.photo_location,
            has_crop = !photo.cropped.is_empty(),
            "photo handed off"
        );
        let mut guard = self
            .latest
            .lock()
            .map_err(|_| SnapCropError::Handoff("hand-off inbox lock poisoned".into()))?;
        *guard = Some(photo);
        Ok(())
    }
}
