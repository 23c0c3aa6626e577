// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalizes the two native rectangle-detector calling conventions into the
// async `RectangleDetector` trait.
//
// Android hosts answer through a pair of callbacks: one for errors, one for
// success carrying the image slots. iOS hosts answer through a single
// error-first callback whose payload is a collection with the image slots at
// index 0. Either way the caller gets `(origin, cropped)` or an error.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::DetectedImages;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::traits::RectangleDetector;

/// Error channel of the split convention.
pub type ErrorCallback = Box<dyn FnOnce(String) + Send>;
/// Success channel of the split convention: the image slots, nullable.
pub type SuccessCallback = Box<dyn FnOnce(Vec<Option<String>>) + Send>;
/// Error-first callback: `(error, collection_of_slot_lists)`.
pub type ErrorFirstCallback = Box<dyn FnOnce(Option<String>, Vec<Vec<Option<String>>>) + Send>;

/// Whatever a native module keeps for one outstanding request.
///
/// The adapter holds it while waiting and drops it when the answer arrives or
/// the caller gives up; modules hand back a guard that releases their parked
/// callbacks on drop.
pub struct InFlight {
    _guard: Option<Box<dyn Send>>,
}

impl InFlight {
    /// Nothing to release (answered synchronously, or no state kept).
    pub fn done() -> Self {
        Self { _guard: None }
    }

    pub fn holding(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Some(Box::new(guard)),
        }
    }
}

/// A native module that reports through separate error and success callbacks.
pub trait SplitCallbackModule: Send + Sync {
    fn check_for_rectangle(
        &self,
        image_base64: String,
        on_error: ErrorCallback,
        on_success: SuccessCallback,
    ) -> InFlight;
}

/// A native module that reports through one error-first callback.
pub trait ErrorFirstModule: Send + Sync {
    fn check_for_rectangle(&self, image_base64: String, callback: ErrorFirstCallback) -> InFlight;
}

/// One-shot sender shared by several callbacks; the first to fire wins.
struct SharedReply(Arc<Mutex<Option<oneshot::Sender<Result<DetectedImages>>>>>);

impl SharedReply {
    fn new(tx: oneshot::Sender<Result<DetectedImages>>) -> Self {
        Self(Arc::new(Mutex::new(Some(tx))))
    }

    fn handle(&self) -> Self {
        Self(Arc::clone(&self.0))
    }

    fn send(&self, result: Result<DetectedImages>) {
        let sender = match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => {
                // Receiver gone means the caller stopped waiting.
                let _ = tx.send(result);
            }
            None => tracing::warn!("detector answered twice; ignoring the late reply"),
        }
    }
}

async fn await_reply(rx: oneshot::Receiver<Result<DetectedImages>>) -> Result<DetectedImages> {
    let result = rx.await.map_err(|_| SnapCropError::DetectionAbandoned)?;
    match &result {
        Ok(images) => tracing::info!(
            origin_len = images.origin.len(),
            has_crop = images.cropped.is_some(),
            "rectangle detection finished"
        ),
        Err(e) => tracing::warn!(error = %e, "rectangle detection failed"),
    }
    result
}

// ---------------------------------------------------------------------------
// Split callbacks (Android)
// ---------------------------------------------------------------------------

/// Adapts a [`SplitCallbackModule`] to [`RectangleDetector`].
pub struct SplitCallbackDetector<M> {
    module: M,
}

impl<M: SplitCallbackModule> SplitCallbackDetector<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }
}

impl<M: SplitCallbackModule> RectangleDetector for SplitCallbackDetector<M> {
    fn detect(&self, image_base64: String) -> BoxFuture<'_, Result<DetectedImages>> {
        let span = tracing::info_span!("detect", convention = "split", image_len = image_base64.len());
        Box::pin(
            async move {
                let (tx, rx) = oneshot::channel();
                let reply = SharedReply::new(tx);
                let on_error = reply.handle();
                let on_success = reply;

                let _in_flight = self.module.check_for_rectangle(
                    image_base64,
                    Box::new(move |message| on_error.send(Err(SnapCropError::Detection(message)))),
                    Box::new(move |slots| on_success.send(DetectedImages::from_slots(slots))),
                );

                await_reply(rx).await
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Error-first callback (iOS)
// ---------------------------------------------------------------------------

/// Adapts an [`ErrorFirstModule`] to [`RectangleDetector`].
pub struct ErrorFirstDetector<M> {
    module: M,
}

impl<M: ErrorFirstModule> ErrorFirstDetector<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }
}

impl<M: ErrorFirstModule> RectangleDetector for ErrorFirstDetector<M> {
    fn detect(&self, image_base64: String) -> BoxFuture<'_, Result<DetectedImages>> {
        let span = tracing::info_span!("detect", convention = "error_first", image_len = image_base64.len());
        Box::pin(
            async move {
                let (tx, rx) = oneshot::channel();
                let reply = SharedReply::new(tx);

                let _in_flight = self.module.check_for_rectangle(
                    image_base64,
                    Box::new(move |error, data| reply.send(unpack_error_first(error, data))),
                );

                await_reply(rx).await
            }
            .instrument(span),
        )
    }
}

fn unpack_error_first(
    error: Option<String>,
    data: Vec<Vec<Option<String>>>,
) -> Result<DetectedImages> {
    if let Some(message) = error {
        return Err(SnapCropError::Detection(message));
    }
    match data.into_iter().next() {
        Some(slots) => DetectedImages::from_slots(slots),
        None => Err(SnapCropError::MalformedDetection(
            "result collection is empty".into(),
        )),
    }
}
