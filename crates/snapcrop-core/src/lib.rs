// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SnapCrop — Core types, capture state and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod state;
pub mod types;

pub use config::AppConfig;
pub use error::SnapCropError;
pub use state::{CaptureState, FlowPhase};
pub use types::*;
