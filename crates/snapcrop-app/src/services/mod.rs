// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: connects the Dioxus UI to the platform bridge.
//
// Each service wraps bridge calls in a shape the UI can drive directly
// (async, state in, state out).

pub mod app_services;
pub mod capture_flow;
pub mod data_dir;
pub mod handoff;
