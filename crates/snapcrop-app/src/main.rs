// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SnapCrop: photograph a document, find its edges, preview the crop.
//
// Entry point. Initialises logging and backend services, then launches the
// Dioxus UI.

mod pages;
mod services;

use dioxus::prelude::*;

use pages::accepted::Accepted;
use pages::capture::CaptureScreen;

use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SnapCrop starting");

    dioxus::launch(app);
}

/// Top-level route enum.
#[derive(Debug, Clone, Routable, PartialEq)]
enum Route {
    #[layout(Shell)]
    #[route("/")]
    CaptureScreen {},
    #[route("/accepted")]
    Accepted {},
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(AppServices::init);
    use_context_provider(|| svc.clone());

    rsx! {
        Router::<Route> {}
    }
}

#[component]
fn Shell() -> Element {
    rsx! {
        div { class: "app-container",
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",
            Outlet::<Route> {}
        }
    }
}
