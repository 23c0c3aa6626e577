// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Accepted page: what the default hand-off received.

use dioxus::prelude::*;

use snapcrop_core::types::data_uri;

use crate::Route;
use crate::services::app_services::AppServices;

#[component]
pub fn Accepted() -> Element {
    let svc = use_context::<AppServices>();

    let Some(photo) = svc.handoff().latest() else {
        return rsx! {
            div { style: "padding: 16px;",
                p { style: "text-align: center; color: #aaa; margin: 48px 0;", "No photo accepted yet." }
                Link { to: Route::CaptureScreen {}, "Take a photo" }
            }
        };
    };

    let src = data_uri("image/png", photo.best_image());
    let when = photo.accepted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let kind = if photo.cropped.is_empty() { "Full photo" } else { "Cropped page" };

    rsx! {
        div { style: "padding: 16px; display: flex; flex-direction: column; gap: 12px;",
            h1 { "Photo accepted" }
            img {
                style: "width: 100%; border-radius: 8px; border: 1px solid #ddd;",
                alt: "{kind}",
                src: "{src}",
            }
            div { style: "font-size: 14px; color: #666;",
                p { "{kind}" }
                p { style: "word-break: break-all;", "Saved at {photo.photo_location}" }
                p { "Accepted {when}" }
            }
            Link { to: Route::CaptureScreen {},
                style: "display: block; text-align: center; padding: 12px; border-radius: 8px; background: #007aff; color: white; text-decoration: none;",
                "Take another"
            }
        }
    }
}
