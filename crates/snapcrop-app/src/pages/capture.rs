// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture screen: live camera view with a shutter, or the detector's preview
// with "Repeat photo" / "Use photo".
//
// Only the preview/capture switch lives here; every transition goes through
// `CaptureFlow`. Failures from the flow land in a toast that clears itself.

use dioxus::prelude::*;

use snapcrop_core::error::SnapCropError;
use snapcrop_core::human_errors::{HumanError, Severity, humanize_error, stage_label};
use snapcrop_core::state::CaptureState;
use snapcrop_core::types::data_uri;

use crate::Route;
use crate::services::app_services::AppServices;

#[component]
pub fn CaptureScreen() -> Element {
    let svc = use_context::<AppServices>();
    let state = use_signal(CaptureState::new);
    let toast = use_signal(|| Option::<HumanError>::None);
    let previewing = state.read().is_previewing();
    let platform = svc.platform_name().to_string();

    rsx! {
        div { style: "position: relative; display: flex; flex-direction: column; height: 100%;",
            if previewing {
                PreviewView { state, toast }
            } else {
                CameraView { state, toast }
            }
            if let Some(ref human) = *toast.read() {
                Toast { human: human.clone() }
            }
            p { style: "text-align: center; color: #aaa; font-size: 11px; margin: 4px 0;",
                "{platform}"
            }
        }
    }
}

/// Show `err` as a toast and clear it once the configured duration passes.
fn show_error(svc: &AppServices, mut toast: Signal<Option<HumanError>>, err: &SnapCropError) {
    let human = humanize_error(err);
    let duration = svc.config().toast_duration();
    toast.set(Some(human.clone()));
    spawn(async move {
        tokio::time::sleep(duration).await;
        // A newer toast may have replaced this one meanwhile.
        let still_showing = toast
            .read()
            .as_ref()
            .is_some_and(|current| current.message == human.message);
        if still_showing {
            toast.set(None);
        }
    });
}

#[component]
fn CameraView(state: Signal<CaptureState>, toast: Signal<Option<HumanError>>) -> Element {
    let svc = use_context::<AppServices>();
    let ready = svc.flow().camera_ready();
    let busy = state.read().is_detecting();
    let has_photo = !state.read().content().is_empty();

    rsx! {
        div { style: "flex: 1; display: flex; flex-direction: column; align-items: center; justify-content: flex-end; background: #111; color: #eee; padding: 24px;",
            if !ready {
                p { style: "color: #888; margin-bottom: auto; margin-top: 48px;", "Camera not available." }
            } else if busy {
                p { style: "margin-bottom: auto; margin-top: 48px;", "Looking for the page..." }
            }

            div { style: "display: flex; align-items: center; gap: 24px;",
                // Retry detection on the kept photo after a failure
                if has_photo && !busy {
                    button {
                        style: "padding: 8px 12px; border-radius: 8px; border: 1px solid #eee; color: #eee; background: transparent; font-size: 13px;",
                        onclick: {
                            let svc = svc.clone();
                            move |_| {
                                let svc = svc.clone();
                                let mut state = state;
                                spawn(async move {
                                    if let Err(e) = svc.flow().run_detection(&mut state).await {
                                        show_error(&svc, toast, &e);
                                    }
                                });
                            }
                        },
                        "Try again"
                    }
                }

                // Shutter
                button {
                    style: "width: 72px; height: 72px; border-radius: 50%; border: 4px solid white; background: #eee;",
                    disabled: !ready || busy,
                    aria_label: "Take photo",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            let svc = svc.clone();
                            let mut state = state;
                            spawn(async move {
                                if let Err(e) = svc.flow().request_capture(&mut state).await {
                                    show_error(&svc, toast, &e);
                                }
                            });
                        }
                    },
                }
            }
        }
    }
}

#[component]
fn PreviewView(state: Signal<CaptureState>, toast: Signal<Option<HumanError>>) -> Element {
    let svc = use_context::<AppServices>();
    let nav = navigator();
    let mut show_crop = use_signal(|| svc.config().show_cropped_preview);
    let snapshot = state.read().clone();
    let origin_src = data_uri("image/png", snapshot.origin());
    let cropped_src = (show_crop() && !snapshot.cropped().is_empty())
        .then(|| data_uri("image/png", snapshot.cropped()));

    rsx! {
        div { style: "flex: 1; display: flex; flex-direction: column; padding: 16px; gap: 12px; overflow-y: auto;",
            img {
                style: "width: 100%; border-radius: 8px; border: 1px solid #ddd;",
                alt: "Detected page",
                src: "{origin_src}",
            }
            if let Some(src) = cropped_src {
                img {
                    style: "width: 60%; align-self: center; border-radius: 8px; border: 1px solid #ddd;",
                    alt: "Cropped page",
                    src: "{src}",
                }
            }

            label { style: "font-size: 13px; color: #666;",
                input {
                    r#type: "checkbox",
                    checked: show_crop(),
                    onchange: {
                        let svc = svc.clone();
                        move |evt: FormEvent| {
                            let mut updated = svc.config();
                            updated.show_cropped_preview = evt.checked();
                            if let Err(e) = svc.save_config(&updated) {
                                tracing::warn!(error = %e, "failed to save config");
                            }
                            show_crop.set(updated.show_cropped_preview);
                        }
                    },
                }
                " Show cropped page"
            }

            div { style: "display: flex; gap: 8px; margin-top: auto;",
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            let mut state = state;
                            svc.flow().discard_photo(&mut state);
                        }
                    },
                    "Repeat photo"
                }
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            let current = state.read().clone();
                            match svc.flow().accept_photo(&current) {
                                Ok(_) => {
                                    nav.push(Route::Accepted {});
                                }
                                Err(e) => show_error(&svc, toast, &e),
                            }
                        }
                    },
                    "Use photo"
                }
            }
        }
    }
}

#[component]
fn Toast(human: HumanError) -> Element {
    let background = match human.severity {
        Severity::Transient => "#333",
        Severity::ActionRequired => "#b26a00",
        Severity::Permanent => "#c62828",
    };

    let stage = stage_label(human.kind);

    rsx! {
        div {
            style: "position: absolute; left: 16px; right: 16px; bottom: 112px; padding: 12px 16px; border-radius: 10px; color: white; background: {background}; font-size: 14px;",
            span { style: "display: block; font-size: 11px; text-transform: uppercase; opacity: 0.7;", "{stage}" }
            strong { "{human.message}" }
            p { style: "margin: 4px 0 0; font-size: 13px; opacity: 0.9;", "{human.suggestion}" }
        }
    }
}
