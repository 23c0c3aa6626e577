// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! SnapCrop — Native platform bridge abstractions.
//!
//! Defines the camera / rectangle-detector traits and picks the platform
//! implementation once at startup. The two native detector calling
//! conventions are normalized in [`callback`] so that nothing above this
//! crate ever sees a platform conditional.

pub mod callback;
pub mod pending;
pub mod stub;
pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod desktop;

use std::path::PathBuf;

/// Build the bridge for the target operating system.
///
/// `cache_dir` is where the desktop "camera" writes captured photos; mobile
/// hosts store photos themselves and ignore it.
pub fn platform_bridge(cache_dir: PathBuf) -> Box<dyn traits::PlatformBridge> {
    #[cfg(target_os = "ios")]
    {
        let _ = cache_dir;
        Box::new(ios::IosBridge::new())
    }
    #[cfg(target_os = "android")]
    {
        let _ = cache_dir;
        Box::new(android::AndroidBridge::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        if cache_dir.is_dir() {
            Box::new(desktop::DesktopBridge::new(cache_dir))
        } else {
            tracing::warn!(path = %cache_dir.display(), "capture cache unavailable, camera disabled");
            Box::new(stub::StubBridge)
        }
    }
}
