// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: picks the platform bridge, loads config and wires
// the capture flow to the hand-off consumer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use snapcrop_bridge::traits::{PhotoConsumer, PlatformBridge};
use snapcrop_core::AppConfig;
use snapcrop_core::error::{Result, SnapCropError};
use tracing::{info, warn};

use super::capture_flow::CaptureFlow;
use super::data_dir;
use super::handoff::HandoffInbox;

const CONFIG_FILE: &str = "config.json";

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
///
/// Every field is Arc-wrapped so the struct can move into event handlers.
#[derive(Clone)]
pub struct AppServices {
    flow: CaptureFlow,
    handoff: Arc<HandoffInbox>,
    platform: String,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    pub fn init() -> Self {
        let dir = data_dir::data_dir();
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(&dir).unwrap_or_default();
        let captures = data_dir::data_subdir(&data_dir::cache_dir(), "captures");
        let bridge = snapcrop_bridge::platform_bridge(captures);
        Self::with_bridge(bridge.as_ref(), dir, config)
    }

    /// Build the services around an explicit bridge.
    pub fn with_bridge(bridge: &dyn PlatformBridge, data_dir: PathBuf, config: AppConfig) -> Self {
        let handoff = Arc::new(HandoffInbox::new());
        let consumer: Arc<dyn PhotoConsumer> = handoff.clone();
        let flow = CaptureFlow::new(bridge.camera(), bridge.detector(), consumer, &config);

        info!(
            platform = bridge.platform_name(),
            camera_ready = bridge.camera().is_ready(),
            "app services initialised"
        );

        Self {
            flow,
            handoff,
            platform: bridge.platform_name().to_string(),
            data_dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn flow(&self) -> &CaptureFlow {
        &self.flow
    }

    /// The most recently accepted photo.
    pub fn handoff(&self) -> &HandoffInbox {
        &self.handoff
    }

    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    pub fn config(&self) -> AppConfig {
        match self.config.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Update and persist the config. Capture options and the detector
    /// deadline are read at startup; display settings apply immediately.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self
            .config
            .lock()
            .map_err(|_| SnapCropError::Bridge("config lock poisoned".into()))? = config.clone();
        persist_config(&self.data_dir, config)
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use snapcrop_bridge::stub::StubBridge;

    use super::*;

    #[test]
    fn config_round_trips_through_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::with_bridge(&StubBridge, dir.path().to_path_buf(), AppConfig::default());

        let mut config = svc.config();
        config.detection_timeout_secs = Some(15);
        config.show_cropped_preview = false;
        svc.save_config(&config).unwrap();

        assert_eq!(svc.config(), config);
        assert_eq!(load_config(dir.path()), Some(config));
    }

    #[test]
    fn missing_or_broken_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path()).is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(load_config(dir.path()).is_none());
    }

    #[test]
    fn stub_bridge_leaves_camera_unready() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::with_bridge(&StubBridge, dir.path().to_path_buf(), AppConfig::default());
        assert_eq!(svc.platform_name(), "Stub");
        assert!(!svc.flow().camera_ready());
        assert!(svc.handoff().latest().is_none());
    }
}
