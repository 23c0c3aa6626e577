// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge.
//
// There is no camera on most desktops, so "capture" opens a file dialog and
// treats the chosen image as the photo: it is re-encoded as JPEG at the
// requested quality into the capture cache, exactly like a phone camera
// would hand back a fresh file. The rectangle detector is a native mobile
// module and is unavailable here.
//
// Captures are transient: at most one lives in the cache at a time, it is
// deleted when the screen drops it, and leftovers are swept at startup.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::{CaptureOptions, CapturedPhoto, encode_payload};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::stub::UnavailableDetector;
use crate::traits::*;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];
const CAPTURE_PREFIX: &str = "capture-";

/// Bridge used on Linux, macOS and Windows.
pub struct DesktopBridge {
    camera: Arc<FileDialogCamera>,
}

impl DesktopBridge {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            camera: Arc::new(FileDialogCamera::new(cache_dir)),
        }
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }

    fn camera(&self) -> Arc<dyn CaptureDevice> {
        self.camera.clone()
    }

    fn detector(&self) -> Arc<dyn RectangleDetector> {
        Arc::new(UnavailableDetector)
    }
}

/// "Camera" backed by a native file picker.
pub struct FileDialogCamera {
    cache_dir: PathBuf,
    latest: Mutex<Option<PathBuf>>,
}

impl FileDialogCamera {
    /// Sweeps captures left over from earlier runs.
    pub fn new(cache_dir: PathBuf) -> Self {
        let removed = clear_captures(&cache_dir);
        if removed > 0 {
            info!(removed, path = %cache_dir.display(), "removed stale captures");
        }
        Self {
            cache_dir,
            latest: Mutex::new(None),
        }
    }

    /// Remember `path` as the live capture, deleting the one before it.
    fn replace_latest(&self, path: Option<PathBuf>) {
        let previous = match self.latest.lock() {
            Ok(mut latest) => std::mem::replace(&mut *latest, path),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), path),
        };
        if let Some(previous) = previous {
            remove_capture(&previous);
        }
    }

    /// The capture file `uri` points at, if this camera wrote it.
    fn owned_path(&self, uri: &str) -> Option<PathBuf> {
        let path = Path::new(uri.strip_prefix("file://")?);
        let name = path.file_name()?.to_str()?;
        (path.parent() == Some(self.cache_dir.as_path()) && name.starts_with(CAPTURE_PREFIX))
            .then(|| path.to_path_buf())
    }
}

impl CaptureDevice for FileDialogCamera {
    fn is_ready(&self) -> bool {
        self.cache_dir.is_dir()
    }

    fn capture_photo(&self, options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>> {
        Box::pin(async move {
            // The dialog must run on the UI thread, which is the one polling us.
            let path = rfd::FileDialog::new()
                .add_filter("Images", IMAGE_EXTENSIONS)
                .pick_file()
                .ok_or(SnapCropError::CaptureCancelled)?;
            info!(path = %path.display(), "image picked as capture");

            let bytes = tokio::fs::read(&path).await?;
            let cache_dir = self.cache_dir.clone();
            let photo = tokio::task::spawn_blocking(move || store_capture(&bytes, options, &cache_dir))
                .await
                .map_err(|e| SnapCropError::Capture(format!("capture worker failed: {e}")))??;
            self.replace_latest(self.owned_path(&photo.uri));
            Ok(photo)
        })
    }

    fn release(&self, uri: &str) {
        let Some(path) = self.owned_path(uri) else {
            return;
        };
        let is_latest = match self.latest.lock() {
            Ok(latest) => latest.as_deref() == Some(path.as_path()),
            Err(poisoned) => poisoned.into_inner().as_deref() == Some(path.as_path()),
        };
        if is_latest {
            self.replace_latest(None);
        } else {
            remove_capture(&path);
        }
    }
}

fn remove_capture(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "capture removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove capture"),
    }
}

/// Delete every capture file in `cache_dir`. Returns how many were removed.
pub fn clear_captures(cache_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(CAPTURE_PREFIX))
        })
        .filter(|path| std::fs::remove_file(path).is_ok())
        .count()
}

/// Re-encode `bytes` as a JPEG in `cache_dir` and describe it as a capture.
///
/// The payload is only base64-encoded when the options ask for it.
pub fn store_capture(bytes: &[u8], options: CaptureOptions, cache_dir: &Path) -> Result<CapturedPhoto> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| SnapCropError::ImageError(format!("failed to decode picked image: {e}")))?;
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), options.jpeg_quality());
    rgb.write_with_encoder(encoder)
        .map_err(|e| SnapCropError::ImageError(format!("failed to encode JPEG: {e}")))?;

    let path = cache_dir.join(format!("{CAPTURE_PREFIX}{}.jpg", Uuid::new_v4()));
    std::fs::write(&path, &jpeg)?;
    debug!(
        path = %path.display(),
        width = rgb.width(),
        height = rgb.height(),
        bytes = jpeg.len(),
        quality = options.jpeg_quality(),
        "capture stored"
    );

    let base64 = if options.encode_base64 {
        encode_payload(&jpeg)
    } else {
        String::new()
    };
    Ok(CapturedPhoto::new(base64, format!("file://{}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use snapcrop_core::types::decode_payload;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([200, 10, 10, 128])));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn stores_jpeg_and_returns_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let photo = store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();

        let path = photo.uri.strip_prefix("file://").unwrap();
        assert!(Path::new(path).starts_with(dir.path()));
        let on_disk = std::fs::read(path).unwrap();
        assert_eq!(decode_payload(&photo.base64).unwrap(), on_disk);

        let reloaded = image::load_from_memory(&on_disk).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (40, 30));
    }

    #[test]
    fn base64_skipped_when_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let options = CaptureOptions {
            quality: 0.8,
            encode_base64: false,
        };
        let photo = store_capture(&png_bytes(), options, dir.path()).unwrap();
        assert!(photo.base64.is_empty());
        assert!(photo.uri.starts_with("file://"));
    }

    #[test]
    fn garbage_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_capture(b"not an image", CaptureOptions::default(), dir.path()).unwrap_err();
        assert!(matches!(err, SnapCropError::ImageError(_)));
    }

    #[test]
    fn camera_not_ready_without_cache_dir() {
        let camera = FileDialogCamera::new(PathBuf::from("/definitely/not/here"));
        assert!(!camera.is_ready());
    }

    fn capture_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn startup_sweeps_old_captures() {
        let dir = tempfile::tempdir().unwrap();
        store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();
        store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let _camera = FileDialogCamera::new(dir.path().to_path_buf());
        assert_eq!(capture_files(dir.path()), vec![dir.path().join("notes.txt")]);
    }

    #[test]
    fn release_deletes_the_capture() {
        let dir = tempfile::tempdir().unwrap();
        let camera = FileDialogCamera::new(dir.path().to_path_buf());
        let photo = store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();
        camera.replace_latest(camera.owned_path(&photo.uri));

        camera.release(&photo.uri);
        assert!(capture_files(dir.path()).is_empty());
        // Twice is harmless.
        camera.release(&photo.uri);
    }

    #[test]
    fn new_capture_replaces_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let camera = FileDialogCamera::new(dir.path().to_path_buf());

        let first = store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();
        camera.replace_latest(camera.owned_path(&first.uri));
        let second = store_capture(&png_bytes(), CaptureOptions::default(), dir.path()).unwrap();
        camera.replace_latest(camera.owned_path(&second.uri));

        let remaining = capture_files(dir.path());
        assert_eq!(remaining.len(), 1);
        assert_eq!(format!("file://{}", remaining[0].display()), second.uri);
    }

    #[test]
    fn release_ignores_files_it_did_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let camera = FileDialogCamera::new(dir.path().to_path_buf());
        let foreign = dir.path().join("picked.jpg");
        std::fs::write(&foreign, b"x").unwrap();

        camera.release(&format!("file://{}", foreign.display()));
        assert!(foreign.exists());
    }
}
