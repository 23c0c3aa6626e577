// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Both the camera and the rectangle detector live on the Java side in the
// host class `com.snapcrop.SnapCropHost`. Rust calls its static methods with
// a request handle; the host answers later through the `Java_…` entry points
// at the bottom of this file, which complete the parked callback.
//
// Host contract (Java):
//
//   static void capturePhoto(long handle, float quality, boolean base64);
//   static void checkForRectangle(String imageBase64, long handle);
//   static native void onCaptureResult(long handle, String base64, String uri);
//   static native void onCaptureError(long handle, String message, boolean denied);
//   static native void onDetectSuccess(long handle, String[] images);
//   static native void onDetectError(long handle, String message);
//
// Detection follows the split-callback convention and is normalized by
// `SplitCallbackDetector`.

#![cfg(target_os = "android")]

use std::sync::{Arc, LazyLock, OnceLock};

use futures::future::BoxFuture;
use jni::JNIEnv;
use jni::objects::{JClass, JObject, JObjectArray, JString, JValue};
use jni::sys::{jboolean, jlong};
use snapcrop_core::error::{Result, SnapCropError};
use snapcrop_core::types::{CaptureOptions, CapturedPhoto};
use tokio::sync::oneshot;

use crate::callback::{
    ErrorCallback, InFlight, SplitCallbackDetector, SplitCallbackModule, SuccessCallback,
};
use crate::pending::CallbackRegistry;
use crate::traits::*;

/// Fully qualified name of the Java host class.
const HOST_CLASS: &str = "com.snapcrop.SnapCropHost";

type CaptureReply = oneshot::Sender<Result<CapturedPhoto>>;

static CAPTURES: LazyLock<CallbackRegistry<CaptureReply>> = LazyLock::new(CallbackRegistry::new);
static DETECTIONS: LazyLock<CallbackRegistry<(ErrorCallback, SuccessCallback)>> =
    LazyLock::new(CallbackRegistry::new);

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

static JAVA_VM: OnceLock<jni::JavaVM> = OnceLock::new();

/// Obtain a [`JNIEnv`] handle from the global Android context, attaching the
/// current thread if needed.
fn jni_env() -> Result<jni::AttachGuard<'static>> {
    let vm = match JAVA_VM.get() {
        Some(vm) => vm,
        None => {
            let ctx = ndk_context::android_context();
            // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
            // The pointer is valid for the lifetime of the process.
            let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
                .map_err(|e| SnapCropError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
            let _ = JAVA_VM.set(vm);
            JAVA_VM
                .get()
                .ok_or_else(|| SnapCropError::Bridge("JavaVM slot is empty".into()))?
        }
    };
    vm.attach_current_thread()
        .map_err(|e| SnapCropError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// The hosting `Activity`, or an error if native code runs before it exists.
fn activity() -> Result<JObject<'static>> {
    let ptr = ndk_context::android_context().context();
    if ptr.is_null() {
        return Err(SnapCropError::Bridge(
            "Android context is null, activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

fn jni_err(context: &str, e: jni::errors::Error) -> SnapCropError {
    SnapCropError::Bridge(format!("{context}: {e}"))
}

/// Load the host class through the Activity's class loader.
///
/// `FindClass` on a natively attached thread only sees system classes.
fn host_class<'a>(env: &mut JNIEnv<'a>) -> Result<JClass<'a>> {
    let activity = activity()?;
    let loader = env
        .call_method(&activity, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .map_err(|e| jni_err("getClassLoader", e))?
        .l()
        .map_err(|e| jni_err("getClassLoader->l", e))?;
    let name = env
        .new_string(HOST_CLASS)
        .map_err(|e| jni_err("new_string(host class)", e))?;
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&name)],
        )
        .map_err(|e| jni_err("loadClass", e))?
        .l()
        .map_err(|e| jni_err("loadClass->l", e))?;
    Ok(JClass::from(class))
}

fn read_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Option<String> {
    if value.is_null() {
        return None;
    }
    env.get_string(value).ok().map(Into::into)
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the SnapCrop platform bridge.
pub struct AndroidBridge {
    camera: Arc<AndroidCamera>,
    detector: Arc<SplitCallbackDetector<JniRectangleModule>>,
}

impl AndroidBridge {
    /// Does not touch JNI; the first JNI call happens on first use.
    pub fn new() -> Self {
        Self {
            camera: Arc::new(AndroidCamera),
            detector: Arc::new(SplitCallbackDetector::new(JniRectangleModule)),
        }
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }

    fn camera(&self) -> Arc<dyn CaptureDevice> {
        self.camera.clone()
    }

    fn detector(&self) -> Arc<dyn RectangleDetector> {
        self.detector.clone()
    }
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera owned by the Java host.
pub struct AndroidCamera;

impl CaptureDevice for AndroidCamera {
    fn is_ready(&self) -> bool {
        !ndk_context::android_context().context().is_null()
    }

    fn capture_photo(&self, options: CaptureOptions) -> BoxFuture<'_, Result<CapturedPhoto>> {
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            // Released if the host fails the call or the caller stops waiting.
            let parked = CAPTURES.park_scoped(tx);
            let handle = parked.handle();
            request_capture(handle, options)?;
            tracing::info!(handle, "Android: capture requested");
            rx.await
                .map_err(|_| SnapCropError::Capture("camera request was dropped".into()))?
        })
    }
}

fn request_capture(handle: u64, options: CaptureOptions) -> Result<()> {
    let mut env = jni_env()?;
    let class = host_class(&mut env)?;
    env.call_static_method(
        &class,
        "capturePhoto",
        "(JFZ)V",
        &[
            JValue::Long(handle as jlong),
            JValue::Float(options.quality),
            JValue::Bool(options.encode_base64 as jboolean),
        ],
    )
    .map_err(|e| jni_err("SnapCropHost.capturePhoto", e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Rectangle detector
// ---------------------------------------------------------------------------

/// Split-callback detector module backed by `SnapCropHost.checkForRectangle`.
pub struct JniRectangleModule;

impl SplitCallbackModule for JniRectangleModule {
    fn check_for_rectangle(
        &self,
        image_base64: String,
        on_error: ErrorCallback,
        on_success: SuccessCallback,
    ) -> InFlight {
        let parked = DETECTIONS.park_scoped((on_error, on_success));
        let handle = parked.handle();
        if let Err(e) = request_detection(handle, &image_base64) {
            tracing::error!(handle, error = %e, "Android: detector call failed");
            if let Some((on_error, _)) = DETECTIONS.take(handle) {
                on_error(e.to_string());
            }
            return InFlight::done();
        }
        InFlight::holding(parked)
    }
}

fn request_detection(handle: u64, image_base64: &str) -> Result<()> {
    let mut env = jni_env()?;
    let class = host_class(&mut env)?;
    let j_image = env
        .new_string(image_base64)
        .map_err(|e| jni_err("new_string(image)", e))?;
    env.call_static_method(
        &class,
        "checkForRectangle",
        "(Ljava/lang/String;J)V",
        &[JValue::Object(&j_image), JValue::Long(handle as jlong)],
    )
    .map_err(|e| jni_err("SnapCropHost.checkForRectangle", e))?;
    tracing::info!(handle, "Android: detection requested");
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry points called by the Java host
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_snapcrop_SnapCropHost_onCaptureResult<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
    base64: JString<'local>,
    uri: JString<'local>,
) {
    let Some(reply) = CAPTURES.take(handle as u64) else {
        return;
    };
    let base64 = read_string(&mut env, &base64).unwrap_or_default();
    let result = match read_string(&mut env, &uri) {
        Some(uri) => Ok(CapturedPhoto::new(base64, uri)),
        None => Err(SnapCropError::Capture("camera returned no photo location".into())),
    };
    let _ = reply.send(result);
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_snapcrop_SnapCropHost_onCaptureError<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
    message: JString<'local>,
    denied: jboolean,
) {
    let Some(reply) = CAPTURES.take(handle as u64) else {
        return;
    };
    let err = if denied != 0 {
        SnapCropError::CameraPermissionDenied
    } else {
        match read_string(&mut env, &message) {
            Some(message) if message == "cancelled" => SnapCropError::CaptureCancelled,
            Some(message) => SnapCropError::Capture(message),
            None => SnapCropError::Capture("unknown camera error".into()),
        }
    };
    let _ = reply.send(Err(err));
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_snapcrop_SnapCropHost_onDetectSuccess<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
    images: JObjectArray<'local>,
) {
    let Some((on_error, on_success)) = DETECTIONS.take(handle as u64) else {
        return;
    };
    match read_slots(&mut env, &images) {
        Ok(slots) => on_success(slots),
        Err(e) => on_error(e.to_string()),
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_snapcrop_SnapCropHost_onDetectError<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    handle: jlong,
    message: JString<'local>,
) {
    let Some((on_error, _)) = DETECTIONS.take(handle as u64) else {
        return;
    };
    let message = read_string(&mut env, &message).unwrap_or_else(|| "unknown detector error".into());
    on_error(message);
}

/// Read a nullable `String[]` into image slots.
fn read_slots(env: &mut JNIEnv<'_>, images: &JObjectArray<'_>) -> Result<Vec<Option<String>>> {
    if images.is_null() {
        return Ok(Vec::new());
    }
    let len = env
        .get_array_length(images)
        .map_err(|e| jni_err("get_array_length", e))?;
    let mut slots = Vec::with_capacity(len as usize);
    for i in 0..len {
        let element = env
            .get_object_array_element(images, i)
            .map_err(|e| jni_err("get_object_array_element", e))?;
        slots.push(read_string(env, &JString::from(element)));
    }
    Ok(slots)
}
