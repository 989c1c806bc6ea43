// This is free and unencumbered software released into the public domain.

//! The bridge between a host runtime and a [`Camera2Plugin`].
//!
//! A single worker thread owns the plugin. Calls are queued in arrival order
//! and executed one at a time, so the camera session never sees two
//! operations interleave. Each call is answered through a [`PendingCall`].
//! A plugin panic rejects the call it happened in; later calls still run.

use crate::shared::{
    Call, Camera2Plugin, CameraError, EchoResult, ErrorKind, PLUGIN_NAME, Parameter,
    PluginConfig, Reply, open_plugin,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, channel, sync_channel},
    thread::JoinHandle,
    time::Duration,
};
use tracing::{debug, warn};

pub type CallResult = Result<Reply, CameraError>;

enum CallMsg {
    Call {
        call: Call,
        reply: SyncSender<CallResult>,
    },
    Shutdown,
}

/// The eventual result of one call. The result is delivered once.
#[derive(Debug)]
pub struct PendingCall {
    rx: Receiver<CallResult>,
}

impl PendingCall {
    fn ready(result: CallResult) -> Self {
        let (tx, rx) = sync_channel(1);
        let _ = tx.send(result);
        Self { rx }
    }

    /// Blocks until the call resolves or rejects.
    pub fn wait(self) -> CallResult {
        self.rx.recv().unwrap_or(Err(CameraError::Closed))
    }

    /// Returns the result if the call has completed.
    pub fn try_result(&mut self) -> Option<CallResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CameraError::Closed)),
        }
    }

    /// Waits up to `timeout`. The call keeps running when this returns `None`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<CallResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(CameraError::Closed)),
        }
    }
}

pub struct Bridge {
    tx: Sender<CallMsg>,
    join: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &PLUGIN_NAME)
            .field("running", &self.join.is_some())
            .finish()
    }
}

impl Bridge {
    pub fn new(mut plugin: Box<dyn Camera2Plugin>) -> Self {
        let (tx, rx) = channel::<CallMsg>();

        let join = std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    CallMsg::Call { call, reply } => {
                        let method = call.method();
                        debug!(%method, "dispatching call");
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            dispatch(plugin.as_mut(), call)
                        }))
                        .unwrap_or_else(|payload| {
                            let err = CameraError::panicked(method, payload.as_ref());
                            warn!(%method, %err, "plugin panicked");
                            Err(err)
                        });
                        if let Err(err) = &result {
                            debug!(%method, kind = %err.kind(), %err, "call rejected");
                        }
                        let _ = reply.send(result);
                    },
                    CallMsg::Shutdown => break,
                }
            }
            plugin.shutdown();
        });

        Self {
            tx,
            join: Some(join),
        }
    }

    /// Opens the platform plugin for `config`, falling back when no camera
    /// driver is available.
    pub fn open(config: &PluginConfig) -> Self {
        Self::new(open_plugin(config))
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Queues `call` behind every call submitted before it.
    pub fn invoke(&self, call: Call) -> PendingCall {
        let (reply, rx) = sync_channel(1);
        if self.tx.send(CallMsg::Call { call, reply }).is_err() {
            return PendingCall::ready(Err(CameraError::Closed));
        }
        PendingCall { rx }
    }

    pub fn call(&self, call: Call) -> CallResult {
        self.invoke(call).wait()
    }

    /// Queues a call given as a method name and an options object.
    pub fn invoke_envelope(&self, method: &str, options: Value) -> PendingCall {
        match Call::from_envelope(method, options) {
            Ok(call) => self.invoke(call),
            Err(err) => PendingCall::ready(Err(err)),
        }
    }

    /// Runs one request to completion.
    pub fn handle(&self, request: Request) -> Response {
        let result = self
            .invoke_envelope(&request.method, request.options)
            .wait();
        Response::from_result(&request.method, result)
    }

    /// Stops the worker after the calls already queued. The session, if
    /// any, is released.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(CallMsg::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Routes one call to the plugin. Exactly one plugin method runs per call.
pub fn dispatch(plugin: &mut dyn Camera2Plugin, call: Call) -> CallResult {
    match call {
        Call::Echo(options) => plugin
            .echo(options.value)
            .map(|value| Reply::Echo(EchoResult { value })),
        Call::Start(config) => plugin.start(config).map(|()| Reply::Void),
        Call::Stop => plugin.stop().map(|()| Reply::Void),
        Call::SetViewFinderSize(size) => plugin.set_view_finder_size(size).map(|()| Reply::Void),
        Call::GetShutterSpeedRange => plugin
            .parameter_range(Parameter::ShutterSpeed)
            .map(Reply::Range),
        Call::SetShutterSpeed(v) => plugin
            .set_parameter(Parameter::ShutterSpeed, v.value)
            .map(|()| Reply::Void),
        Call::GetApertureRange => plugin.parameter_range(Parameter::Aperture).map(Reply::Range),
        Call::SetAperture(v) => plugin
            .set_parameter(Parameter::Aperture, v.value)
            .map(|()| Reply::Void),
        Call::GetIsoRange => plugin.parameter_range(Parameter::Iso).map(Reply::Range),
        Call::SetIso(v) => plugin
            .set_parameter(Parameter::Iso, v.value)
            .map(|()| Reply::Void),
        Call::GetExposureCompensationInfo => plugin
            .exposure_compensation_info()
            .map(Reply::ExposureCompensation),
        Call::SetExposureCompensation(v) => plugin
            .set_parameter(Parameter::ExposureCompensation, v.value)
            .map(|()| Reply::Void),
        Call::Capture(request) => plugin.capture(request).map(|()| Reply::Void),
        Call::PictureToThumbnail(request) => {
            plugin.picture_to_thumbnail(request).map(Reply::Thumbnail)
        },
        Call::GetExifData(request) => plugin.exif_data(request).map(Reply::Exif),
    }
}

/// A call envelope from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub options: Value,
}

impl Request {
    pub fn new(method: impl Into<String>, options: Value) -> Self {
        Self {
            method: method.into(),
            options,
        }
    }
}

/// A completed call, as returned to the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Resolved { value: Value },
    Rejected { error: Rejection },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub method: String,
    pub message: String,
}

impl Response {
    pub fn from_result(method: &str, result: CallResult) -> Self {
        match result {
            Ok(reply) => Response::Resolved {
                value: serde_json::to_value(&reply).unwrap_or_default(),
            },
            Err(err) => Response::Rejected {
                error: Rejection {
                    kind: err.kind(),
                    method: method.to_string(),
                    message: err.to_string(),
                },
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Response::Resolved { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Rejected { error } => Some(error.kind),
            Response::Resolved { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{
        CameraConfiguration, CaptureRequest, EchoOptions, ExifData, ExifRequest,
        ExposureCompensationInfo, FallbackCamera, Method, NativeCamera, ParameterRange,
        SyntheticCameraDriver, Thumbnail, ThumbnailRequest, ViewFinderSize,
    };
    use serde_json::json;

    fn synthetic_bridge() -> Bridge {
        let config = PluginConfig::new(32, 24);
        Bridge::new(Box::new(NativeCamera::new(
            config.clone(),
            Box::new(SyntheticCameraDriver::new(config)),
        )))
    }

    #[test]
    fn responses_serialize_as_envelopes() {
        let bridge = Bridge::new(Box::new(FallbackCamera));
        let response = bridge.handle(Request::new("echo", json!({ "value": "hi" })));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "resolved", "value": { "value": "hi" } })
        );

        let response = bridge.handle(Request::new("getIsoRange", Value::Null));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "rejected",
                "error": {
                    "kind": "NotImplemented",
                    "method": "getIsoRange",
                    "message": "Method getIsoRange is not implemented on this platform",
                }
            })
        );
    }

    #[test]
    fn unknown_methods_never_reach_the_plugin() {
        let bridge = synthetic_bridge();
        let response = bridge.handle(Request::new("setZoom", json!({ "value": 2 })));
        assert_eq!(response.error_kind(), Some(ErrorKind::UnknownMethod));
    }

    #[test]
    fn calls_complete_in_submission_order() {
        let bridge = synthetic_bridge();
        let pending: Vec<_> = (0..32)
            .map(|i| {
                bridge.invoke(Call::Echo(EchoOptions {
                    value: i.to_string(),
                }))
            })
            .collect();
        for (i, call) in pending.into_iter().enumerate() {
            assert_eq!(
                call.wait().unwrap(),
                Reply::Echo(EchoResult {
                    value: i.to_string()
                })
            );
        }
    }

    #[test]
    fn queued_calls_observe_earlier_start() {
        let bridge = synthetic_bridge();
        let start = bridge.invoke(Call::Start(CameraConfiguration::default()));
        let range = bridge.invoke(Call::GetIsoRange);
        assert_eq!(start.wait().unwrap(), Reply::Void);
        assert!(matches!(range.wait().unwrap(), Reply::Range(Some(_))));
    }

    #[test]
    fn shutdown_releases_the_session_and_closes_the_bridge() {
        let mut bridge = synthetic_bridge();
        bridge.call(Call::Start(CameraConfiguration::default())).unwrap();
        bridge.shutdown();
        let err = bridge.call(Call::Stop).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
    }

    #[test]
    fn pending_calls_can_be_polled() {
        let bridge = synthetic_bridge();
        let mut pending = bridge.invoke(Call::Stop);
        let result = pending
            .wait_timeout(Duration::from_secs(5))
            .expect("stop should finish");
        assert_eq!(result.unwrap(), Reply::Void);

        let mut ready = PendingCall::ready(Ok(Reply::Void));
        assert!(matches!(ready.try_result(), Some(Ok(Reply::Void))));
    }

    #[test]
    fn every_method_is_dispatched_by_the_fallback() {
        let bridge = Bridge::new(Box::new(FallbackCamera));
        for method in Method::ALL {
            let options = json!({ "value": 1, "width": 1, "height": 1, "picture": "p", "path": "p" });
            let options = if method == Method::Echo {
                json!({ "value": "x" })
            } else {
                options
            };
            let response = bridge.handle(Request::new(method.to_string(), options));
            if method == Method::Echo {
                assert!(response.is_resolved());
            } else {
                let Response::Rejected { error } = response else {
                    panic!("{method} resolved on the fallback");
                };
                assert_eq!(error.kind, ErrorKind::NotImplemented);
                assert!(error.message.contains(&method.to_string()));
            }
        }
    }

    /// Panics on `start`; every other method is unreachable in these tests.
    struct PanickingCamera;

    impl Camera2Plugin for PanickingCamera {
        fn start(&mut self, _config: CameraConfiguration) -> Result<(), CameraError> {
            panic!("driver state corrupted");
        }

        fn stop(&mut self) -> Result<(), CameraError> {
            Ok(())
        }

        fn set_view_finder_size(&mut self, _size: ViewFinderSize) -> Result<(), CameraError> {
            unreachable!()
        }

        fn parameter_range(
            &mut self,
            _parameter: Parameter,
        ) -> Result<Option<ParameterRange>, CameraError> {
            unreachable!()
        }

        fn set_parameter(&mut self, _parameter: Parameter, _value: f64) -> Result<(), CameraError> {
            unreachable!()
        }

        fn exposure_compensation_info(
            &mut self,
        ) -> Result<Option<ExposureCompensationInfo>, CameraError> {
            unreachable!()
        }

        fn capture(&mut self, _request: CaptureRequest) -> Result<(), CameraError> {
            unreachable!()
        }

        fn picture_to_thumbnail(
            &mut self,
            _request: ThumbnailRequest,
        ) -> Result<Thumbnail, CameraError> {
            unreachable!()
        }

        fn exif_data(&mut self, _request: ExifRequest) -> Result<ExifData, CameraError> {
            unreachable!()
        }
    }

    #[test]
    fn a_panicking_call_rejects_without_closing_the_bridge() {
        let bridge = Bridge::new(Box::new(PanickingCamera));
        let response = bridge.handle(Request::new("start", Value::Null));
        let Response::Rejected { error } = response else {
            panic!("start resolved");
        };
        assert_eq!(error.kind, ErrorKind::Internal);
        assert_eq!(error.method, "start");
        assert!(error.message.contains("driver state corrupted"));

        let response = bridge.handle(Request::new("echo", json!({ "value": "still here" })));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "resolved", "value": { "value": "still here" } })
        );
    }

    #[test]
    fn oversized_thumbnails_are_rejected_by_the_bridge() {
        let bridge = synthetic_bridge();
        let response = bridge.handle(Request::new(
            "pictureToThumbnail",
            json!({ "picture": "/nonexistent.jpg", "width": 4294967295u32, "height": 4294967295u32 }),
        ));
        assert_eq!(response.error_kind(), Some(ErrorKind::InvalidConfiguration));
        let response = bridge.handle(Request::new("echo", json!({ "value": "ok" })));
        assert!(response.is_resolved());
    }
}
