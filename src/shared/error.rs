// This is free and unencumbered software released into the public domain.

use super::{Method, Parameter, ParameterRange};
use derive_more::Display;
use serde::Serialize;
use std::{any::Any, error::Error as StdError};
use thiserror::Error;

/// The error taxonomy visible across the bridge.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidConfiguration,
    NoActiveSession,
    AlreadyStarted,
    CameraUnavailable,
    OutOfRange,
    CaptureFailed,
    DecodeFailed,
    NotImplemented,
    UnknownMethod,
    Closed,
    Internal,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("camera is not running")]
    NoActiveSession,

    #[error("camera already started")]
    AlreadyStarted,

    #[error("camera unavailable: {reason}")]
    CameraUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    #[error("{parameter} value {value} is outside [{}, {}]", .range.min(), .range.max())]
    OutOfRange {
        parameter: Parameter,
        value: f64,
        range: ParameterRange,
    },

    #[error("capture failed while {context}")]
    CaptureFailed {
        context: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("cannot decode image {path}")]
    DecodeFailed {
        path: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Method {method} is not implemented on this platform")]
    NotImplemented { method: Method },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("bridge closed")]
    Closed,

    #[error("{method} panicked: {message}")]
    Panicked { method: Method, message: String },
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::NoActiveSession => ErrorKind::NoActiveSession,
            Self::AlreadyStarted => ErrorKind::AlreadyStarted,
            Self::CameraUnavailable { .. } => ErrorKind::CameraUnavailable,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::CaptureFailed { .. } => ErrorKind::CaptureFailed,
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::UnknownMethod(_) => ErrorKind::UnknownMethod,
            Self::Closed => ErrorKind::Closed,
            Self::Panicked { .. } => ErrorKind::Internal,
        }
    }

    #[inline]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    #[inline]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    #[inline]
    pub fn unavailable_with(
        reason: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::CameraUnavailable {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    #[inline]
    pub fn capture(context: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::CaptureFailed {
            context,
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn decode(path: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::DecodeFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn not_implemented(method: Method) -> Self {
        Self::NotImplemented { method }
    }

    /// Wraps the payload of a panic raised while running `method`.
    pub fn panicked(method: Method, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panicked { method, message }
    }

    /// The method named by the error, when it carries one.
    pub fn method(&self) -> Option<Method> {
        match self {
            Self::NotImplemented { method } | Self::Panicked { method, .. } => Some(*method),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(CameraError::NoActiveSession.kind(), ErrorKind::NoActiveSession);
        assert_eq!(
            CameraError::capture("writing picture", io::Error::other("disk full")).kind(),
            ErrorKind::CaptureFailed
        );
        assert_eq!(
            CameraError::not_implemented(Method::Capture).kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn not_implemented_names_the_method() {
        let err = CameraError::not_implemented(Method::GetIsoRange);
        assert_eq!(
            err.to_string(),
            "Method getIsoRange is not implemented on this platform"
        );
        assert_eq!(err.method(), Some(Method::GetIsoRange));
    }

    #[test]
    fn sources_are_kept_for_logs() {
        let err = CameraError::decode("a.jpg", io::Error::other("truncated"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("truncated"));
    }

    #[test]
    fn out_of_range_message_shows_bounds() {
        let range = ParameterRange::new(100.0, 800.0).unwrap();
        let err = CameraError::OutOfRange {
            parameter: Parameter::Iso,
            value: 1600.0,
            range,
        };
        assert_eq!(err.to_string(), "ISO value 1600 is outside [100, 800]");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = CameraError::panicked(Method::Capture, &"sensor exploded");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "capture panicked: sensor exploded");
        assert_eq!(err.method(), Some(Method::Capture));

        let err = CameraError::panicked(Method::Start, &String::from("boom"));
        assert_eq!(err.to_string(), "start panicked: boom");
        let err = CameraError::panicked(Method::Start, &42u8);
        assert_eq!(err.to_string(), "start panicked: unknown panic");
    }

    #[test]
    fn kind_displays_its_name() {
        assert_eq!(ErrorKind::OutOfRange.to_string(), "OutOfRange");
    }
}
