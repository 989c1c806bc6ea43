// This is free and unencumbered software released into the public domain.

//! CLI helpers (error reporting, verbosity handling).
//!
//! This module must compile even when the crate feature `cli` is disabled,
//! because the library is built in non-CLI configurations.

#[cfg(feature = "cli")]
use crate::shared::{CameraError, ErrorKind};

#[cfg(feature = "cli")]
use asimov_module::SysexitsError::{self, *};

#[cfg(feature = "cli")]
use clientele::StandardOptions;

#[cfg(feature = "cli")]
pub fn handle_error(err: &CameraError, flags: &StandardOptions) -> SysexitsError {
    #[cfg(feature = "tracing")]
    {
        use asimov_module::tracing::{debug, error};

        error!(target: "camera2_plugin", %err, kind = %err.kind(), "camera2 command failed");

        if flags.debug || flags.verbose >= 2 {
            debug!(target: "camera2_plugin", ?err, "detailed error");
        }
    }

    report_error(err, flags);
    exit_code(err.kind())
}

#[cfg(feature = "cli")]
pub fn info_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("INFO: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::info!(target: "camera2_plugin", "{msg}");
}

#[cfg(feature = "cli")]
pub fn warn_user(flags: &StandardOptions, msg: &str) {
    if flags.debug || flags.verbose >= 1 {
        eprintln!("WARN: {msg}");
    }

    #[cfg(feature = "tracing")]
    asimov_module::tracing::warn!(target: "camera2_plugin", "{msg}");
}

#[cfg(feature = "cli")]
fn report_error(err: &CameraError, flags: &StandardOptions) {
    use std::error::Error as _;
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "ERROR: {err}");

    if flags.debug || flags.verbose >= 2 {
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(stderr, "  Caused by: {}", cause);
            source = cause.source();
        }
    }
}

/// The process exit status for a rejected call.
#[cfg(feature = "cli")]
pub fn exit_code(kind: ErrorKind) -> SysexitsError {
    match kind {
        ErrorKind::InvalidConfiguration => EX_USAGE,
        ErrorKind::UnknownMethod => EX_USAGE,
        ErrorKind::OutOfRange => EX_DATAERR,
        ErrorKind::NoActiveSession => EX_USAGE,
        ErrorKind::AlreadyStarted => EX_USAGE,
        ErrorKind::CameraUnavailable => EX_UNAVAILABLE,
        ErrorKind::NotImplemented => EX_UNAVAILABLE,
        ErrorKind::DecodeFailed => EX_DATAERR,
        ErrorKind::CaptureFailed => EX_IOERR,
        ErrorKind::Closed => EX_SOFTWARE,
        ErrorKind::Internal => EX_SOFTWARE,
    }
}

// When `cli` is disabled, keep the module linkable without exposing CLI-only types.
#[cfg(not(feature = "cli"))]
#[inline]
pub fn info_user(_msg: &str) {}

#[cfg(not(feature = "cli"))]
#[inline]
pub fn warn_user(_msg: &str) {}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_map_to_usage() {
        assert!(matches!(exit_code(ErrorKind::InvalidConfiguration), EX_USAGE));
        assert!(matches!(exit_code(ErrorKind::NoActiveSession), EX_USAGE));
        assert!(matches!(exit_code(ErrorKind::NotImplemented), EX_UNAVAILABLE));
    }
}
