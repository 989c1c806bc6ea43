// This is free and unencumbered software released into the public domain.

//! Camera2 plugin: camera control for a host runtime.
//!
//! Hosts talk to a [`shared::Bridge`], which forwards each call to either a
//! native camera session or, where no camera driver exists, a fallback that
//! answers everything but `echo` with `NotImplemented`.
//!
//! ```no_run
//! use camera2_plugin::shared::{Bridge, PluginConfig, Request};
//! use serde_json::json;
//!
//! let bridge = Bridge::open(&PluginConfig::default());
//! let response = bridge.handle(Request::new("start", json!({ "width": 640, "height": 480 })));
//! println!("{}", serde_json::to_string(&response).unwrap());
//! ```

pub mod cli;
pub mod ffi;
pub mod shared;
