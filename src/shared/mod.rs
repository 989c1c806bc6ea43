// This is free and unencumbered software released into the public domain.

mod bridge;
pub use bridge::*;

mod config;
pub use config::*;

mod contract;
pub use contract::*;

mod driver;
pub use driver::*;

pub mod drivers {
    pub mod synthetic;

    #[cfg(all(
        feature = "ffmpeg",
        any(target_os = "macos", target_os = "linux", target_os = "windows")
    ))]
    pub mod ffmpeg;

    #[cfg(all(feature = "android", target_os = "android"))]
    pub mod android;
}
pub use drivers::synthetic::*;

mod error;
pub use error::*;

mod fallback;
pub use fallback::*;

mod frame;
pub use frame::*;

pub mod imaging;

mod native;
pub use native::*;

mod open;
pub use open::*;
