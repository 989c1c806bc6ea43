// This is free and unencumbered software released into the public domain.

use core::ptr::null_mut;
use ndk_sys::{ANativeWindow, ANativeWindow_acquire, ANativeWindow_release};

#[derive(Debug)]
pub struct AndroidNativeWindow {
    pub(crate) handle: *mut ANativeWindow,
}

impl Drop for AndroidNativeWindow {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ANativeWindow_release(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl AndroidNativeWindow {
    /// Takes a reference on a window owned elsewhere; it is released on drop.
    pub(crate) fn acquire(handle: *mut ANativeWindow) -> Self {
        unsafe { ANativeWindow_acquire(handle) };
        Self { handle }
    }
}
