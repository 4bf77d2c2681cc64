//! Translates [`ral_core::context::PlatformDisplayHandle`]/[`NativeWindowHandle`]
//! into the `raw-window-handle` types `ash-window` needs, shared between
//! instance creation (required extension enumeration) and swap-chain surface
//! creation (spec.md §4.6).
use ral_core::context::{NativeWindowHandle, PlatformDisplayHandle};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle,
    WindowsDisplayHandle, Win32WindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use std::ptr::NonNull;

/// No platform display handle means no `XOpenDisplay`/`wl_display` connection
/// was supplied; Win32 surfaces don't need one, so that's the fallback this
/// crate assumes rather than failing swap-chain creation outright.
pub fn raw_display_handle(platform: Option<PlatformDisplayHandle>) -> RawDisplayHandle {
    match platform {
        Some(PlatformDisplayHandle::X11 { display }) => {
            let handle = XlibDisplayHandle::new(NonNull::new(display as *mut std::ffi::c_void), 0);
            RawDisplayHandle::Xlib(handle)
        }
        Some(PlatformDisplayHandle::Wayland { display }) => {
            let display = NonNull::new(display as *mut std::ffi::c_void)
                .expect("Wayland platform display handle must not be null");
            RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display))
        }
        None => RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
    }
}

pub fn raw_window_handle(platform: Option<PlatformDisplayHandle>, window: NativeWindowHandle) -> RawWindowHandle {
    match platform {
        Some(PlatformDisplayHandle::X11 { .. }) => {
            RawWindowHandle::Xlib(XlibWindowHandle::new(window as std::os::raw::c_ulong))
        }
        Some(PlatformDisplayHandle::Wayland { .. }) => {
            let surface = NonNull::new(window as *mut std::ffi::c_void)
                .expect("Wayland native window handle must not be null");
            RawWindowHandle::Wayland(WaylandWindowHandle::new(surface))
        }
        None => {
            let hwnd = NonNull::new(window as *mut std::ffi::c_void)
                .expect("native window handle must not be null");
            RawWindowHandle::Win32(Win32WindowHandle::new(hwnd))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x11_handles_carry_the_supplied_display_and_window() {
        let platform = Some(PlatformDisplayHandle::X11 { display: 0x1000 });
        match raw_display_handle(platform) {
            RawDisplayHandle::Xlib(handle) => assert_eq!(handle.display.unwrap().as_ptr() as u64, 0x1000),
            other => panic!("expected Xlib display handle, got {other:?}"),
        }
        match raw_window_handle(platform, 0x2000) {
            RawWindowHandle::Xlib(handle) => assert_eq!(handle.window, 0x2000),
            other => panic!("expected Xlib window handle, got {other:?}"),
        }
    }

    #[test]
    fn missing_platform_display_falls_back_to_win32() {
        assert!(matches!(raw_display_handle(None), RawDisplayHandle::Windows(_)));
        assert!(matches!(raw_window_handle(None, 0x42), RawWindowHandle::Win32(_)));
    }
}
