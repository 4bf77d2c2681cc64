use ral_types::Severity;
use std::fmt;

/// Opaque native-window handle supplied by the application, consumed only by
/// swap-chain creation (spec.md §1, §6.2).
pub type NativeWindowHandle = u64;

/// Optional platform-display handle for windowing systems that need more
/// than a window handle to create a surface (spec.md §3.1 "Context").
#[derive(Debug, Clone, Copy)]
pub enum PlatformDisplayHandle {
    X11 { display: u64 },
    Wayland { display: u64 },
}

/// Process-wide services the core consumes but does not own (spec.md §3.1,
/// §6.2). Application code implements this once and hands it to the backend
/// entry point (`create_vulkan_renderer_instance`-equivalent).
pub trait Context: fmt::Debug + Send + Sync {
    /// Logs a message at the given severity. The return value mirrors the
    /// source's `RHI_LOG` contract: `true` requests the caller trigger a
    /// debugger break (only meaningful in `debug-validation` builds).
    fn log(&self, severity: Severity, file: &str, line: u32, message: &str) -> bool;

    /// Reallocates `ptr` (which may be null) from `old_size` to `new_size`
    /// bytes with the given alignment. `new_size == 0` frees and returns a
    /// dangling pointer. Most application code can simply delegate to the
    /// global allocator; this exists so embedding hosts (game engines with
    /// their own heaps) can redirect RAL allocations.
    ///
    /// # Safety
    ///
    /// `ptr` must either be null or have been returned by a prior call to
    /// this same `allocate` with a layout compatible with `old_size`/`alignment`.
    unsafe fn allocate(
        &self,
        ptr: *mut u8,
        old_size: usize,
        new_size: usize,
        alignment: usize,
    ) -> *mut u8;

    fn native_window_handle(&self) -> NativeWindowHandle;

    fn platform_display_handle(&self) -> Option<PlatformDisplayHandle> {
        None
    }
}

/// Convenience macro mirroring the source's `RHI_LOG(context, severity, ...)`
/// call sites: captures `file!()`/`line!()` so backends don't have to.
#[macro_export]
macro_rules! ral_log {
    ($context:expr, $severity:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $context.log($severity, file!(), line!(), &message)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingContext {
        messages: Mutex<Vec<(Severity, String)>>,
    }

    impl Context for RecordingContext {
        fn log(&self, severity: Severity, _file: &str, _line: u32, message: &str) -> bool {
            self.messages.lock().unwrap().push((severity, message.to_string()));
            false
        }

        unsafe fn allocate(&self, _ptr: *mut u8, _old: usize, _new: usize, _align: usize) -> *mut u8 {
            std::ptr::null_mut()
        }

        fn native_window_handle(&self) -> NativeWindowHandle {
            0
        }
    }

    #[test]
    fn ral_log_forwards_formatted_message() {
        let ctx = RecordingContext { messages: Mutex::new(Vec::new()) };
        let should_break = ral_log!(ctx, Severity::Critical, "failed: {}", 42);
        assert!(!should_break);
        let messages = ctx.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Severity::Critical);
        assert_eq!(messages[0].1, "failed: 42");
    }
}
