use thiserror::Error;

/// Resource-acquisition failure returned by value from every `create_*` call
/// (spec.md §7, §8). A `CreationError` always means "no object was created";
/// the caller is holding a null handle and the documented behavior is
/// that the *next* operation on that null logs an assertion in debug and
/// no-ops in release — so `create_*` callers in this crate are free to
/// propagate `Result` rather than returning a sentinel.
#[derive(Debug, Error)]
pub enum CreationError {
    #[error("out of device memory")]
    OutOfMemory,
    #[error("required extension or feature not available: {0}")]
    MissingCapability(&'static str),
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("backend-specific failure: {0}")]
    Backend(String),
    /// spec.md §4.1, §4.8: using a resource created by a different
    /// [`crate::renderer::Renderer`] is a CRITICAL programmer error. Caught
    /// at the point a resource is bound into another object (resource
    /// group, framebuffer, vertex array, pipeline state, ...) rather than
    /// deferred to command replay.
    #[error(transparent)]
    Affinity(#[from] crate::resource::AffinityMismatch),
}

/// Presentation-stale condition surfaced by [`crate::swap_chain`] operations
/// (spec.md §4.6, §4.8). `Outdated`/`Suboptimal` are recovered automatically
/// by swap-chain recreation; anything else aborts the frame.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface is out of date and must be reconfigured")]
    Outdated,
    #[error("surface was lost")]
    Lost,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Fatal device-level failure (spec.md §4.8: "any other non-success is
/// CRITICAL and the frame is dropped").
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("out of host or device memory")]
    OutOfMemory,
    #[error("device was lost")]
    Lost,
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
