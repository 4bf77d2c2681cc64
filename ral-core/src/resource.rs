use ral_types::ResourceKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifies the [`crate::Renderer`] that created a resource, so that using
/// a resource with a different renderer can be caught as the CRITICAL
/// programmer error spec.md §4.1 calls "backend affinity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(u64);

static NEXT_RENDERER_ID: AtomicU64 = AtomicU64::new(1);

impl RendererId {
    pub(crate) fn next() -> Self {
        Self(NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Fields every data-model object carries, regardless of kind.
///
/// Reference counting itself is not reimplemented here: every data-model
/// struct is constructed inside an [`std::sync::Arc`] (aliased as
/// [`crate::Res`]), so `Arc::strong_count`/`Clone`/`Drop` give the exact
/// "refcount starts at 1, self-destructs synchronously at zero" semantics
/// spec.md §4.1 describes, without hand-rolling an intrusive counter. See
/// `DESIGN.md` for the rationale (this departs from the source's manual
/// `addReference`/`releaseReference`, per the Design Notes in spec.md §9).
#[derive(Debug)]
pub struct ResourceMeta {
    pub kind: ResourceKind,
    pub(crate) renderer_id: RendererId,
    debug_name: Mutex<Option<String>>,
}

impl ResourceMeta {
    pub fn new(kind: ResourceKind, renderer_id: RendererId) -> Self {
        #[cfg(feature = "statistics")]
        crate::statistics::record_create(kind);
        Self {
            kind,
            renderer_id,
            debug_name: Mutex::new(None),
        }
    }

    /// Backend-affinity check (spec.md §4.1, §4.8). Returns `Ok(())` when the
    /// resource belongs to `renderer_id`, or an error naming the mismatch
    /// otherwise. Callers in `debug-validation` builds log this at
    /// `Severity::Critical` and skip the offending command; release builds
    /// may choose to skip the check entirely for performance.
    pub fn check_affinity(&self, renderer_id: RendererId) -> Result<(), AffinityMismatch> {
        if self.renderer_id == renderer_id {
            Ok(())
        } else {
            Err(AffinityMismatch { kind: self.kind })
        }
    }

    /// Attaches a human-readable name. Decorated with the kind's short tag
    /// the way the source's `setDebugName` does (spec.md §6.6). A no-op
    /// unless compiled with `debug-validation` and a backend that supports
    /// the debug-marker extension.
    pub fn set_debug_name(&self, name: impl Into<String>) {
        let decorated = format!("{}:{}", self.kind.debug_tag(), name.into());
        *self.debug_name.lock().unwrap() = Some(decorated);
    }

    pub fn debug_name(&self) -> Option<String> {
        self.debug_name.lock().unwrap().clone()
    }
}

#[cfg(feature = "statistics")]
impl Drop for ResourceMeta {
    fn drop(&mut self) {
        crate::statistics::record_destroy(self.kind);
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("resource of kind {kind:?} used with a Renderer that did not create it")]
pub struct AffinityMismatch {
    pub kind: ResourceKind,
}

/// Implemented by every data-model struct; gives uniform access to kind,
/// debug name, and backend affinity without downcasting.
pub trait Resource {
    fn meta(&self) -> &ResourceMeta;

    fn kind(&self) -> ResourceKind {
        self.meta().kind
    }

    fn set_debug_name(&self, name: impl Into<String>) {
        self.meta().set_debug_name(name);
    }
}

/// Alias for the refcounted handle applications and group objects hold.
/// See [`ResourceMeta`] doc comment for the rationale of using `Arc` instead
/// of an intrusive counter.
pub type Res<T> = std::sync::Arc<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_mismatch_detected() {
        let a = RendererId::next();
        let b = RendererId::next();
        let meta = ResourceMeta::new(ResourceKind::VertexBuffer, a);
        assert!(meta.check_affinity(a).is_ok());
        assert!(meta.check_affinity(b).is_err());
    }

    #[test]
    fn debug_name_is_decorated_with_kind_tag() {
        let meta = ResourceMeta::new(ResourceKind::VertexBuffer, RendererId::next());
        meta.set_debug_name("player_mesh");
        assert_eq!(meta.debug_name().as_deref(), Some("VBO:player_mesh"));
    }
}
