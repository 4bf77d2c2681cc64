//! Process-wide per-kind live-resource counters (spec.md §4.1 "a conforming
//! implementation MAY track how many objects of each kind are currently
//! alive"), gated behind the `statistics` feature so a release build pays
//! nothing for it. Every [`crate::resource::ResourceMeta`] increments its
//! kind's counter on construction and decrements it on drop; [`live_count`]
//! is what [`crate::renderer::Renderer`]'s `Drop` impl checks at teardown.
use ral_types::ResourceKind;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

fn counters() -> &'static Mutex<HashMap<ResourceKind, i64>> {
    static COUNTERS: OnceLock<Mutex<HashMap<ResourceKind, i64>>> = OnceLock::new();
    COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_create(kind: ResourceKind) {
    *counters().lock().unwrap().entry(kind).or_insert(0) += 1;
}

pub fn record_destroy(kind: ResourceKind) {
    *counters().lock().unwrap().entry(kind).or_insert(0) -= 1;
}

/// Sum of every kind's live count across the whole process.
pub fn live_count() -> i64 {
    counters().lock().unwrap().values().sum()
}

/// Per-kind breakdown, for diagnostics (only the kinds with a nonzero net
/// create/destroy delta are present).
pub fn live_counts_by_kind() -> HashMap<ResourceKind, i64> {
    counters().lock().unwrap().iter().filter(|(_, &count)| count != 0).map(|(&k, &v)| (k, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy_balance_to_zero() {
        let before = live_count();
        record_create(ResourceKind::VertexBuffer);
        record_create(ResourceKind::VertexBuffer);
        record_destroy(ResourceKind::VertexBuffer);
        assert_eq!(live_count(), before + 1);
        record_destroy(ResourceKind::VertexBuffer);
        assert_eq!(live_count(), before);
    }
}
