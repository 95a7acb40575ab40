use crate::registry::SectionRegistry;
use crate::state::Snapshot;

/// `true` when no actionable section of the review is left `Unset`.
///
/// A review with no actionable sections is complete as soon as it exists. This is
/// cheap and must be re-evaluated after every transition rather than cached.
pub fn is_complete(registry: &SectionRegistry, snapshot: &Snapshot) -> bool {
    registry
        .actionable()
        .all(|name| snapshot.get(name).is_some_and(|state| state.is_settled()))
}
