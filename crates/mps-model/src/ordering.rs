//! Dense sibling ordering.
//!
//! Order fields are zero-based and gap-free within one parent. Any local
//! removal renumbers the surviving siblings.

use crate::entity::PlanEntity;
use crate::ids::EntityId;

/// Sort siblings by their current order and reassign `0..N-1`.
///
/// Returns the ids whose order value changed, with the new value.
pub fn renumber<T: PlanEntity>(items: &mut [T]) -> Vec<(EntityId, u32)> {
    items.sort_by_key(T::order);
    let mut changed = Vec::new();
    for (index, item) in items.iter_mut().enumerate() {
        let order = index as u32;
        if item.order() != order {
            item.set_order(order);
            changed.push((item.id().clone(), order));
        }
    }
    changed
}

/// True when the orders are exactly `0..N-1` (in any sequence).
pub fn is_dense<I>(orders: I) -> bool
where
    I: IntoIterator<Item = u32>,
{
    let mut orders: Vec<u32> = orders.into_iter().collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as u32)
}

/// Order value for an item appended after `existing` siblings.
pub fn next_order(existing: usize) -> u32 {
    existing as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Section;

    fn section(id: &str, order: u32) -> Section {
        Section::new(EntityId::new(id).unwrap(), id, order)
    }

    #[test]
    fn renumber_closes_gaps() {
        let mut sections = vec![section("A", 0), section("C", 3), section("B", 2)];
        let changed = renumber(&mut sections);
        let ids: Vec<_> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert!(is_dense(sections.iter().map(|s| s.order)));
        assert_eq!(changed.len(), 2);
    }

    #[test]
    fn is_dense_detects_duplicates_and_gaps() {
        assert!(is_dense([2, 0, 1]));
        assert!(!is_dense([0, 0, 1]));
        assert!(!is_dense([0, 2]));
        assert!(is_dense(std::iter::empty()));
    }
}
