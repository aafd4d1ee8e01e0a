//! Item Positioning
//!
//! Priority bookkeeping for one owner's list: the priority of a new item and
//! the renumbering that follows a drag-and-drop move. Everything here is pure;
//! the session issues the resulting writes.

use crate::domain::{TodoId, TodoItem};

/// Outcome of a drag gesture over the displayed list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    pub source: usize,
    /// `None` when the gesture was cancelled
    pub destination: Option<usize>,
}

impl DragResult {
    pub fn moved(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination: Some(destination),
        }
    }

    pub fn cancelled(source: usize) -> Self {
        Self {
            source,
            destination: None,
        }
    }
}

/// One priority write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityUpdate {
    pub id: TodoId,
    pub from: i64,
    pub to: i64,
}

/// Priority for a newly created item: one past the highest, starting at 1
pub fn next_priority(items: &[TodoItem]) -> i64 {
    items
        .iter()
        .map(|item| item.priority)
        .max()
        .unwrap_or(0)
        .max(0)
        .saturating_add(1)
}

/// Move one element from `from` to `to` (index in the shortened list).
/// Returns false and leaves `items` alone if either index is out of range.
pub fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

/// Writes needed to make priorities dense (1..=N) in the given order
pub fn renumber(ordered: &[TodoItem]) -> Vec<PriorityUpdate> {
    ordered
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let target = index as i64 + 1;
            (item.priority != target).then(|| PriorityUpdate {
                id: item.id.clone(),
                from: item.priority,
                to: target,
            })
        })
        .collect()
}

/// Plan the writes for moving `source` to `destination` in `displayed`.
/// `None` if an index is out of range.
pub fn plan_move(displayed: &[TodoItem], source: usize, destination: usize) -> Option<Vec<PriorityUpdate>> {
    let mut reordered = displayed.to_vec();
    if !move_element(&mut reordered, source, destination) {
        return None;
    }
    Some(renumber(&reordered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTodo, UserId};
    use proptest::prelude::*;

    fn make_item(id: &str, priority: i64) -> TodoItem {
        TodoItem::from_new(TodoId::new(id), NewTodo::new(id, UserId::new("u1"), priority))
    }

    fn dense(texts: &[&str]) -> Vec<TodoItem> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| make_item(t, i as i64 + 1))
            .collect()
    }

    /// Apply a plan to a copy of the list and return it in priority order
    fn settle(items: &[TodoItem], plan: &[PriorityUpdate]) -> Vec<TodoItem> {
        let mut items = items.to_vec();
        for update in plan {
            if let Some(item) = items.iter_mut().find(|i| i.id == update.id) {
                item.priority = update.to;
            }
        }
        items.sort_by_key(|i| i.priority);
        items
    }

    #[test]
    fn test_next_priority_empty_list() {
        assert_eq!(next_priority(&[]), 1);
    }

    #[test]
    fn test_next_priority_uses_max_not_len() {
        let items = vec![make_item("a", 2), make_item("b", 9), make_item("c", 4)];
        assert_eq!(next_priority(&items), 10);
    }

    #[test]
    fn test_next_priority_ignores_negative() {
        let items = vec![make_item("a", -3)];
        assert_eq!(next_priority(&items), 1);
    }

    #[test]
    fn test_next_priority_saturates() {
        let items = vec![make_item("a", 3), make_item("b", i64::MAX)];
        assert_eq!(next_priority(&items), i64::MAX);
    }

    #[test]
    fn test_move_first_to_last() {
        let items = dense(&["A", "B", "C"]);
        let plan = plan_move(&items, 0, 2).unwrap();

        assert_eq!(plan.len(), 3);
        let result = settle(&items, &plan);
        let texts: Vec<_> = result.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["B", "C", "A"]);
        let priorities: Vec<_> = result.iter().map(|i| i.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3]);
    }

    #[test]
    fn test_adjacent_swap_writes_two() {
        let items = dense(&["A", "B", "C", "D"]);
        let plan = plan_move(&items, 1, 2).unwrap();
        let ids: Vec<_> = plan.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B"]);
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let items = dense(&["A", "B", "C"]);
        assert_eq!(plan_move(&items, 1, 1), Some(vec![]));
    }

    #[test]
    fn test_same_position_heals_gaps() {
        let items = vec![make_item("A", 1), make_item("B", 5), make_item("C", 5)];
        let plan = plan_move(&items, 0, 0).unwrap();
        assert_eq!(
            plan,
            vec![
                PriorityUpdate { id: TodoId::new("B"), from: 5, to: 2 },
                PriorityUpdate { id: TodoId::new("C"), from: 5, to: 3 },
            ]
        );
    }

    #[test]
    fn test_out_of_range() {
        let items = dense(&["A", "B"]);
        assert_eq!(plan_move(&items, 2, 0), None);
        assert_eq!(plan_move(&items, 0, 2), None);
        assert_eq!(plan_move(&[], 0, 0), None);
    }

    proptest! {
        #[test]
        fn prop_move_settles_to_dense_moved_order(
            len in 1usize..12,
            source_seed in any::<usize>(),
            dest_seed in any::<usize>(),
        ) {
            let texts: Vec<String> = (0..len).map(|i| format!("item{}", i)).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let items = dense(&refs);
            let source = source_seed % len;
            let destination = dest_seed % len;

            let plan = plan_move(&items, source, destination).unwrap();

            let mut expected = items.clone();
            move_element(&mut expected, source, destination);
            let result = settle(&items, &plan);

            let expected_ids: Vec<_> = expected.iter().map(|i| i.id.clone()).collect();
            let result_ids: Vec<_> = result.iter().map(|i| i.id.clone()).collect();
            prop_assert_eq!(expected_ids, result_ids);
            for (index, item) in result.iter().enumerate() {
                prop_assert_eq!(item.priority, index as i64 + 1);
            }

            let changed = expected
                .iter()
                .enumerate()
                .filter(|(index, item)| item.priority != *index as i64 + 1)
                .count();
            prop_assert_eq!(plan.len(), changed);
            prop_assert!(plan.len() <= len);
        }

        #[test]
        fn prop_next_priority_exceeds_all(priorities in proptest::collection::vec(0i64..1000, 0..20)) {
            let items: Vec<_> = priorities
                .iter()
                .enumerate()
                .map(|(i, p)| make_item(&format!("t{}", i), *p))
                .collect();
            let next = next_priority(&items);
            prop_assert_eq!(next, priorities.iter().copied().max().unwrap_or(0) + 1);
        }
    }
}
