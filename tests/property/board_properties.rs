//! Property-based tests for the pure board components.
//!
//! Uses proptest to verify:
//! 1. Filtering keeps a subsequence of its input, in input order.
//! 2. The group index partitions the filtered tasks by status.
//! 3. Dropping a task on its own slot changes nothing.
//! 4. Any valid move keeps the index a partition of the same tasks.
//! 5. Toggling the same id twice leaves a selection unchanged.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use taskboard::board::filter::{self, FilterState};
use taskboard::board::reorder;
use taskboard::board::{GroupIndex, MoveRequest, Selection, Slot};
use taskboard_proto::task::{Category, OwnerId, Task, TaskDraft, TaskId, TaskStatus};

// --- Strategies ---

/// Strategy for generating a `TaskStatus`.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

/// Strategy for generating a `Category`, including free-form ones.
fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Work),
        Just(Category::Personal),
        "[a-z]{1,6}".prop_map(Category::Other),
    ]
}

/// Strategy for generating an optional due date within one month, so that
/// date filters hit often.
fn arb_due_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((1u32..=28).prop_map(|day| NaiveDate::from_ymd_opt(2025, 3, day)))
        .prop_map(Option::flatten)
}

/// Strategy for generating a task collection with unique ids `0..n`.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(
        ("[a-c ]{0,8}", arb_status(), arb_category(), arb_due_date()),
        0..24,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(n, (title, status, category, due_date))| {
                let mut task = TaskDraft::new(title)
                    .with_status(status)
                    .with_category(category)
                    .for_owner(OwnerId::new("u"))
                    .into_task(TaskId::new(n.to_string()));
                task.due_date = due_date;
                task
            })
            .collect()
    })
}

/// Strategy for generating filter values over the same small alphabet as
/// task titles.
fn arb_filters() -> impl Strategy<Value = FilterState> {
    (
        "[a-c]{0,2}",
        prop::option::of(arb_category()),
        arb_due_date(),
    )
        .prop_map(|(search_text, category, due_date)| FilterState {
            search_text,
            category,
            due_date,
        })
}

fn all_ids(index: &GroupIndex) -> Vec<TaskId> {
    index
        .iter()
        .flat_map(|(_, ids)| ids.iter().cloned())
        .collect()
}

// --- Filter pipeline ---

proptest! {
    #[test]
    fn filter_output_is_ordered_subsequence(tasks in arb_tasks(), filters in arb_filters()) {
        let kept = filter::apply(&tasks, &filters);
        let mut rest = tasks.iter();
        for task in &kept {
            prop_assert!(filters.matches(task));
            prop_assert!(rest.any(|candidate| candidate.id == task.id));
        }
        let dropped = tasks.len() - kept.len();
        prop_assert_eq!(
            dropped,
            tasks.iter().filter(|task| !filters.matches(task)).count()
        );
    }

    #[test]
    fn empty_filters_keep_everything(tasks in arb_tasks()) {
        let kept = filter::apply(&tasks, &FilterState::default());
        prop_assert_eq!(kept.len(), tasks.len());
    }
}

// --- Group index ---

proptest! {
    #[test]
    fn index_partitions_tasks_by_status(tasks in arb_tasks()) {
        let index = GroupIndex::build(&tasks);
        prop_assert_eq!(index.len(), tasks.len());

        let unique: HashSet<_> = all_ids(&index).into_iter().collect();
        prop_assert_eq!(unique.len(), tasks.len());

        for status in TaskStatus::ALL {
            let expected: Vec<TaskId> = tasks
                .iter()
                .filter(|task| task.status == status)
                .map(|task| task.id.clone())
                .collect();
            prop_assert_eq!(index.sequence_of(status), expected.as_slice());
        }
    }
}

// --- Reorder / move engine ---

/// Strategy for generating a collection together with a valid source slot.
fn arb_tasks_with_source() -> impl Strategy<Value = (Vec<Task>, TaskId, Slot)> {
    arb_tasks()
        .prop_filter("need at least one task", |tasks| !tasks.is_empty())
        .prop_flat_map(|tasks| {
            let len = tasks.len();
            (Just(tasks), 0..len)
        })
        .prop_map(|(tasks, pick)| {
            let index = GroupIndex::build(&tasks);
            let id = tasks[pick].id.clone();
            let (status, position) = index.locate(&id).unwrap_or((TaskStatus::Todo, 0));
            (tasks, id, Slot::new(status, position))
        })
}

proptest! {
    #[test]
    fn drop_on_own_slot_is_idempotent((tasks, id, from) in arb_tasks_with_source()) {
        let index = GroupIndex::build(&tasks);
        let (next, delta) = reorder::apply(&index, &MoveRequest::new(id, from, from));
        prop_assert_eq!(next, index);
        prop_assert!(delta.is_none());
    }

    #[test]
    fn move_preserves_partition(
        (tasks, id, from) in arb_tasks_with_source(),
        to_status in arb_status(),
        to_position in 0usize..32,
    ) {
        let index = GroupIndex::build(&tasks);
        let to = Slot::new(to_status, to_position);
        let (next, delta) = reorder::apply(&index, &MoveRequest::new(id.clone(), from, to));

        prop_assert_eq!(next.len(), index.len());
        let before: HashSet<_> = all_ids(&index).into_iter().collect();
        let after: HashSet<_> = all_ids(&next).into_iter().collect();
        prop_assert_eq!(before, after);

        let (status, position) = next.locate(&id).unwrap();
        prop_assert_eq!(status, to_status);
        if to != from {
            let dest_len = index.count_of(to_status) - usize::from(from.status == to_status);
            prop_assert_eq!(position, to_position.min(dest_len));
        }
        prop_assert_eq!(delta.is_some(), from.status != to_status);
    }

    #[test]
    fn cancelled_move_changes_nothing((tasks, id, from) in arb_tasks_with_source()) {
        let index = GroupIndex::build(&tasks);
        let (next, delta) = reorder::apply(&index, &MoveRequest::cancelled(id, from));
        prop_assert_eq!(next, index);
        prop_assert!(delta.is_none());
    }
}

// --- Selection ---

proptest! {
    #[test]
    fn toggle_twice_is_identity(
        initial in prop::collection::vec(0u8..16, 0..8),
        target in 0u8..16,
    ) {
        let mut selection = Selection::default();
        for n in initial {
            let id = TaskId::new(n.to_string());
            if !selection.contains(&id) {
                selection.toggle(id);
            }
        }
        let before = selection.clone();

        let id = TaskId::new(target.to_string());
        let first = selection.toggle(id.clone());
        let second = selection.toggle(id);
        prop_assert_ne!(first, second);

        let before_ids: HashSet<_> = before.iter().cloned().collect();
        let after_ids: HashSet<_> = selection.iter().cloned().collect();
        prop_assert_eq!(before_ids, after_ids);
    }

    #[test]
    fn bulk_delete_drains_selection(ids in prop::collection::hash_set(0u8..32, 0..10)) {
        let mut selection = Selection::default();
        for n in &ids {
            selection.toggle(TaskId::new(n.to_string()));
        }
        let deltas = selection.bulk_delete();
        prop_assert_eq!(deltas.len(), ids.len());
        prop_assert!(selection.is_empty());
    }
}
