//! Dense `place_order` maintenance.
//!
//! Orders over a collection always form `1..=N`. Each planner reads the
//! whole current ordering and returns the writes that keep it dense; the
//! caller applies them in a single transaction.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: Uuid,
    pub place_order: i32,
}

/// One row whose `place_order` has to be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub id: Uuid,
    pub place_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("place order {requested} is out of range 1..={max}")]
    OutOfRange { requested: i32, max: i32 },
    #[error("item {0} is not part of the ordering")]
    UnknownItem(Uuid),
}

fn count(slots: &[Slot]) -> i32 {
    i32::try_from(slots.len()).unwrap_or(i32::MAX)
}

/// Where a new item goes and which existing rows shift to make room.
///
/// Without a request the item is appended after the current maximum. A
/// requested position may be anything in `1..=N+1`; every row at or above
/// it moves up by one.
pub fn plan_insert(
    slots: &[Slot],
    requested: Option<i32>,
) -> Result<(i32, Vec<Change>), OrderingError> {
    let Some(target) = requested else {
        let next = slots.iter().map(|s| s.place_order).max().unwrap_or(0) + 1;
        return Ok((next, Vec::new()));
    };

    let max = count(slots) + 1;
    if !(1..=max).contains(&target) {
        return Err(OrderingError::OutOfRange {
            requested: target,
            max,
        });
    }

    let shifted = slots
        .iter()
        .filter(|s| s.place_order >= target)
        .map(|s| Change {
            id: s.id,
            place_order: s.place_order + 1,
        })
        .collect();
    Ok((target, shifted))
}

/// Moves `moving` to `target` by trading places with the current occupant.
///
/// Only two rows change; rows between the old and new position keep their
/// order.
pub fn plan_swap(slots: &[Slot], moving: Uuid, target: i32) -> Result<Vec<Change>, OrderingError> {
    let max = count(slots);
    if !(1..=max).contains(&target) {
        return Err(OrderingError::OutOfRange {
            requested: target,
            max,
        });
    }

    let current = slots
        .iter()
        .find(|s| s.id == moving)
        .ok_or(OrderingError::UnknownItem(moving))?;
    if current.place_order == target {
        return Ok(Vec::new());
    }

    let mut changes = Vec::with_capacity(2);
    if let Some(occupant) = slots.iter().find(|s| s.place_order == target) {
        changes.push(Change {
            id: occupant.id,
            place_order: current.place_order,
        });
    }
    changes.push(Change {
        id: moving,
        place_order: target,
    });
    Ok(changes)
}

/// Rows that move down after the row at `deleted_order` is removed.
///
/// `slots` is the ordering without the deleted row.
pub fn plan_close_gap(slots: &[Slot], deleted_order: i32) -> Vec<Change> {
    slots
        .iter()
        .filter(|s| s.place_order > deleted_order)
        .map(|s| Change {
            id: s.id,
            place_order: s.place_order - 1,
        })
        .collect()
}

/// True when the orders are exactly `1..=N` without duplicates.
pub fn is_dense(orders: impl IntoIterator<Item = i32>) -> bool {
    let mut orders: Vec<i32> = orders.into_iter().collect();
    orders.sort_unstable();
    orders.iter().zip(1..).all(|(&o, expected)| o == expected)
}

/// Folds `changes` into `slots` in place.
pub fn apply(slots: &mut [Slot], changes: &[Change]) {
    for c in changes {
        if let Some(s) = slots.iter_mut().find(|s| s.id == c.id) {
            s.place_order = c.place_order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordering(n: i32) -> Vec<Slot> {
        (1..=n)
            .map(|place_order| Slot {
                id: Uuid::new_v4(),
                place_order,
            })
            .collect()
    }

    fn order_of(slots: &[Slot], id: Uuid) -> i32 {
        slots.iter().find(|s| s.id == id).unwrap().place_order
    }

    #[test]
    fn append_goes_after_max() {
        let slots = ordering(3);
        let (at, changes) = plan_insert(&slots, None).unwrap();
        assert_eq!(at, 4);
        assert!(changes.is_empty());
    }

    #[test]
    fn append_into_empty_starts_at_one() {
        let (at, changes) = plan_insert(&[], None).unwrap();
        assert_eq!(at, 1);
        assert!(changes.is_empty());
    }

    #[test]
    fn insert_at_front_shifts_everyone() {
        let mut slots = ordering(2);
        let (first, second) = (slots[0].id, slots[1].id);

        let (at, changes) = plan_insert(&slots, Some(1)).unwrap();
        assert_eq!(at, 1);
        apply(&mut slots, &changes);
        let new_id = Uuid::new_v4();
        slots.push(Slot {
            id: new_id,
            place_order: at,
        });

        assert_eq!(order_of(&slots, new_id), 1);
        assert_eq!(order_of(&slots, first), 2);
        assert_eq!(order_of(&slots, second), 3);
        assert!(is_dense(slots.iter().map(|s| s.place_order)));
    }

    #[test]
    fn insert_in_the_middle_leaves_lower_rows_alone() {
        let slots = ordering(4);
        let (at, changes) = plan_insert(&slots, Some(3)).unwrap();
        assert_eq!(at, 3);
        let moved: Vec<Uuid> = changes.iter().map(|c| c.id).collect();
        assert_eq!(moved, vec![slots[2].id, slots[3].id]);
        assert!(changes.iter().all(|c| c.place_order >= 4));
    }

    #[test]
    fn insert_at_n_plus_one_is_an_append() {
        let slots = ordering(3);
        let (at, changes) = plan_insert(&slots, Some(4)).unwrap();
        assert_eq!(at, 4);
        assert!(changes.is_empty());
    }

    #[test]
    fn insert_rejects_out_of_range() {
        let slots = ordering(3);
        assert_eq!(
            plan_insert(&slots, Some(0)),
            Err(OrderingError::OutOfRange { requested: 0, max: 4 })
        );
        assert_eq!(
            plan_insert(&slots, Some(6)),
            Err(OrderingError::OutOfRange { requested: 6, max: 4 })
        );
    }

    #[test]
    fn swap_trades_with_occupant_only() {
        let mut slots = ordering(5);
        let mover = slots[0].id;
        let occupant = slots[2].id;
        let untouched: Vec<(Uuid, i32)> = slots[3..].iter().map(|s| (s.id, s.place_order)).collect();
        let middle = slots[1].id;

        let changes = plan_swap(&slots, mover, 3).unwrap();
        assert_eq!(changes.len(), 2);
        apply(&mut slots, &changes);

        assert_eq!(order_of(&slots, mover), 3);
        assert_eq!(order_of(&slots, occupant), 1);
        assert_eq!(order_of(&slots, middle), 2);
        for (id, order) in untouched {
            assert_eq!(order_of(&slots, id), order);
        }
        assert!(is_dense(slots.iter().map(|s| s.place_order)));
    }

    #[test]
    fn swap_to_own_position_is_noop() {
        let slots = ordering(3);
        assert!(plan_swap(&slots, slots[1].id, 2).unwrap().is_empty());
    }

    #[test]
    fn swap_validates_bounds_and_membership() {
        let slots = ordering(3);
        assert_eq!(
            plan_swap(&slots, slots[0].id, 4),
            Err(OrderingError::OutOfRange { requested: 4, max: 3 })
        );
        assert_eq!(
            plan_swap(&slots, slots[0].id, 0),
            Err(OrderingError::OutOfRange { requested: 0, max: 3 })
        );
        let stranger = Uuid::new_v4();
        assert_eq!(
            plan_swap(&slots, stranger, 1),
            Err(OrderingError::UnknownItem(stranger))
        );
    }

    #[test]
    fn delete_closes_gap() {
        let mut slots = ordering(3);
        let removed = slots.remove(1);
        let changes = plan_close_gap(&slots, removed.place_order);
        assert_eq!(changes.len(), 1);
        apply(&mut slots, &changes);
        assert_eq!(
            slots.iter().map(|s| s.place_order).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn delete_last_changes_nothing() {
        let mut slots = ordering(3);
        let removed = slots.remove(2);
        assert!(plan_close_gap(&slots, removed.place_order).is_empty());
    }

    #[test]
    fn mixed_sequence_stays_dense() {
        let mut slots = ordering(6);
        for step in 0..20 {
            match step % 3 {
                0 => {
                    let requested = (step % 4) + 1;
                    let (at, changes) = plan_insert(&slots, Some(requested)).unwrap();
                    apply(&mut slots, &changes);
                    slots.push(Slot {
                        id: Uuid::new_v4(),
                        place_order: at,
                    });
                }
                1 => {
                    let idx = step as usize % slots.len();
                    let removed = slots.remove(idx);
                    let changes = plan_close_gap(&slots, removed.place_order);
                    apply(&mut slots, &changes);
                }
                _ => {
                    let mover = slots[0].id;
                    let target = count(&slots);
                    let changes = plan_swap(&slots, mover, target).unwrap();
                    apply(&mut slots, &changes);
                }
            }
            assert!(is_dense(slots.iter().map(|s| s.place_order)), "step {step}");
        }
    }

    #[test]
    fn is_dense_detects_gaps_and_duplicates() {
        assert!(is_dense(Vec::<i32>::new()));
        assert!(is_dense([3, 1, 2]));
        assert!(!is_dense([1, 3]));
        assert!(!is_dense([1, 1, 2]));
        assert!(!is_dense([0, 1]));
    }
}
