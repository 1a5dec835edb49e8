//! Ordered open set with decrease-key.
//!
//! Entries are ordered by `(f, position)`. Each position appears at most once:
//! pushing a position that is already queued removes the old entry first, so
//! a node whose cost improved never leaves a stale duplicate behind.

use std::collections::{BTreeSet, HashMap};

use crate::core::GridCoord;

#[derive(Debug, Default)]
pub(super) struct Frontier {
    order: BTreeSet<(i64, GridCoord)>,
    queued: HashMap<GridCoord, i64>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, position: GridCoord) -> bool {
        self.queued.contains_key(&position)
    }

    /// Insert or re-key `position` with priority `f`.
    pub fn push(&mut self, position: GridCoord, f: i64) {
        if let Some(old) = self.queued.insert(position, f) {
            self.order.remove(&(old, position));
        }
        self.order.insert((f, position));
    }

    /// Remove and return the entry with the smallest `(f, position)`.
    pub fn pop_min(&mut self) -> Option<GridCoord> {
        let (_, position) = self.order.pop_first()?;
        self.queued.remove(&position);
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_by_f_then_position() {
        let mut frontier = Frontier::new();
        frontier.push(GridCoord::new(5, 0, 0), 3);
        frontier.push(GridCoord::new(1, 0, 0), 7);
        frontier.push(GridCoord::new(0, 0, 9), 3);

        assert_eq!(frontier.pop_min(), Some(GridCoord::new(0, 0, 9)));
        assert_eq!(frontier.pop_min(), Some(GridCoord::new(5, 0, 0)));
        assert_eq!(frontier.pop_min(), Some(GridCoord::new(1, 0, 0)));
        assert_eq!(frontier.pop_min(), None);
    }

    #[test]
    fn test_rekey_leaves_no_stale_entry() {
        let mut frontier = Frontier::new();
        let p = GridCoord::new(2, 2, 2);
        frontier.push(p, 40);
        frontier.push(GridCoord::new(0, 0, 0), 20);
        frontier.push(p, 10);

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.pop_min(), Some(p));
        assert!(!frontier.contains(p));
        assert_eq!(frontier.pop_min(), Some(GridCoord::new(0, 0, 0)));
        assert!(frontier.is_empty());
    }
}
