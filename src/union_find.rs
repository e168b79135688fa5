//! Disjoint-set forest over arbitrary labels.
//!
//! Elements join lazily through [`UnionFind::make_set`]; sets only ever
//! merge. `find` compresses paths through a shared reference, so lookups
//! stay cheap without exclusive access.

use std::cell::Cell;
use std::hash::Hash;

use ahash::AHashMap;

/// Position of an element inside the forest's parent table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot(usize);

/// Union-find with path compression and union by rank.
#[derive(Clone, Debug)]
pub struct UnionFind<T> {
    slots: AHashMap<T, Slot>,
    labels: Vec<T>,
    parents: Vec<Cell<Slot>>,
    ranks: Vec<u32>,
    sets: usize,
}

impl<T> Default for UnionFind<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnionFind<T> {
    pub fn new() -> Self {
        UnionFind {
            slots: AHashMap::new(),
            labels: Vec::new(),
            parents: Vec::new(),
            ranks: Vec::new(),
            sets: 0,
        }
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of disjoint sets currently in the forest.
    pub fn set_count(&self) -> usize {
        self.sets
    }

    fn root_of(&self, slot: Slot) -> Slot {
        let parent = self.parents[slot.0].get();
        if parent == slot {
            return slot;
        }
        let root = self.root_of(parent);
        self.parents[slot.0].set(root);
        root
    }
}

impl<T: Clone + Eq + Hash> UnionFind<T> {
    /// Registers `x` as its own singleton set. Known elements are left
    /// untouched.
    pub fn make_set(&mut self, x: T) {
        if self.slots.contains_key(&x) {
            return;
        }
        let slot = Slot(self.labels.len());
        self.slots.insert(x.clone(), slot);
        self.labels.push(x);
        self.parents.push(Cell::new(slot));
        self.ranks.push(0);
        self.sets += 1;
    }

    /// Representative label of the set containing `x`, `None` for elements
    /// never registered.
    pub fn find(&self, x: &T) -> Option<&T> {
        let slot = *self.slots.get(x)?;
        Some(&self.labels[self.root_of(slot).0])
    }

    /// Whether `x` and `y` sit in the same set. Unregistered elements sit
    /// in no set at all.
    pub fn connected(&self, x: &T, y: &T) -> bool {
        match (self.slots.get(x), self.slots.get(y)) {
            (Some(&a), Some(&b)) => self.root_of(a) == self.root_of(b),
            _ => false,
        }
    }

    /// Merges the sets containing `x` and `y`: the lower-rank root goes
    /// under the higher; on a tie the second root absorbs the first and
    /// its rank grows. Returns whether a merge happened.
    pub fn union(&mut self, x: &T, y: &T) -> bool {
        let (sx, sy) = match (self.slots.get(x), self.slots.get(y)) {
            (Some(&a), Some(&b)) => (a, b),
            _ => return false,
        };
        let rx = self.root_of(sx);
        let ry = self.root_of(sy);
        if rx == ry {
            return false;
        }
        if self.ranks[rx.0] > self.ranks[ry.0] {
            self.parents[ry.0].set(rx);
        } else {
            self.parents[rx.0].set(ry);
            if self.ranks[rx.0] == self.ranks[ry.0] {
                self.ranks[ry.0] += 1;
            }
        }
        self.sets -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_set_is_idempotent() {
        let mut uf = UnionFind::new();
        uf.make_set('a');
        uf.make_set('a');
        uf.make_set('b');
        assert_eq!(uf.len(), 2);
        assert_eq!(uf.set_count(), 2);
    }

    #[test]
    fn singletons_are_their_own_representative() {
        let mut uf = UnionFind::new();
        uf.make_set("x");
        assert_eq!(uf.find(&"x"), Some(&"x"));
        assert_eq!(uf.find(&"missing"), None);
        assert!(!uf.connected(&"x", &"missing"));
    }

    #[test]
    fn union_merges_and_reports() {
        let mut uf = UnionFind::new();
        for v in ['a', 'b', 'c', 'd'] {
            uf.make_set(v);
        }
        assert!(uf.union(&'a', &'b'));
        assert!(uf.union(&'c', &'d'));
        assert!(!uf.connected(&'a', &'c'));
        assert!(uf.union(&'b', &'c'));
        assert!(uf.connected(&'a', &'d'));
        // already merged
        assert!(!uf.union(&'a', &'d'));
        assert_eq!(uf.set_count(), 1);
    }

    #[test]
    fn equal_rank_tie_goes_to_the_second_root() {
        let mut uf = UnionFind::new();
        uf.make_set(1);
        uf.make_set(2);
        assert!(uf.union(&1, &2));
        assert_eq!(uf.find(&1), Some(&2));
        assert_eq!(uf.find(&2), Some(&2));
    }

    #[test]
    fn union_with_unregistered_element_is_a_no_op() {
        let mut uf = UnionFind::new();
        uf.make_set(1);
        assert!(!uf.union(&1, &99));
        assert_eq!(uf.set_count(), 1);
    }

    #[test]
    fn chains_compress_to_a_single_root() {
        let mut uf = UnionFind::new();
        for v in 0..8 {
            uf.make_set(v);
        }
        for v in 0..7 {
            uf.union(&v, &(v + 1));
        }
        let root = *uf.find(&0).unwrap();
        for v in 0..8 {
            assert_eq!(uf.find(&v), Some(&root));
        }
        assert_eq!(uf.set_count(), 1);
    }
}
