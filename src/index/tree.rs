use crate::config::ArenaConfig;
use crate::index::key::{IndexKey, KeyLayout};
use crate::storage::row::RowRef;
use std::cmp::Ordering;

/// Arena position of a node. All intra-tree links are slot indices into the
/// dense node vector, never pointers, so compaction is a pure index rewrite.
pub type SlotId = u32;

pub const INVALID_SLOT: SlotId = SlotId::MAX;

#[derive(Debug)]
struct Node<K> {
    key: K,
    /// Tiebreak carried alongside the key: assigned once at insertion,
    /// preserved across in-place replacement, strictly increasing across the
    /// life of the tree. Entries with equal keys are ordered by it.
    seq: u64,
    row: RowRef,
    parent: SlotId,
    left: SlotId,
    right: SlotId,
    height: u32,
}

/// Self-balancing ordered multi-map over (key, tiebreak) pairs, backed by a
/// compacting node arena.
///
/// Live nodes always occupy slots `0..len`. Deleting a node moves the node in
/// the last slot into the freed slot and rewrites the links that named it, so
/// memory tracks the live entry count instead of the historical peak.
/// Balancing is AVL: parent links plus stored subtree heights, retracing from
/// each structural change to the root.
#[derive(Debug)]
pub struct CompactingTree<K: IndexKey> {
    layout: KeyLayout,
    unique: bool,
    nodes: Vec<Node<K>>,
    root: SlotId,
    next_seq: u64,
}

impl<K: IndexKey> CompactingTree<K> {
    pub fn new(layout: KeyLayout, unique: bool, config: &ArenaConfig) -> Self {
        Self {
            layout,
            unique,
            nodes: Vec::with_capacity(config.initial_capacity),
            root: INVALID_SLOT,
            next_seq: 0,
        }
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert an entry for `row`. Returns false without mutating anything if
    /// the tree is unique and an equal key is already present.
    pub fn insert(&mut self, row: &RowRef) -> bool {
        debug_assert!(self.nodes.len() < INVALID_SLOT as usize);
        let key = K::extract(row, &self.layout);
        let seq = self.next_seq;

        let mut parent = INVALID_SLOT;
        let mut went_left = false;
        let mut cur = self.root;
        while cur != INVALID_SLOT {
            let by_key = key.compare(&self.node(cur).key, &self.layout);
            let ord = if self.unique {
                by_key
            } else {
                // a fresh sequence is greater than every stored one, placing
                // the new entry after its equal-key siblings
                by_key.then_with(|| seq.cmp(&self.node(cur).seq))
            };
            match ord {
                Ordering::Equal => return false,
                Ordering::Less => {
                    parent = cur;
                    went_left = true;
                    cur = self.node(cur).left;
                }
                Ordering::Greater => {
                    parent = cur;
                    went_left = false;
                    cur = self.node(cur).right;
                }
            }
        }

        let slot = self.nodes.len() as SlotId;
        self.nodes.push(Node {
            key,
            seq,
            row: row.clone(),
            parent,
            left: INVALID_SLOT,
            right: INVALID_SLOT,
            height: 1,
        });
        self.next_seq += 1;
        if parent == INVALID_SLOT {
            self.root = slot;
        } else if went_left {
            self.node_mut(parent).left = slot;
        } else {
            self.node_mut(parent).right = slot;
        }
        self.rebalance_from(parent);
        true
    }

    /// Remove the entry for exactly this row. Entries sharing the key are
    /// left untouched. Returns false if no entry references `row`.
    pub fn erase(&mut self, row: &RowRef) -> bool {
        let key = K::extract(row, &self.layout);
        let Some(slot) = self.find_exact_slot(&key, row) else {
            return false;
        };
        let freed = self.detach(slot);
        self.compact(freed);
        true
    }

    /// Whether an entry for exactly this row is present.
    pub fn exists(&self, row: &RowRef) -> bool {
        let key = K::extract(row, &self.layout);
        self.find_exact_slot(&key, row).is_some()
    }

    /// Whether any entry carries a key equal to this row's key, regardless of
    /// which row it references.
    pub fn contains_key(&self, row: &RowRef) -> bool {
        let key = K::extract(row, &self.layout);
        self.find_first(&key).is_some()
    }

    /// Re-point the entry for `old_row` at `new_row` in place. The caller
    /// guarantees the indexed columns are equal between the two row images;
    /// node position, tiebreak and tree shape are preserved and no rebalance
    /// happens. Returns false if no entry references `old_row`.
    pub fn replace_no_key_change(&mut self, old_row: &RowRef, new_row: &RowRef) -> bool {
        let key = K::extract(old_row, &self.layout);
        let Some(slot) = self.find_exact_slot(&key, old_row) else {
            return false;
        };
        let new_key = K::extract(new_row, &self.layout);
        let node = self.node_mut(slot);
        node.key = new_key;
        node.row = new_row.clone();
        true
    }

    /// Ordered iteration over all entries, non-decreasing by key, equal keys
    /// in tiebreak order.
    pub fn iter(&self) -> TreeIter<'_, K> {
        let next = if self.root == INVALID_SLOT {
            INVALID_SLOT
        } else {
            self.min_of(self.root)
        };
        TreeIter { tree: self, next }
    }

    /// Ordered iteration starting at the first entry whose key is greater
    /// than or equal to `row`'s key.
    pub fn iter_from(&self, row: &RowRef) -> TreeIter<'_, K> {
        let key = K::extract(row, &self.layout);
        TreeIter {
            tree: self,
            next: self.lower_bound(&key),
        }
    }

    fn node(&self, slot: SlotId) -> &Node<K> {
        &self.nodes[slot as usize]
    }

    fn node_mut(&mut self, slot: SlotId) -> &mut Node<K> {
        &mut self.nodes[slot as usize]
    }

    fn height(&self, slot: SlotId) -> u32 {
        if slot == INVALID_SLOT {
            0
        } else {
            self.node(slot).height
        }
    }

    fn update_height(&mut self, slot: SlotId) {
        let h = 1 + self
            .height(self.node(slot).left)
            .max(self.height(self.node(slot).right));
        self.node_mut(slot).height = h;
    }

    fn balance_factor(&self, slot: SlotId) -> i32 {
        self.height(self.node(slot).left) as i32 - self.height(self.node(slot).right) as i32
    }

    /// First slot whose key is >= `key`, i.e. the head of the equal-key run.
    fn lower_bound(&self, key: &K) -> SlotId {
        let mut candidate = INVALID_SLOT;
        let mut cur = self.root;
        while cur != INVALID_SLOT {
            match key.compare(&self.node(cur).key, &self.layout) {
                Ordering::Greater => cur = self.node(cur).right,
                _ => {
                    candidate = cur;
                    cur = self.node(cur).left;
                }
            }
        }
        candidate
    }

    fn find_first(&self, key: &K) -> Option<SlotId> {
        let slot = self.lower_bound(key);
        if slot != INVALID_SLOT
            && key.compare(&self.node(slot).key, &self.layout) == Ordering::Equal
        {
            Some(slot)
        } else {
            None
        }
    }

    /// Walk the equal-key run in tiebreak order until the node referencing
    /// exactly `row` turns up.
    fn find_exact_slot(&self, key: &K, row: &RowRef) -> Option<SlotId> {
        let mut cur = self.lower_bound(key);
        while cur != INVALID_SLOT {
            let node = self.node(cur);
            if key.compare(&node.key, &self.layout) != Ordering::Equal {
                return None;
            }
            if node.row.same_row(row) {
                return Some(cur);
            }
            cur = self.successor(cur);
        }
        None
    }

    fn min_of(&self, mut slot: SlotId) -> SlotId {
        while self.node(slot).left != INVALID_SLOT {
            slot = self.node(slot).left;
        }
        slot
    }

    fn successor(&self, slot: SlotId) -> SlotId {
        let right = self.node(slot).right;
        if right != INVALID_SLOT {
            return self.min_of(right);
        }
        let mut cur = slot;
        let mut parent = self.node(cur).parent;
        while parent != INVALID_SLOT && self.node(parent).right == cur {
            cur = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    /// Unlink the entry at `slot` from the tree and rebalance. Returns the
    /// slot that physically left the tree, which differs from `slot` when the
    /// entry payload was swapped into its in-order successor's node first.
    fn detach(&mut self, slot: SlotId) -> SlotId {
        let target = if self.node(slot).left != INVALID_SLOT
            && self.node(slot).right != INVALID_SLOT
        {
            let succ = self.min_of(self.node(slot).right);
            self.swap_payload(slot, succ);
            succ
        } else {
            slot
        };

        // target has at most one child
        let node = self.node(target);
        let child = if node.left != INVALID_SLOT {
            node.left
        } else {
            node.right
        };
        let parent = node.parent;
        self.replace_child(parent, target, child);
        if child != INVALID_SLOT {
            self.node_mut(child).parent = parent;
        }
        self.rebalance_from(parent);
        target
    }

    /// Return `freed` to the arena: the node in the last slot moves into it
    /// and every link naming the last slot is rewritten. A link still naming
    /// the old slot after this is a corruption the tests hunt for.
    fn compact(&mut self, freed: SlotId) {
        let last = (self.nodes.len() - 1) as SlotId;
        if freed != last {
            let parent = self.node(last).parent;
            let left = self.node(last).left;
            let right = self.node(last).right;
            self.nodes.swap(freed as usize, last as usize);
            if parent == INVALID_SLOT {
                self.root = freed;
            } else if self.node(parent).left == last {
                self.node_mut(parent).left = freed;
            } else {
                self.node_mut(parent).right = freed;
            }
            if left != INVALID_SLOT {
                self.node_mut(left).parent = freed;
            }
            if right != INVALID_SLOT {
                self.node_mut(right).parent = freed;
            }
        }
        self.nodes.pop();
        if self.nodes.is_empty() {
            self.root = INVALID_SLOT;
        }
    }

    fn swap_payload(&mut self, a: SlotId, b: SlotId) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b {
            (a as usize, b as usize)
        } else {
            (b as usize, a as usize)
        };
        let (head, tail) = self.nodes.split_at_mut(hi);
        let x = &mut head[lo];
        let y = &mut tail[0];
        std::mem::swap(&mut x.key, &mut y.key);
        std::mem::swap(&mut x.seq, &mut y.seq);
        std::mem::swap(&mut x.row, &mut y.row);
    }

    fn replace_child(&mut self, parent: SlotId, old: SlotId, new: SlotId) {
        if parent == INVALID_SLOT {
            self.root = new;
        } else if self.node(parent).left == old {
            self.node_mut(parent).left = new;
        } else {
            debug_assert_eq!(self.node(parent).right, old);
            self.node_mut(parent).right = new;
        }
    }

    /// Retrace from `slot` to the root, refreshing heights and rotating
    /// wherever the balance factor leaves the AVL bound.
    fn rebalance_from(&mut self, mut slot: SlotId) {
        while slot != INVALID_SLOT {
            self.update_height(slot);
            let mut subtree_root = slot;
            let bf = self.balance_factor(slot);
            if bf > 1 {
                let left = self.node(slot).left;
                if self.balance_factor(left) < 0 {
                    self.rotate_left(left);
                }
                self.rotate_right(slot);
                subtree_root = self.node(slot).parent;
            } else if bf < -1 {
                let right = self.node(slot).right;
                if self.balance_factor(right) > 0 {
                    self.rotate_right(right);
                }
                self.rotate_left(slot);
                subtree_root = self.node(slot).parent;
            }
            slot = self.node(subtree_root).parent;
        }
    }

    fn rotate_left(&mut self, x: SlotId) {
        let y = self.node(x).right;
        debug_assert_ne!(y, INVALID_SLOT);
        let t = self.node(y).left;
        let p = self.node(x).parent;
        self.replace_child(p, x, y);
        self.node_mut(y).parent = p;
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
        self.node_mut(x).right = t;
        if t != INVALID_SLOT {
            self.node_mut(t).parent = x;
        }
        self.update_height(x);
        self.update_height(y);
    }

    fn rotate_right(&mut self, x: SlotId) {
        let y = self.node(x).left;
        debug_assert_ne!(y, INVALID_SLOT);
        let t = self.node(y).right;
        let p = self.node(x).parent;
        self.replace_child(p, x, y);
        self.node_mut(y).parent = p;
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;
        self.node_mut(x).left = t;
        if t != INVALID_SLOT {
            self.node_mut(t).parent = x;
        }
        self.update_height(x);
        self.update_height(y);
    }
}

pub struct TreeIter<'a, K: IndexKey> {
    tree: &'a CompactingTree<K>,
    next: SlotId,
}

impl<'a, K: IndexKey> Iterator for TreeIter<'a, K> {
    type Item = &'a RowRef;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == INVALID_SLOT {
            return None;
        }
        let slot = self.next;
        self.next = self.tree.successor(slot);
        Some(&self.tree.node(slot).row)
    }
}
