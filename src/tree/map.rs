//! The `BtreeMap` itself: typed key/value layer, descent, and the
//! split/merge/lift cascades.
//!
//! All public mutations enter here. The map descends to a leaf by separator
//! search, attempts the page operation, and turns page-level `NoSpace` into
//! structure: compaction first, then a split that may cascade to the root.
//! Erasure drives the reverse cascades (empty-page removal, separator
//! rewrite, sibling merge, root collapse).

use std::cmp::Ordering;
use std::marker::PhantomData;

use smallvec::SmallVec;
use tracing::trace;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::arena::{PageArena, ROOT};
use super::iter::{ItemIter, ItemPos, Iter, PageIter};
use crate::error::BtreeError;
use crate::page::{KeyCompare, Page, PageId, SlotIndex, PAGE_SIZE};

/// Key bound: totally ordered, fixed-size, byte-round-trippable.
pub trait MapKey: Ord + Copy + FromBytes + IntoBytes + Immutable + KnownLayout {}

impl<T: Ord + Copy + FromBytes + IntoBytes + Immutable + KnownLayout> MapKey for T {}

/// Value bound: fixed-size, byte-round-trippable.
pub trait MapValue: Copy + FromBytes + IntoBytes + Immutable + KnownLayout {}

impl<T: Copy + FromBytes + IntoBytes + Immutable + KnownLayout> MapValue for T {}

/// Byte comparator that decodes `K` and defers to its `Ord`.
pub struct NativeCompare<K>(PhantomData<K>);

impl<K: MapKey> KeyCompare for NativeCompare<K> {
    fn compare(key0: &[u8], key1: &[u8]) -> Ordering {
        let k0 = K::read_from_bytes(key0).expect("stored key bytes match the key type");
        let k1 = K::read_from_bytes(key1).expect("stored key bytes match the key type");
        k0.cmp(&k1)
    }
}

pub(crate) type TreePage<K, const P: usize> = Page<NativeCompare<K>, P>;

/// Ordered map over a B+tree of slotted pages.
///
/// `P` is the page size in bytes (power of two, 128..=32768). Leaves store
/// `(K, V)` records; branches store `(K, PageId)` records whose key is a
/// lower bound of the child subtree.
pub struct BtreeMap<K, V, const P: usize = PAGE_SIZE> {
    arena: PageArena<NativeCompare<K>, P>,
    _marker: PhantomData<(K, V)>,
}

impl<K: MapKey, V: MapValue, const P: usize> BtreeMap<K, V, P> {
    pub fn new() -> Self {
        let mut root = Page::new();
        root.set_level(0);
        Self {
            arena: PageArena::new(root),
            _marker: PhantomData,
        }
    }

    pub(crate) fn page(&self, id: PageId) -> &TreePage<K, P> {
        self.arena.get(id)
    }

    fn page_mut(&mut self, id: PageId) -> &mut TreePage<K, P> {
        self.arena.get_mut(id)
    }

    pub(crate) fn key_at(&self, id: PageId, slot: u16) -> K {
        K::read_from_bytes(self.page(id).key_at(slot as usize))
            .expect("stored key bytes match the key type")
    }

    pub(crate) fn value_at(&self, id: PageId, slot: u16) -> V {
        V::read_from_bytes(self.page(id).value_at(slot as usize))
            .expect("stored value bytes match the value type")
    }

    fn child_at(&self, id: PageId, slot: u16) -> PageId {
        debug_assert!(self.page(id).is_branch());
        PageId::read_from_bytes(self.page(id).value_at(slot as usize))
            .expect("branch value bytes are a page id")
    }

    fn num_records(&self, id: PageId) -> usize {
        self.page(id).num_records()
    }

    /// Slot whose key range covers `key`, clamped to the page bounds.
    fn slot_for(&self, id: PageId, key: &[u8]) -> u16 {
        match self.page(id).search(key) {
            SlotIndex::At(i) => i,
            SlotIndex::Lower => 0,
            SlotIndex::Upper => (self.num_records(id) - 1) as u16,
            SlotIndex::Empty => unreachable!("separator search on an empty page"),
        }
    }

    /// The leaf whose key range covers `key`. Never fails; an empty tree
    /// yields the root leaf.
    fn search_leaf(&self, key: &K) -> PageId {
        let mut id = ROOT;
        while !self.page(id).is_leaf() {
            let slot = self.slot_for(id, key.as_bytes());
            id = self.child_at(id, slot);
        }
        id
    }

    /// Inserts a record. Returns false (and leaves the contents unchanged)
    /// if the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let record_size = size_of::<K>() + size_of::<V>();
        let mut leaf = self.search_leaf(&key);

        if !self.page(leaf).can_insert(record_size) && self.page(leaf).should_gc() {
            self.page_mut(leaf).gc();
        }
        if !self.page(leaf).can_insert(record_size) {
            leaf = self.split_leaf(leaf, &key);
        }

        match self.page_mut(leaf).insert(key.as_bytes(), value.as_bytes()) {
            Ok(()) => true,
            Err(BtreeError::KeyExists) => false,
            Err(err) => unreachable!("leaf insert cannot fail after split: {err}"),
        }
    }

    /// Erases the record with `key`. Returns false if absent.
    pub fn erase(&mut self, key: &K) -> bool {
        let pos = self.lower_bound_pos(key);
        let Some((id, slot)) = pos.get() else {
            return false;
        };
        if self.key_at(id, slot) != *key {
            return false;
        }
        self.erase_at(pos);
        true
    }

    /// First item with key >= `key`, or the end iterator.
    pub fn lower_bound(&self, key: &K) -> ItemIter<'_, K, V, P> {
        ItemIter::new(self, self.lower_bound_pos(key))
    }

    pub(crate) fn lower_bound_pos(&self, key: &K) -> ItemPos {
        let leaf = self.search_leaf(key);
        match self.page(leaf).lower_bound(key.as_bytes()) {
            SlotIndex::At(i) => ItemPos::at(leaf, i),
            // Above every record in this leaf (or the tree is empty): the
            // answer is the first record of the next leaf, if any.
            _ => match self.next_leaf(leaf) {
                Some(next) => match self.page(next).lower_bound(key.as_bytes()) {
                    SlotIndex::At(i) => ItemPos::at(next, i),
                    _ => ItemPos::end(),
                },
                None => ItemPos::end(),
            },
        }
    }

    /// Erases the item at `pos` and returns the position of the item that
    /// followed it (end if none).
    pub fn erase_at(&mut self, pos: ItemPos) -> ItemPos {
        let (id, slot) = pos.get().expect("erase_at requires a valid position");
        let last_key = self.key_at(id, slot);
        let next_key = self.next_item_key(id, slot);

        if self.num_records(id) == 1 {
            self.page_mut(id).erase_slot(slot);
            self.delete_empty_page(id, &last_key);
            self.lift_up();
        } else {
            let is_begin = slot == 0;
            self.page_mut(id).erase_slot(slot);
            if is_begin {
                self.update_min_key(id);
            }
            self.try_merge(id);
            self.lift_up();
        }

        // Structural cascades can free or relocate pages, so the successor
        // is re-found by key rather than by (page, slot).
        match next_key {
            Some(key) => self.lower_bound_pos(&key),
            None => ItemPos::end(),
        }
    }

    fn next_item_key(&self, id: PageId, slot: u16) -> Option<K> {
        if (slot as usize) + 1 < self.num_records(id) {
            Some(self.key_at(id, slot + 1))
        } else {
            self.next_leaf(id).map(|next| self.key_at(next, 0))
        }
    }

    /// Frees all non-root pages and resets the root to an empty leaf.
    pub fn clear(&mut self) {
        if self.page(ROOT).is_branch() {
            let children: SmallVec<[PageId; 16]> = (0..self.num_records(ROOT))
                .map(|i| self.child_at(ROOT, i as u16))
                .collect();
            for child in children {
                self.delete_recursive(child);
            }
        }
        let root = self.page_mut(ROOT);
        root.clear();
        root.set_level(0);
    }

    fn delete_recursive(&mut self, id: PageId) {
        if self.page(id).is_branch() {
            let children: SmallVec<[PageId; 16]> = (0..self.num_records(id))
                .map(|i| self.child_at(id, i as u16))
                .collect();
            for child in children {
                self.delete_recursive(child);
            }
        }
        self.arena.free(id);
    }

    /// Number of records, by walking the leaves in order.
    pub fn size(&self) -> usize {
        let mut total = 0;
        let mut page = Some(self.leftmost_leaf());
        while let Some(id) = page {
            total += self.num_records(id);
            page = self.next_leaf(id);
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        let root = self.page(ROOT);
        root.is_leaf() && root.is_empty()
    }

    /// Level of the root page; 0 means the whole map is a single leaf.
    pub fn height(&self) -> u16 {
        self.page(ROOT).level()
    }

    /// Live page count, root included.
    pub fn num_pages(&self) -> usize {
        self.arena.len()
    }

    /// Structural audit: every branch record names a live child one level
    /// down whose parent reference points back, and no child is empty.
    pub fn is_valid(&self) -> bool {
        self.validate(ROOT)
    }

    fn validate(&self, id: PageId) -> bool {
        let page = self.page(id);
        if page.is_leaf() {
            return page.is_valid();
        }
        if !page.is_valid() {
            return false;
        }
        let level = page.level();
        for i in 0..page.num_records() {
            let child = self.child_at(id, i as u16);
            let child_page = self.page(child);
            if child_page.level() + 1 != level {
                return false;
            }
            if child_page.parent() != Some(id) {
                return false;
            }
            if child_page.is_empty() {
                return false;
            }
            if !self.validate(child) {
                return false;
            }
        }
        true
    }

    pub fn begin_item(&self) -> ItemIter<'_, K, V, P> {
        let leaf = self.leftmost_leaf();
        let pos = if self.page(leaf).is_empty() {
            ItemPos::end()
        } else {
            ItemPos::at(leaf, 0)
        };
        ItemIter::new(self, pos)
    }

    pub fn end_item(&self) -> ItemIter<'_, K, V, P> {
        ItemIter::new(self, ItemPos::end())
    }

    pub fn begin_page(&self) -> PageIter<'_, K, V, P> {
        PageIter::new(self, Some(self.leftmost_leaf()))
    }

    pub fn end_page(&self) -> PageIter<'_, K, V, P> {
        PageIter::new(self, None)
    }

    /// In-order iterator over `(K, V)` pairs.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter::new(self.begin_item())
    }

    fn decode_key(bytes: &[u8]) -> K {
        K::read_from_bytes(bytes).expect("stored key bytes match the key type")
    }

    /// Splits the full leaf `id` and returns the id of the half that
    /// should receive `key`.
    fn split_leaf(&mut self, id: PageId, key: &K) -> PageId {
        debug_assert!(self.page(id).is_leaf());
        let parent = self.page(id).parent();
        let (p0, p1) = self.page_mut(id).split();
        debug_assert!(!p0.is_empty() && !p1.is_empty());
        let k0 = Self::decode_key(p0.min_key());
        let k1 = Self::decode_key(p1.min_key());
        trace!(page = id.index(), "splitting leaf");

        let (id0, id1) = self.install_halves(id, parent, p0, p1, k0, k1, 0);
        if *key < k1 {
            id0
        } else {
            id1
        }
    }

    /// Splits the full branch `id`. Returns the branch that should receive
    /// `key0` and the one that should receive `key1`.
    fn split_branch(&mut self, id: PageId, key0: &K, key1: &K) -> (PageId, PageId) {
        debug_assert!(self.page(id).is_branch());
        let level = self.page(id).level();
        let parent = self.page(id).parent();
        let (p0, p1) = self.page_mut(id).split();
        debug_assert!(!p0.is_empty() && !p1.is_empty());
        let k0 = Self::decode_key(p0.min_key());
        let k1 = Self::decode_key(p1.min_key());
        trace!(page = id.index(), level, "splitting branch");

        let (id0, id1) = self.install_halves(id, parent, p0, p1, k0, k1, level);

        // The children of both halves still name the split page.
        self.reparent_children(id0);
        self.reparent_children(id1);

        (
            if *key0 < k1 { id0 } else { id1 },
            if *key1 < k1 { id0 } else { id1 },
        )
    }

    /// Installs the two halves of a split in place of `old`, growing the
    /// tree at the root or cascading a split into the parent as needed.
    fn install_halves(
        &mut self,
        old: PageId,
        parent: Option<PageId>,
        mut p0: TreePage<K, P>,
        mut p1: TreePage<K, P>,
        k0: K,
        k1: K,
        level: u16,
    ) -> (PageId, PageId) {
        match parent {
            None => {
                // `old` is the root, emptied by the split; reuse it as the
                // branch above both halves.
                debug_assert_eq!(old, ROOT);
                p0.set_parent(Some(old));
                p1.set_parent(Some(old));
                let id0 = self.arena.alloc(p0);
                let id1 = self.arena.alloc(p1);
                let root = self.page_mut(old);
                root.insert(k0.as_bytes(), id0.as_bytes())
                    .expect("fresh root branch accepts the left half");
                root.insert(k1.as_bytes(), id1.as_bytes())
                    .expect("fresh root branch accepts the right half");
                root.set_level(level + 1);
                (id0, id1)
            }
            Some(parent_id) => {
                let record_size = size_of::<K>() + size_of::<PageId>();
                let mut par0 = parent_id;
                let mut par1 = parent_id;
                if !self.page(parent_id).can_insert(record_size) {
                    self.page_mut(parent_id).gc();
                }
                if !self.page(parent_id).can_insert(record_size) {
                    (par0, par1) = self.split_branch(parent_id, &k0, &k1);
                }
                p0.set_parent(Some(par0));
                p1.set_parent(Some(par1));
                let id0 = self.arena.alloc(p0);
                let id1 = self.arena.alloc(p1);

                let slot = self.slot_for(par0, k0.as_bytes());
                debug_assert_eq!(self.child_at(par0, slot), old);
                let k2 = self.key_at(par0, slot);
                if k2 == k0 {
                    self.page_mut(par0)
                        .update(k0.as_bytes(), id0.as_bytes())
                        .expect("child record rewrite fits in place");
                } else {
                    // The record key lags the subtree minimum (its original
                    // leftmost key was deleted after installation), so an
                    // in-place update would file the half under the stale
                    // key; replace the record instead.
                    let erased = self.page_mut(par0).erase(k2.as_bytes());
                    debug_assert!(erased);
                    self.page_mut(par0)
                        .insert(k0.as_bytes(), id0.as_bytes())
                        .expect("split parent has room for the left half");
                }
                // par0 and par1 may be the same page; compaction can be
                // needed again before the second record goes in.
                if !self.page(par1).can_insert(record_size) {
                    self.page_mut(par1).gc();
                }
                self.page_mut(par1)
                    .insert(k1.as_bytes(), id1.as_bytes())
                    .expect("split parent has room for the right half");
                self.arena.free(old);
                (id0, id1)
            }
        }
    }

    fn reparent_children(&mut self, id: PageId) {
        self.reparent_children_to(id, id);
    }

    fn reparent_children_to(&mut self, id: PageId, new_parent: PageId) {
        let children: SmallVec<[PageId; 16]> = (0..self.num_records(id))
            .map(|i| self.child_at(id, i as u16))
            .collect();
        for child in children {
            self.page_mut(child).set_parent(Some(new_parent));
        }
    }

    /// The parent page and the slot of `id`'s record within it.
    pub(crate) fn parent_record(&self, id: PageId) -> (PageId, u16) {
        let page = self.page(id);
        debug_assert!(!page.is_empty());
        let parent = page.parent().expect("non-root page has a parent");

        let mut slot = self.slot_for(parent, page.min_key());
        // The record key may lag the current subtree minimum after
        // deletions; the child is then one slot further right.
        if self.child_at(parent, slot) != id {
            slot += 1;
        }
        debug_assert!((slot as usize) < self.num_records(parent));
        debug_assert_eq!(self.child_at(parent, slot), id);
        (parent, slot)
    }

    /// Leaf to the right of `id`, via the parent-record walk.
    pub(crate) fn next_leaf(&self, id: PageId) -> Option<PageId> {
        debug_assert!(self.page(id).is_leaf());
        if self.page(id).parent().is_none() {
            return None;
        }
        let mut p = id;
        loop {
            let (parent, slot) = self.parent_record(p);
            if (slot as usize) + 1 < self.num_records(parent) {
                p = self.child_at(parent, slot + 1);
                break;
            }
            p = parent;
            if self.page(p).parent().is_none() {
                return None;
            }
        }
        while !self.page(p).is_leaf() {
            p = self.child_at(p, 0);
        }
        debug_assert_ne!(p, id);
        Some(p)
    }

    /// Leaf to the left of `id`.
    pub(crate) fn prev_leaf(&self, id: PageId) -> Option<PageId> {
        debug_assert!(self.page(id).is_leaf());
        if self.page(id).parent().is_none() {
            return None;
        }
        let mut p = id;
        loop {
            let (parent, slot) = self.parent_record(p);
            if slot > 0 {
                p = self.child_at(parent, slot - 1);
                break;
            }
            p = parent;
            if self.page(p).parent().is_none() {
                return None;
            }
        }
        while !self.page(p).is_leaf() {
            p = self.child_at(p, (self.num_records(p) - 1) as u16);
        }
        debug_assert_ne!(p, id);
        Some(p)
    }

    pub(crate) fn leftmost_leaf(&self) -> PageId {
        let mut p = ROOT;
        while !self.page(p).is_leaf() {
            p = self.child_at(p, 0);
        }
        p
    }

    pub(crate) fn rightmost_leaf(&self) -> PageId {
        let mut p = ROOT;
        while !self.page(p).is_leaf() {
            p = self.child_at(p, (self.num_records(p) - 1) as u16);
        }
        p
    }

    /// Unlinks an emptied page from its parent, cascading while ancestors
    /// become empty. The root is left in place even when empty.
    ///
    /// `key` is the last key erased from the page: it is still a valid
    /// locator for the page's record in the parent.
    fn delete_empty_page(&mut self, id: PageId, key: &K) {
        debug_assert!(self.page(id).is_empty());
        let Some(parent) = self.page(id).parent() else {
            return;
        };

        let slot = self.slot_for(parent, key.as_bytes());
        debug_assert_eq!(self.child_at(parent, slot), id);
        let is_begin = slot == 0;
        self.page_mut(parent).erase_slot(slot);
        self.arena.free(id);
        trace!(page = id.index(), "freed empty page");

        if self.page(parent).is_empty() {
            self.delete_empty_page(parent, key);
        } else if is_begin {
            self.update_min_key(parent);
        }
    }

    /// Rewrites ancestor separators after the minimum key of `id` changed,
    /// cascading while the rewritten record is the leftmost of its page.
    fn update_min_key(&mut self, id: PageId) {
        debug_assert!(!self.page(id).is_empty());
        if self.page(id).parent().is_none() {
            return;
        }
        let (parent, slot) = self.parent_record(id);
        let min = self.key_at(id, 0);
        self.page_mut(parent)
            .update_key(slot, min.as_bytes())
            .expect("separator rewrite keeps slot order");
        if slot == 0 {
            self.update_min_key(parent);
        }
    }

    /// Merges `id` with its left sibling when `id` has become sparse,
    /// recursing into the parent after a successful merge.
    fn try_merge(&mut self, id: PageId) {
        debug_assert!(!self.page(id).is_empty());
        if self.page(id).parent().is_none() {
            return;
        }
        let total = self.page(id).total_data_size();
        if TreePage::<K, P>::EMPTY_SIZE < total * 3 {
            // Still well filled.
            return;
        }

        let (parent, slot) = self.parent_record(id);
        if slot == 0 {
            // No left sibling under this parent.
            return;
        }
        let left = self.child_at(parent, slot - 1);
        let left_total = self.page(left).total_data_size();
        if TreePage::<K, P>::EMPTY_SIZE < left_total + total {
            // Combined live data would not fit one page.
            return;
        }

        if self.page(id).free_space() < left_total {
            self.page_mut(id).gc();
        }
        if !self.page(left).is_leaf() {
            self.reparent_children_to(left, id);
        }
        let (right_page, left_page) = self.arena.get_pair_mut(id, left);
        right_page
            .merge(left_page)
            .expect("left sibling fits after compaction");
        trace!(left = left.index(), right = id.index(), "merged left sibling");

        // The merged page now starts at the left sibling's minimum; its
        // record takes over the left sibling's key.
        let left_key = self.key_at(parent, slot - 1);
        self.arena.free(left);
        self.page_mut(parent).erase_slot(slot - 1);
        debug_assert_eq!(self.child_at(parent, slot - 1), id);
        self.page_mut(parent)
            .update_key(slot - 1, left_key.as_bytes())
            .expect("absorbed sibling's separator keeps slot order");

        self.try_merge(parent);
    }

    /// Collapses the root while it is a branch with a single child: the
    /// root takes the child's contents and the child page is freed.
    fn lift_up(&mut self) {
        while self.page(ROOT).is_branch() && self.num_records(ROOT) == 1 {
            let child = self.child_at(ROOT, 0);
            let (root, child_page) = self.arena.get_pair_mut(ROOT, child);
            root.swap_contents(child_page);
            root.set_parent(None);
            self.arena.free(child);
            trace!(child = child.index(), "lifted root");
        }
        if self.page(ROOT).is_branch() {
            self.reparent_children(ROOT);
        }
    }
}

impl<K: MapKey, V: MapValue, const P: usize> Default for BtreeMap<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}
