//! Leaf-page and item cursors.
//!
//! The tree keeps no sibling links; adjacent-leaf traversal walks parent
//! records instead. Both cursor flavors treat "end" as a single sentinel
//! that `next`/`prev` wrap around cyclically, which is what the scan-heavy
//! benchmark workloads expect. A plain [`Iter`] adapter provides ordinary
//! begin-to-end iteration over `(K, V)` pairs.

use super::map::{BtreeMap, MapKey, MapValue};
use crate::page::PageId;

/// Position of one item: a leaf page and a slot within it. `None` page is
/// the end sentinel.
///
/// An `ItemPos` is a plain value; it stays meaningful only until the next
/// structural mutation of the map (use the position returned by
/// [`BtreeMap::erase_at`] to continue after an erase).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPos {
    page: Option<PageId>,
    slot: u16,
}

impl ItemPos {
    pub(crate) fn at(page: PageId, slot: u16) -> Self {
        Self {
            page: Some(page),
            slot,
        }
    }

    pub(crate) fn end() -> Self {
        Self {
            page: None,
            slot: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.page.is_none()
    }

    pub(crate) fn get(&self) -> Option<(PageId, u16)> {
        self.page.map(|page| (page, self.slot))
    }
}

/// Cursor over the leaf pages of a map, left to right.
pub struct PageIter<'a, K, V, const P: usize> {
    map: &'a BtreeMap<K, V, P>,
    page: Option<PageId>,
}

impl<'a, K: MapKey, V: MapValue, const P: usize> PageIter<'a, K, V, P> {
    pub(crate) fn new(map: &'a BtreeMap<K, V, P>, page: Option<PageId>) -> Self {
        Self { map, page }
    }

    pub fn is_end(&self) -> bool {
        self.page.is_none()
    }

    pub fn page_id(&self) -> Option<PageId> {
        self.page
    }

    /// Records in the current leaf; 0 at the end sentinel.
    pub fn num_records(&self) -> usize {
        match self.page {
            Some(id) => self.map.page(id).num_records(),
            None => 0,
        }
    }

    /// Advances to the next leaf; from the end sentinel, wraps to the
    /// leftmost leaf.
    pub fn next(&mut self) {
        self.page = match self.page {
            Some(id) => self.map.next_leaf(id),
            None => Some(self.map.leftmost_leaf()),
        };
    }

    /// Steps to the previous leaf; from the end sentinel, wraps to the
    /// rightmost leaf.
    pub fn prev(&mut self) {
        self.page = match self.page {
            Some(id) => self.map.prev_leaf(id),
            None => Some(self.map.rightmost_leaf()),
        };
    }
}

/// Cursor over the items of a map in key order.
pub struct ItemIter<'a, K, V, const P: usize> {
    map: &'a BtreeMap<K, V, P>,
    pos: ItemPos,
}

impl<'a, K: MapKey, V: MapValue, const P: usize> ItemIter<'a, K, V, P> {
    pub(crate) fn new(map: &'a BtreeMap<K, V, P>, pos: ItemPos) -> Self {
        Self { map, pos }
    }

    /// The plain position, for use with [`BtreeMap::erase_at`].
    pub fn pos(&self) -> ItemPos {
        self.pos
    }

    pub fn is_end(&self) -> bool {
        self.pos.is_end()
    }

    pub fn key(&self) -> Option<K> {
        self.pos.get().map(|(page, slot)| self.map.key_at(page, slot))
    }

    pub fn value(&self) -> Option<V> {
        self.pos
            .get()
            .map(|(page, slot)| self.map.value_at(page, slot))
    }

    /// Advances to the next item, rolling into the next leaf at a page
    /// boundary; from the end sentinel, wraps to the first item.
    pub fn next(&mut self) {
        self.pos = match self.pos.get() {
            Some((id, slot)) => {
                if (slot as usize) + 1 < self.map.page(id).num_records() {
                    ItemPos::at(id, slot + 1)
                } else {
                    match self.map.next_leaf(id) {
                        Some(next) => ItemPos::at(next, 0),
                        None => ItemPos::end(),
                    }
                }
            }
            None => self.first_pos(),
        };
    }

    /// Steps to the previous item; from the end sentinel, wraps to the
    /// last item.
    pub fn prev(&mut self) {
        self.pos = match self.pos.get() {
            Some((id, slot)) => {
                if slot > 0 {
                    ItemPos::at(id, slot - 1)
                } else {
                    match self.map.prev_leaf(id) {
                        Some(prev) => {
                            let last = self.map.page(prev).num_records() - 1;
                            ItemPos::at(prev, last as u16)
                        }
                        None => ItemPos::end(),
                    }
                }
            }
            None => self.last_pos(),
        };
    }

    fn first_pos(&self) -> ItemPos {
        let leaf = self.map.leftmost_leaf();
        if self.map.page(leaf).is_empty() {
            ItemPos::end()
        } else {
            ItemPos::at(leaf, 0)
        }
    }

    fn last_pos(&self) -> ItemPos {
        let leaf = self.map.rightmost_leaf();
        let n = self.map.page(leaf).num_records();
        if n == 0 {
            ItemPos::end()
        } else {
            ItemPos::at(leaf, (n - 1) as u16)
        }
    }
}

/// Begin-to-end iterator over `(K, V)` pairs.
pub struct Iter<'a, K, V, const P: usize> {
    inner: ItemIter<'a, K, V, P>,
}

impl<'a, K: MapKey, V: MapValue, const P: usize> Iter<'a, K, V, P> {
    pub(crate) fn new(inner: ItemIter<'a, K, V, P>) -> Self {
        Self { inner }
    }
}

impl<'a, K: MapKey, V: MapValue, const P: usize> Iterator for Iter<'a, K, V, P> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let key = self.inner.key()?;
        let value = self.inner.value()?;
        self.inner.next();
        Some((key, value))
    }
}
