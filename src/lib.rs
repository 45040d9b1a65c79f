//! # memtree - In-Memory B+Tree Ordered Map
//!
//! memtree is an ordered map built as a B+tree over fixed-size slotted
//! pages. It is the data-structure core of a research workbench comparing
//! concurrent map implementations: the map itself is single-threaded and is
//! meant to be wrapped in whatever lock the experiment calls for.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │   BtreeMap<K, V, P>  (typed layer)   │
//! ├──────────────────────────────────────┤
//! │  PageArena (slab of pages, PageId)   │
//! ├──────────────────────────────────────┤
//! │  Page<C, P> (slotted byte buffer)    │
//! └──────────────────────────────────────┘
//! ```
//!
//! Every node of the tree is one `Page`: a page-size-aligned byte buffer
//! packing variable-length records from one end and a sorted 6-byte stub
//! directory from the other. Leaves (level 0) store user values; branches
//! store child `PageId`s keyed by the minimum key of the child's subtree.
//! The root is pinned at a fixed arena slot and only ever exchanges buffer
//! contents with a child (lift-up), so its identity is stable for the
//! lifetime of the map.
//!
//! ## Structural Mutations
//!
//! - Insertion into a full leaf first tries in-page compaction (`gc`), then
//!   splits the leaf; a split that overflows the parent cascades upward and
//!   can grow the tree at the root.
//! - Erasure that empties a page removes the page and its parent record,
//!   recursively; erasure that lowers a page's minimum rewrites ancestor
//!   separators; a page that drops below the merge threshold is merged into
//!   its left sibling; finally the root collapses while it has one child.
//!
//! ## Quick Start
//!
//! ```
//! use memtree::BtreeMap;
//!
//! let mut map: BtreeMap<u32, u32> = BtreeMap::new();
//! assert!(map.insert(7, 700));
//! assert!(!map.insert(7, 701));
//! let it = map.lower_bound(&5);
//! assert_eq!(it.key(), Some(7));
//! assert!(map.erase(&7));
//! assert!(map.is_empty());
//! ```
//!
//! ## Module Overview
//!
//! - [`page`]: slotted page, stub directory, page cursors, MGL record
//! - [`tree`]: arena, `BtreeMap`, leaf/item iterators
//! - [`error`]: the `BtreeError` taxonomy
//!
//! ## Thread Safety
//!
//! `BtreeMap` is not thread-safe; guard it externally (one lock per map).
//! There are no internal suspension points and no background work.

pub mod error;
pub mod page;
pub mod tree;

pub use error::{BtreeError, Result};
pub use page::{KeyCompare, LockMode, Mgl, Page, PageId, SlotIndex, SlotIter, PAGE_SIZE};
pub use tree::{BtreeMap, ItemIter, ItemPos, Iter, MapKey, MapValue, NativeCompare, PageIter};
