//! # B+Tree Map
//!
//! The typed tree layer over slotted pages. A `BtreeMap` owns a `PageArena`
//! whose slot 0 is the root page; branch records hold child `PageId`s keyed
//! by the minimum key of the child's subtree, leaves hold user values.
//!
//! ```text
//!                    [root branch]
//!                    /     |     \
//!             [leaf]    [leaf]   [branch]
//!                                 /    \
//!                             [leaf]  [leaf]
//! ```
//!
//! ## Descent and Mutation
//!
//! Every public mutation descends from the root by separator search to a
//! leaf and attempts the page operation there. Failures are structural
//! signals: a full leaf is compacted or split (the split cascades upward
//! and can raise the root's level), an emptied leaf is unlinked bottom-up,
//! a sparse leaf is merged into its left sibling, and a root with a single
//! child is collapsed (lift-up).
//!
//! ## Separator Discipline
//!
//! A branch key is a lower bound of its child's subtree; it normally equals
//! the subtree minimum but may lag below it after the original minimum was
//! deleted. All structural code tolerates this: parent-record lookups
//! advance one slot when the found record does not name the expected child,
//! and split rewrites a stale separator by erase+insert instead of an
//! in-place update.
//!
//! ## Iteration
//!
//! Adjacent-leaf traversal walks parent records (there are no sibling
//! links): find the page's own record in the parent, step it, descend
//! leftmost/rightmost, ascending as needed. Page-level and item-level
//! iterators are cyclic across a single end sentinel, mirroring the
//! benchmark workloads this map was built to serve.

mod arena;
mod iter;
mod map;

pub use iter::{ItemIter, ItemPos, Iter, PageIter};
pub use map::{BtreeMap, MapKey, MapValue, NativeCompare};
