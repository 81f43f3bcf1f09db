// Copyright 2026 The freelist-tree developers
//
// "LGPL-3.0-or-later OR Apache-2.0"
//
// This is part of freelist-tree
//
//  freelist-tree is free software: you can redistribute it and/or modify
//  it under the terms of the GNU Lesser General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  freelist-tree is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU Lesser General Public License for more details.
//
//  You should have received a copy of the GNU Lesser General Public License
//  along with freelist-tree.  If not, see <http://www.gnu.org/licenses/>.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An intrusive red-black tree indexing free memory blocks by size, meant to
//! back the free-list of a memory allocator.
//!
//! [`BlockTree`] answers "smallest free block whose size is at least X" in
//! O(log n) and supports removing a specific block by identity, which an
//! allocator needs when it coalesces two adjacent free blocks. Blocks with
//! equal sizes occupy a single tree node and are chained off it in a bucket
//! list, so duplicate sizes cost O(1) to add and remove and never disturb
//! balancing.
//!
//! The tree owns no memory. The caller's block header type implements
//! [`FreeBlock`] to expose the intrusive fields (key, color, child and
//! bucket links); everything else in the header is payload the tree never
//! reads or writes. Storage comes from the caller on insertion and goes back
//! to the caller when a block is detached.
//!
//! ```
//! use core::ptr::NonNull;
//! use freelist_tree::{BlockTree, Color, Direction, FreeBlock, Link};
//!
//! struct Header {
//!     left: Link<Self>,
//!     right: Link<Self>,
//!     next: Link<Self>,
//!     color: Color,
//!     size: usize,
//! }
//!
//! impl Header {
//!     fn new() -> Self {
//!         Self { left: None, right: None, next: None, color: Color::Black, size: 0 }
//!     }
//! }
//!
//! impl FreeBlock for Header {
//!     fn key(&self) -> usize {
//!         self.size
//!     }
//!     fn set_key(&mut self, key: usize) {
//!         self.size = key;
//!     }
//!     fn child(&self, direction: Direction) -> Link<Self> {
//!         match direction {
//!             Direction::Left => self.left,
//!             Direction::Right => self.right,
//!         }
//!     }
//!     fn set_child(&mut self, child: Link<Self>, direction: Direction) {
//!         match direction {
//!             Direction::Left => self.left = child,
//!             Direction::Right => self.right = child,
//!         }
//!     }
//!     fn color(&self) -> Color {
//!         self.color
//!     }
//!     fn set_color(&mut self, color: Color) {
//!         self.color = color;
//!     }
//!     fn next(&self) -> Link<Self> {
//!         self.next
//!     }
//!     fn set_next(&mut self, next: Link<Self>) {
//!         self.next = next;
//!     }
//! }
//!
//! let mut blocks = [Header::new(), Header::new(), Header::new()];
//! let [a, b, c] = &mut blocks;
//!
//! let mut tree = BlockTree::new();
//! tree.insert(a, 48);
//! tree.insert(b, 16);
//! tree.insert(c, 48);
//!
//! // Best fit for 32 bytes is a 48-byte block.
//! let hit = tree.remove_at_least(32).unwrap();
//! assert_eq!(unsafe { hit.as_ref().size }, 48);
//!
//! // Coalescing absorbs a specific block, wherever it is.
//! let b = NonNull::from(b);
//! assert_eq!(tree.remove_block(b), Some(b));
//! assert!(tree.remove_at_least(64).is_none());
//! ```
//!
//! # Cargo features
//!
//! * `rep_ok` — every public mutating operation verifies the structural
//!   invariants on entry and exit, panicking on a violation. Severely slows
//!   execution; meant for verification builds. [`BlockTree::rep_ok`] itself
//!   is always available.
//! * `alloc_track` — enables the [`stats`] module, a process-wide counter of
//!   indexed blocks for leak detection in test harnesses.
//!
//! A tree must not be mutated from multiple threads; callers needing shared
//! access have to serialize operations themselves.

mod block_tree;
#[cfg(feature = "alloc_track")]
pub mod stats;

pub use crate::block_tree::{BlockTree, Color, Direction, FreeBlock, Link};
