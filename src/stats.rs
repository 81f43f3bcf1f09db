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

//! Process-wide counter of blocks currently indexed by any tree.
//!
//! Only compiled with the `alloc_track` cargo feature. The counter goes up
//! on every insertion and down whenever a block is detached (best-fit
//! removal, identity removal, or drain), so a test harness can compare it
//! against its own allocation bookkeeping to spot leaks. Call [`reset`] at
//! the start of a run; the counter is shared by every tree in the process.

use core::sync::atomic::{AtomicUsize, Ordering};

static LIVE_BLOCKS: AtomicUsize = AtomicUsize::new(0);

/// Number of blocks currently held by trees across the process.
pub fn live_blocks() -> usize {
    LIVE_BLOCKS.load(Ordering::Relaxed)
}

/// Resets the counter to zero.
pub fn reset() {
    LIVE_BLOCKS.store(0, Ordering::Relaxed);
}

pub(crate) fn incr() {
    LIVE_BLOCKS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn decr() {
    LIVE_BLOCKS.fetch_sub(1, Ordering::Relaxed);
}
