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

//! Test-only block type and tree inspection helpers.

use super::{Color, Direction, FreeBlock, Link};
use core::fmt::Write;
use core::ptr::NonNull;

/// A block header for tests. `tag` stands in for the consumer payload the
/// engine must never touch.
pub(crate) struct TestBlock {
    left_: Link<Self>,
    right_: Link<Self>,
    next_: Link<Self>,
    color_: Color,
    key_: usize,
    pub(crate) tag: usize,
}

impl TestBlock {
    pub(crate) fn new(tag: usize) -> Self {
        Self {
            left_: None,
            right_: None,
            next_: None,
            color_: Color::Black,
            key_: 0,
            tag,
        }
    }

    pub(crate) fn build(n: usize) -> Vec<Self> {
        (0..n).map(Self::new).collect()
    }
}

impl FreeBlock for TestBlock {
    fn key(&self) -> usize {
        self.key_
    }
    fn set_key(&mut self, key: usize) {
        self.key_ = key;
    }

    fn child(&self, direction: Direction) -> Link<Self> {
        match direction {
            Direction::Left => self.left_,
            Direction::Right => self.right_,
        }
    }
    fn set_child(&mut self, child: Link<Self>, direction: Direction) {
        match direction {
            Direction::Left => self.left_ = child,
            Direction::Right => self.right_ = child,
        }
    }

    fn color(&self) -> Color {
        self.color_
    }
    fn set_color(&mut self, color: Color) {
        self.color_ = color;
    }

    fn next(&self) -> Link<Self> {
        self.next_
    }
    fn set_next(&mut self, next: Link<Self>) {
        self.next_ = next;
    }
}

pub(crate) fn bucket_len(node: NonNull<TestBlock>) -> usize {
    let mut len = 0;
    let mut next = unsafe { node.as_ref().next() };
    while let Some(member) = next {
        len += 1;
        next = unsafe { member.as_ref().next() };
    }
    len
}

/// Serializes the full shape of a tree (keys, colors, bucket tags) so two
/// snapshots compare equal exactly when the trees are structurally identical.
pub(crate) fn snapshot(link: Link<TestBlock>) -> String {
    let mut out = String::new();
    snapshot_into(link, &mut out);
    out
}

fn snapshot_into(link: Link<TestBlock>, out: &mut String) {
    let node = match link {
        Some(node) => node,
        None => {
            out.push('.');
            return;
        }
    };
    unsafe {
        let node = node.as_ref();
        let _ = write!(out, "({}{:?}", node.key(), node.color());
        let mut next = node.next();
        while let Some(member) = next {
            let _ = write!(out, "+{}", member.as_ref().tag);
            next = member.as_ref().next();
        }
        snapshot_into(node.left(), out);
        snapshot_into(node.right(), out);
        out.push(')');
    }
}
