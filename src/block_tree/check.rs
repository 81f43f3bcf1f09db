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

//! Structural invariant checker.
//!
//! A violation is a latent engine bug, never a recoverable runtime error, so
//! every check panics with the failed rule and a rendering of the offending
//! tree. A transient deletion deficiency cannot be caught here because it
//! cannot be represented: [`Color`] has no double-black variant and the
//! deficiency travels as a `Balance` value inside the delete algorithm only.

use super::{BlockTree, Color, FreeBlock, Link};

impl<B> BlockTree<B>
where
    B: FreeBlock,
{
    /// Verifies the structural invariants, panicking on the first violation:
    ///
    /// * the root is black;
    /// * no red node has a red child;
    /// * every root-to-leaf path counts the same number of black nodes;
    /// * keys are strictly ordered, with bucket members matching their tree
    ///   node's key.
    ///
    /// Read-only; an intact tree passes through untouched. With the `rep_ok`
    /// cargo feature this check wraps the input and output of every public
    /// mutating operation.
    pub fn rep_ok(&self) {
        let root = match self.root {
            Some(root) => root,
            None => return,
        };

        unsafe {
            if root.as_ref().color() != Color::Black {
                panic!(
                    "tree does not satisfy the black-root invariant\n{}",
                    render(self.root),
                );
            }
            red_red_ok(self.root, self.root);
            black_count(self.root, self.root);
            order_ok(self.root, None, None, self.root);
        }
    }
}

unsafe fn red_red_ok<B: FreeBlock>(link: Link<B>, whole: Link<B>) {
    let node = match link {
        Some(node) => node,
        None => return,
    };
    let node = node.as_ref();

    if node.color() == Color::Red {
        for child in [node.left(), node.right()] {
            if let Some(child) = child {
                if child.as_ref().color() == Color::Red {
                    panic!(
                        "tree does not satisfy the red-red invariant \
                         (red {} under red {})\n{}",
                        child.as_ref().key(),
                        node.key(),
                        render(whole),
                    );
                }
            }
        }
    }

    red_red_ok(node.left(), whole);
    red_red_ok(node.right(), whole);
}

unsafe fn black_count<B: FreeBlock>(link: Link<B>, whole: Link<B>) -> usize {
    let node = match link {
        Some(node) => node,
        None => return 0,
    };
    let node = node.as_ref();

    let left = black_count(node.left(), whole);
    let right = black_count(node.right(), whole);
    if left != right {
        panic!(
            "tree does not satisfy the black-height invariant at {} \
             (left: {}, right: {})\n{}",
            node.key(),
            left,
            right,
            render(whole),
        );
    }

    left + (node.color() == Color::Black) as usize
}

unsafe fn order_ok<B: FreeBlock>(
    link: Link<B>,
    min: Option<usize>,
    max: Option<usize>,
    whole: Link<B>,
) {
    let node = match link {
        Some(node) => node,
        None => return,
    };
    let node = node.as_ref();
    let key = node.key();

    if min.map_or(false, |min| key <= min) || max.map_or(false, |max| max <= key) {
        panic!(
            "tree does not satisfy the key-order invariant at {}\n{}",
            key,
            render(whole),
        );
    }

    let mut next = node.next();
    while let Some(member) = next {
        if member.as_ref().key() != key {
            panic!(
                "bucket member {} does not match its tree node key {}\n{}",
                member.as_ref().key(),
                key,
                render(whole),
            );
        }
        next = member.as_ref().next();
    }

    order_ok(node.left(), min, Some(key), whole);
    order_ok(node.right(), Some(key), max, whole);
}

/// Renders the tree sideways (right subtree on top) for panic diagnostics.
unsafe fn render<B: FreeBlock>(link: Link<B>) -> String {
    let mut out = String::new();
    render_into(link, 0, &mut out);
    if out.is_empty() {
        out.push_str("(empty)\n");
    }
    out
}

unsafe fn render_into<B: FreeBlock>(link: Link<B>, depth: usize, out: &mut String) {
    use core::fmt::Write;

    let node = match link {
        Some(node) => node,
        None => return,
    };
    let node = node.as_ref();

    render_into(node.right(), depth + 1, out);

    for _ in 0..depth {
        out.push_str("    ");
    }
    let color = match node.color() {
        Color::Red => "R",
        Color::Black => "B",
    };
    let mut bucket = 0;
    let mut next = node.next();
    while let Some(member) = next {
        bucket += 1;
        next = member.as_ref().next();
    }
    if bucket == 0 {
        let _ = writeln!(out, "{} {}", node.key(), color);
    } else {
        let _ = writeln!(out, "{} {} (+{})", node.key(), color, bucket);
    }

    render_into(node.left(), depth + 1, out);
}
