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

use super::testing::TestBlock;
use super::*;

use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    RemoveAtLeast(usize),
    RemoveBlock(usize),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key range keeps the bucket lists busy.
    let op = prop_oneof![
        4 => (0usize..32).prop_map(Op::Insert),
        2 => (0usize..40).prop_map(Op::RemoveAtLeast),
        2 => any::<usize>().prop_map(Op::RemoveBlock),
    ];
    prop::collection::vec(op, 0..=400)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// Runs an arbitrary operation sequence against a sorted-multiset model.
    /// After every step the tree passes the structural checker and agrees
    /// with the model on which block each removal yields.
    #[test]
    fn model_equivalence(ops in ops_strategy()) {
        let inserts = ops
            .iter()
            .filter(|op| matches!(op, Op::Insert(_)))
            .count();
        let mut pool = TestBlock::build(inserts + 1);
        let mut fresh = 0;

        let mut tree: BlockTree<TestBlock> = BlockTree::new();
        // Model: (key, tag) pairs of the blocks currently indexed.
        let mut live: Vec<(usize, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let tag = fresh;
                    fresh += 1;
                    tree.insert(&mut pool[tag], key);
                    live.push((key, tag));
                }
                Op::RemoveAtLeast(key) => {
                    let expected = live
                        .iter()
                        .filter(|(k, _)| *k >= key)
                        .map(|(k, _)| *k)
                        .min();
                    let removed = tree.remove_at_least(key);
                    match expected {
                        None => prop_assert!(removed.is_none()),
                        Some(expected) => {
                            let removed = removed.unwrap();
                            let (k, tag) = unsafe {
                                (removed.as_ref().key(), removed.as_ref().tag)
                            };
                            prop_assert_eq!(k, expected);
                            let pos = live
                                .iter()
                                .position(|&(lk, lt)| lk == k && lt == tag)
                                .unwrap();
                            live.swap_remove(pos);
                        }
                    }
                }
                Op::RemoveBlock(pick) => {
                    if live.is_empty() {
                        // A block that was never inserted must not be found.
                        let stranger = NonNull::from(&mut pool[inserts]);
                        prop_assert!(tree.remove_block(stranger).is_none());
                    } else {
                        let (_, tag) = live.swap_remove(pick % live.len());
                        let target = NonNull::from(&mut pool[tag]);
                        prop_assert_eq!(tree.remove_block(target), Some(target));
                        prop_assert!(tree.remove_block(target).is_none());
                    }
                }
            }
            tree.rep_ok();
        }

        // Drain and compare the leftovers against the model.
        let mut drained: Vec<(usize, usize)> = Vec::new();
        tree.drain(|block| unsafe {
            drained.push((block.as_ref().key(), block.as_ref().tag));
        });
        prop_assert!(tree.is_empty());
        drained.sort_unstable();
        live.sort_unstable();
        prop_assert_eq!(drained, live);
    }
}
