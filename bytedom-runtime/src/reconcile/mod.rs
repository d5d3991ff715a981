//! Keyed list reconciliation.
//!
//! Maps the previous items of a loop onto the next collection in four
//! phases: common prefix, common suffix, one side exhausted, and the middle
//! range. The middle range matches keys (linear probe for small ranges, a key
//! index otherwise), removes unmatched items and then walks the next range
//! back to front, mounting new items and moving every matched item that is
//! not on the longest increasing subsequence of previous positions.

mod lis;

pub use lis::longest_increasing_subsequence;

use crate::config::DuplicateKeyPolicy;
use crate::error::{RenderError, Result};
use crate::host::Host;
use crate::interpreter::{Env, Pass, Target};
use crate::node::{LoopItem, LoopSlot};
use bytedom_bytecode::instruction::LoopSpec;
use bytedom_bytecode::{Key, Opcode};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::trace;

/// Below this combined size the middle range is matched by linear probing
const LINEAR_PROBE_LIMIT: usize = 32;
/// A next range shorter than this is always matched by linear probing
const LINEAR_PROBE_MIN_NEXT: usize = 4;

/// Key and props of one item of the next collection
struct Projected {
    key: Key,
    props: Value,
}

fn take<T>(items: &mut [Option<T>], index: usize) -> Result<T> {
    items
        .get_mut(index)
        .and_then(Option::take)
        .ok_or(RenderError::Invariant {
            reason: "loop item consumed twice",
        })
}

impl<'p, H: Host> Pass<'p, H> {
    /// Evaluate the collection and project every element to its key and props
    fn project(&mut self, spec: &LoopSpec, env: Env<'_>) -> Result<Vec<Projected>> {
        let scope = env.scope();
        let collection = (spec.collection)(&scope).map_err(RenderError::binding(Opcode::LoopMap))?;

        let mut projected = Vec::with_capacity(collection.len());
        for (index, item) in collection.iter().enumerate() {
            let key =
                (spec.key)(&scope, item, index).map_err(RenderError::binding(Opcode::LoopMap))?;
            let props = match &spec.props {
                Some(f) => f(&scope, item, index).map_err(RenderError::binding(Opcode::LoopMap))?,
                None => env.props.clone(),
            };
            projected.push(Projected { key, props });
        }

        match self.config.duplicate_keys {
            DuplicateKeyPolicy::Reject => {
                let mut seen = FxHashSet::default();
                for item in &projected {
                    if !seen.insert(&item.key) {
                        return Err(RenderError::DuplicateKey {
                            key: item.key.clone(),
                        });
                    }
                }
            }
            DuplicateKeyPolicy::KeepLast => {
                let mut last: FxHashMap<Key, usize> = FxHashMap::default();
                for (index, item) in projected.iter().enumerate() {
                    last.insert(item.key.clone(), index);
                }
                if last.len() != projected.len() {
                    trace!("Dropping {} duplicate loop item(s)", projected.len() - last.len());
                    let mut index = 0;
                    projected.retain(|item| {
                        let keep = last.get(&item.key) == Some(&index);
                        index += 1;
                        keep
                    });
                }
            }
        }
        Ok(projected)
    }

    /// Mount every item of a loop for the first time
    pub(crate) fn mount_loop(
        &mut self,
        spec: &LoopSpec,
        env: Env<'_>,
        parent: &H::Node,
    ) -> Result<Vec<LoopItem<H::Node>>> {
        let projected = self.project(spec, env)?;
        let mut items = Vec::with_capacity(projected.len());
        for item in projected {
            items.push(self.mount_item(spec, env, parent, item, None)?);
        }
        Ok(items)
    }

    fn mount_item(
        &mut self,
        spec: &LoopSpec,
        env: Env<'_>,
        parent: &H::Node,
        projected: Projected,
        anchor: Option<&H::Node>,
    ) -> Result<LoopItem<H::Node>> {
        let target = Target {
            parent: parent.clone(),
            anchor: anchor.cloned(),
        };
        let node = self.mount(&spec.template, env.with_props(&projected.props), &target)?;
        Ok(LoopItem {
            key: projected.key,
            props: projected.props,
            node,
        })
    }

    /// Carry a matched item over to the next pass. `should_update` gates only
    /// the content update; the item always takes the new props.
    fn patch_item(
        &mut self,
        spec: &LoopSpec,
        env: Env<'_>,
        mut item: LoopItem<H::Node>,
        projected: Projected,
    ) -> Result<LoopItem<H::Node>> {
        let patch = match &spec.should_update {
            Some(should_update) => should_update(&env.scope(), &item.props, &projected.props),
            None => true,
        };
        item.props = projected.props;
        if patch {
            self.update(&mut item.node, env.with_props(&item.props))?;
        }
        Ok(item)
    }

    fn remove_item(&mut self, parent: &H::Node, mut item: LoopItem<H::Node>) -> Result<()> {
        self.unmount(&mut item.node)?;
        let roots = item.node.roots();
        self.remove_nodes(parent, &roots);
        Ok(())
    }

    fn move_item(&mut self, parent: &H::Node, item: &LoopItem<H::Node>, anchor: Option<&H::Node>) {
        let roots = item.node.roots();
        self.insert_nodes(parent, &roots, anchor);
    }

    /// Remove every item. Items that are the only children of their parent
    /// are cleared with a single text-content write.
    fn clear_items(
        &mut self,
        spec: &LoopSpec,
        parent: &H::Node,
        items: Vec<LoopItem<H::Node>>,
    ) -> Result<()> {
        if spec.sole_child {
            for mut item in items {
                self.unmount(&mut item.node)?;
            }
            self.host.set_text_content(parent, "");
            return Ok(());
        }
        for item in items {
            self.remove_item(parent, item)?;
        }
        Ok(())
    }

    /// Bring a mounted loop in line with the collection's current value
    pub(crate) fn update_loop(
        &mut self,
        spec: &LoopSpec,
        env: Env<'_>,
        slot: &mut LoopSlot<H::Node>,
    ) -> Result<()> {
        let next = self.project(spec, env)?;
        let prev = std::mem::take(&mut slot.items);
        let parent = slot.parent.clone();

        slot.items = match (prev.is_empty(), next.is_empty()) {
            (true, true) => Vec::new(),
            (true, false) => {
                let mut items = Vec::with_capacity(next.len());
                for item in next {
                    items.push(self.mount_item(spec, env, &parent, item, None)?);
                }
                items
            }
            (false, true) => {
                self.clear_items(spec, &parent, prev)?;
                Vec::new()
            }
            (false, false) => self.reconcile(spec, env, &parent, prev, next)?,
        };
        Ok(())
    }

    fn reconcile(
        &mut self,
        spec: &LoopSpec,
        env: Env<'_>,
        parent: &H::Node,
        prev: Vec<LoopItem<H::Node>>,
        next: Vec<Projected>,
    ) -> Result<Vec<LoopItem<H::Node>>> {
        let prev_len = prev.len();
        let a_keys: Vec<Key> = prev.iter().map(|item| item.key.clone()).collect();
        let b_keys: Vec<Key> = next.iter().map(|item| item.key.clone()).collect();
        let mut a: Vec<Option<LoopItem<H::Node>>> = prev.into_iter().map(Some).collect();
        let mut pending: Vec<Option<Projected>> = next.into_iter().map(Some).collect();
        let mut b: Vec<Option<LoopItem<H::Node>>> = (0..b_keys.len()).map(|_| None).collect();

        let (mut a_start, mut b_start) = (0, 0);
        let (mut a_end, mut b_end) = (a.len(), b.len());

        // Common prefix
        while a_start < a_end && b_start < b_end && a_keys[a_start] == b_keys[b_start] {
            let item = take(&mut a, a_start)?;
            let projected = take(&mut pending, b_start)?;
            b[b_start] = Some(self.patch_item(spec, env, item, projected)?);
            a_start += 1;
            b_start += 1;
        }
        // Common suffix
        while a_start < a_end && b_start < b_end && a_keys[a_end - 1] == b_keys[b_end - 1] {
            let item = take(&mut a, a_end - 1)?;
            let projected = take(&mut pending, b_end - 1)?;
            b[b_end - 1] = Some(self.patch_item(spec, env, item, projected)?);
            a_end -= 1;
            b_end -= 1;
        }
        trace!(
            "Loop reconcile: prefix {}, suffix {}",
            a_start,
            prev_len - a_end
        );

        if a_start == a_end {
            // Only insertions left
            let anchor = first_root_from(&b, b_end);
            for j in b_start..b_end {
                let projected = take(&mut pending, j)?;
                b[j] = Some(self.mount_item(spec, env, parent, projected, anchor.as_ref())?);
            }
        } else if b_start == b_end {
            // Only removals left
            for i in a_start..a_end {
                let item = take(&mut a, i)?;
                self.remove_item(parent, item)?;
            }
        } else {
            let a_len = a_end - a_start;
            let b_len = b_end - b_start;
            let mut sources: Vec<Option<usize>> = vec![None; b_len];
            let mut moved = false;
            let mut last_position = 0;
            let mut synced = 0;

            let index: Option<FxHashMap<&Key, usize>> =
                if (a_len | b_len) < LINEAR_PROBE_LIMIT || b_len < LINEAR_PROBE_MIN_NEXT {
                    trace!("Matching {}x{} middle range by linear probe", a_len, b_len);
                    None
                } else {
                    trace!("Matching {}x{} middle range by key index", a_len, b_len);
                    Some((b_start..b_end).map(|j| (&b_keys[j], j)).collect())
                };

            for i in a_start..a_end {
                if synced == b_len {
                    break;
                }
                let found = match &index {
                    Some(index) => index.get(&a_keys[i]).copied(),
                    None => (b_start..b_end)
                        .find(|&j| sources[j - b_start].is_none() && b_keys[j] == a_keys[i]),
                };
                if let Some(j) = found {
                    if j < last_position {
                        moved = true;
                    } else {
                        last_position = j;
                    }
                    sources[j - b_start] = Some(i);
                    synced += 1;
                    let item = take(&mut a, i)?;
                    let projected = take(&mut pending, j)?;
                    b[j] = Some(self.patch_item(spec, env, item, projected)?);
                }
            }

            if a_len == prev_len && synced == 0 {
                // No key survived: replace the whole list
                trace!("Loop reconcile: disjoint keys, replacing {} item(s)", prev_len);
                let old: Vec<LoopItem<H::Node>> = a.into_iter().flatten().collect();
                self.clear_items(spec, parent, old)?;
                let mut items = Vec::with_capacity(b.len());
                for projected in pending.into_iter().flatten() {
                    items.push(self.mount_item(spec, env, parent, projected, None)?);
                }
                return Ok(items);
            }

            for i in a_start..a_end {
                if let Some(item) = a[i].take() {
                    self.remove_item(parent, item)?;
                }
            }

            let lis = if moved {
                longest_increasing_subsequence(&sources)
            } else {
                Vec::new()
            };
            trace!(
                "Loop reconcile: {} matched, moved: {}, lis length {}",
                synced,
                moved,
                lis.len()
            );

            let mut lis_cursor = lis.len();
            for offset in (0..b_len).rev() {
                let j = b_start + offset;
                let anchor = first_root_from(&b, j + 1);
                match sources[offset] {
                    None => {
                        let projected = take(&mut pending, j)?;
                        let item =
                            self.mount_item(spec, env, parent, projected, anchor.as_ref())?;
                        b[j] = Some(item);
                    }
                    Some(_) if moved => {
                        if lis_cursor > 0 && lis[lis_cursor - 1] == offset {
                            lis_cursor -= 1;
                        } else if let Some(item) = &b[j] {
                            self.move_item(parent, item, anchor.as_ref());
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        b.into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(RenderError::Invariant {
                reason: "loop position left unfilled",
            })
    }
}

/// First host node of the items at or after `from`
fn first_root_from<N: Clone>(items: &[Option<LoopItem<N>>], from: usize) -> Option<N> {
    items
        .iter()
        .skip(from)
        .flatten()
        .find_map(|item| item.node.first_root())
}
