//! Widget arena and the doubly-linked sibling chains forming the tree.
//!
//! Widgets live in a slot arena addressed by generational [`WidgetId`]s;
//! parent/child/sibling relations are ids, never references, so removing a
//! widget can never leave a dangling pointer — a stale id is simply
//! rejected. Sibling order is paint order: ascending Z-index, stable for
//! equal Z (a new widget lands after existing equal-Z siblings, so the
//! last one created paints on top of its equals).
//!
//! All traversals are iterative; tree depth never translates into call
//! stack depth.

use alloc::vec::Vec;

use embedded_graphics::primitives::Rectangle;

use crate::error::Error;
use crate::widget::WidgetNode;

/// Stable handle to an arena slot. The generation detects reuse: ids held
/// across a remove become invalid even if the slot is recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetId {
    index: u16,
    generation: u16,
}

/// Tree links of one widget. Sibling chains are doubly linked; the parent
/// holds both endpoints.
#[derive(Debug, Default)]
pub struct Links {
    pub(crate) parent: Option<WidgetId>,
    pub(crate) first_child: Option<WidgetId>,
    pub(crate) last_child: Option<WidgetId>,
    pub(crate) next: Option<WidgetId>,
    pub(crate) prev: Option<WidgetId>,
}

#[derive(Debug)]
struct Slot {
    generation: u16,
    node: Option<WidgetNode>,
}

/// Arena of widget records plus the root ("desktop") widget.
#[derive(Debug)]
pub struct WidgetArena {
    slots: Vec<Slot>,
    free: Vec<u16>,
    root: WidgetId,
    /// Accumulated bounding box of everything invalidated since the last
    /// redraw pass; painting is clipped to it.
    pub(crate) invalid_region: Option<Rectangle>,
}

impl WidgetArena {
    /// Create the arena with `root` as the desktop widget. The root's
    /// dimensions must be fixed pixels (the device resolution).
    pub fn new(root: WidgetNode) -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: WidgetId {
                index: 0,
                generation: 0,
            },
            invalid_region: None,
        };
        arena.root = arena.alloc_slot(root);
        arena
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    /// Number of live widgets, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn get(&self, id: WidgetId) -> Result<&WidgetNode, Error> {
        self.node(id).ok_or(Error::InvalidHandle)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode, Error> {
        self.node_mut(id).ok_or(Error::InvalidHandle)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn alloc_slot(&mut self, node: WidgetNode) -> WidgetId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            WidgetId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u16;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            WidgetId {
                index,
                generation: 0,
            }
        }
    }

    /// Place `node` as a child of `parent`, ordered into the sibling chain
    /// by ascending Z-index (stable for equal Z).
    pub fn insert(&mut self, parent: WidgetId, node: WidgetNode) -> Result<WidgetId, Error> {
        let pnode = self.get(parent)?;
        if !pnode.kind.allows_children() {
            return Err(Error::InvalidArgument);
        }
        let z = node.z_index;
        let id = self.alloc_slot(node);
        self.link_by_z(parent, id, z);
        Ok(id)
    }

    /// Splice `id` out of the tree and destroy it together with all of its
    /// descendants. The root cannot be removed.
    pub fn remove(&mut self, id: WidgetId) -> Result<(), Error> {
        if id == self.root {
            return Err(Error::InvalidArgument);
        }
        self.get(id)?;
        self.unlink(id);
        for wid in self.subtree_ids(id) {
            if let Some(slot) = self.slots.get_mut(wid.index as usize) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(wid.index);
            }
        }
        Ok(())
    }

    /// Move `id` to the visual front of its equal-Z siblings without
    /// changing its Z-index. Per the stable ordering rule this is a fresh
    /// append: the widget lands after every sibling with the same or lower
    /// Z, and still before any higher-Z sibling.
    pub fn move_to_front(&mut self, id: WidgetId) -> Result<(), Error> {
        let node = self.get(id)?;
        let Some(parent) = node.link.parent else {
            return Ok(()); // the root has no siblings
        };
        let z = node.z_index;
        self.unlink(id);
        self.link_by_z(parent, id, z);
        Ok(())
    }

    /// Change the Z-index and re-sort the widget within its siblings,
    /// with the same fresh-append rule for equal Z.
    pub fn set_z_index(&mut self, id: WidgetId, z: i16) -> Result<(), Error> {
        let node = self.get_mut(id)?;
        node.z_index = z;
        let Some(parent) = node.link.parent else {
            return Ok(());
        };
        self.unlink(id);
        self.link_by_z(parent, id, z);
        Ok(())
    }

    /// Next sibling in paint order. With `current == None`, starts at
    /// `parent`'s first child; otherwise continues from `current`.
    pub fn next_sibling(
        &self,
        parent: Option<WidgetId>,
        current: Option<WidgetId>,
    ) -> Option<WidgetId> {
        match current {
            None => parent
                .and_then(|p| self.node(p))
                .and_then(|n| n.link.first_child),
            Some(c) => self.node(c).and_then(|n| n.link.next),
        }
    }

    /// Previous sibling (reverse paint order). With `current == None`,
    /// starts at `parent`'s last child.
    pub fn prev_sibling(
        &self,
        parent: Option<WidgetId>,
        current: Option<WidgetId>,
    ) -> Option<WidgetId> {
        match current {
            None => parent
                .and_then(|p| self.node(p))
                .and_then(|n| n.link.last_child),
            Some(c) => self.node(c).and_then(|n| n.link.prev),
        }
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id).and_then(|n| n.link.parent)
    }

    pub fn first_child(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id).and_then(|n| n.link.first_child)
    }

    pub fn last_child(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id).and_then(|n| n.link.last_child)
    }

    /// Children of `id` in paint order (back to front).
    pub fn children(&self, id: WidgetId) -> impl Iterator<Item = WidgetId> + '_ {
        SiblingIter {
            arena: self,
            current: self.first_child(id),
            forward: true,
        }
    }

    /// Children of `id` in hit-test order (front to back).
    pub fn children_rev(&self, id: WidgetId) -> impl Iterator<Item = WidgetId> + '_ {
        SiblingIter {
            arena: self,
            current: self.last_child(id),
            forward: false,
        }
    }

    /// Ids of `id` and all descendants, parents before children, siblings
    /// in paint order. Explicit work stack, no recursion.
    pub fn subtree_ids(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        stack.push(id);
        while let Some(wid) = stack.pop() {
            if !self.contains(wid) {
                continue;
            }
            out.push(wid);
            // Push in reverse so the first child pops first.
            let children: Vec<WidgetId> = self.children(wid).collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    fn link_by_z(&mut self, parent: WidgetId, id: WidgetId, z: i16) {
        // First sibling with a strictly higher Z goes after us.
        let mut before = None;
        let mut cur = self.first_child(parent);
        while let Some(c) = cur {
            let Some(n) = self.node(c) else { break };
            if n.z_index > z {
                before = Some(c);
                break;
            }
            cur = n.link.next;
        }
        self.link_before(parent, id, before);
    }

    fn link_before(&mut self, parent: WidgetId, id: WidgetId, before: Option<WidgetId>) {
        match before {
            Some(b) => {
                let prev = self.node(b).and_then(|n| n.link.prev);
                if let Some(n) = self.node_mut(id) {
                    n.link.prev = prev;
                    n.link.next = Some(b);
                    n.link.parent = Some(parent);
                }
                match prev {
                    Some(p) => {
                        if let Some(n) = self.node_mut(p) {
                            n.link.next = Some(id);
                        }
                    }
                    None => {
                        if let Some(n) = self.node_mut(parent) {
                            n.link.first_child = Some(id);
                        }
                    }
                }
                if let Some(n) = self.node_mut(b) {
                    n.link.prev = Some(id);
                }
            }
            None => {
                let last = self.last_child(parent);
                if let Some(n) = self.node_mut(id) {
                    n.link.prev = last;
                    n.link.next = None;
                    n.link.parent = Some(parent);
                }
                match last {
                    Some(l) => {
                        if let Some(n) = self.node_mut(l) {
                            n.link.next = Some(id);
                        }
                    }
                    None => {
                        if let Some(n) = self.node_mut(parent) {
                            n.link.first_child = Some(id);
                        }
                    }
                }
                if let Some(n) = self.node_mut(parent) {
                    n.link.last_child = Some(id);
                }
            }
        }
    }

    fn unlink(&mut self, id: WidgetId) {
        let Some(node) = self.node(id) else { return };
        let parent = node.link.parent;
        let prev = node.link.prev;
        let next = node.link.next;

        if let Some(p) = prev
            && let Some(n) = self.node_mut(p)
        {
            n.link.next = next;
        }
        if let Some(nx) = next
            && let Some(n) = self.node_mut(nx)
        {
            n.link.prev = prev;
        }
        if let Some(par) = parent
            && let Some(pn) = self.node_mut(par)
        {
            if pn.link.first_child == Some(id) {
                pn.link.first_child = next;
            }
            if pn.link.last_child == Some(id) {
                pn.link.last_child = prev;
            }
        }
        if let Some(n) = self.node_mut(id) {
            n.link.parent = None;
            n.link.prev = None;
            n.link.next = None;
        }
    }
}

struct SiblingIter<'a> {
    arena: &'a WidgetArena,
    current: Option<WidgetId>,
    forward: bool,
}

impl Iterator for SiblingIter<'_> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        let id = self.current?;
        let node = self.arena.node(id)?;
        self.current = if self.forward {
            node.link.next
        } else {
            node.link.prev
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dim;
    use crate::widgets::{Panel, WidgetKind};
    use alloc::vec::Vec;

    fn desktop() -> WidgetArena {
        let root = WidgetNode::new(0, WidgetKind::Panel(Panel::new())).with_geometry(
            Dim::Px(0),
            Dim::Px(0),
            Dim::Px(320),
            Dim::Px(240),
        );
        WidgetArena::new(root)
    }

    fn panel(user_id: u16, z: i16) -> WidgetNode {
        WidgetNode::new(user_id, WidgetKind::Panel(Panel::new())).with_z_index(z)
    }

    fn forward(arena: &WidgetArena, parent: WidgetId) -> Vec<u16> {
        arena
            .children(parent)
            .map(|id| arena.get(id).unwrap().user_id())
            .collect()
    }

    fn backward(arena: &WidgetArena, parent: WidgetId) -> Vec<u16> {
        arena
            .children_rev(parent)
            .map(|id| arena.get(id).unwrap().user_id())
            .collect()
    }

    #[test]
    fn insert_orders_by_z_stable() {
        let mut a = desktop();
        let root = a.root();
        a.insert(root, panel(1, 0)).unwrap();
        a.insert(root, panel(2, 5)).unwrap();
        a.insert(root, panel(3, 0)).unwrap(); // equal Z appends after 1
        a.insert(root, panel(4, -1)).unwrap();
        assert_eq!(forward(&a, root), [4, 1, 3, 2]);
    }

    #[test]
    fn forward_and_backward_are_reverses() {
        let mut a = desktop();
        let root = a.root();
        for (uid, z) in [(1, 2), (2, 0), (3, 1), (4, 1), (5, -3)] {
            a.insert(root, panel(uid, z)).unwrap();
        }
        let mut fwd = forward(&a, root);
        let bwd = backward(&a, root);
        fwd.reverse();
        assert_eq!(fwd, bwd);
    }

    #[test]
    fn remove_fixes_endpoints() {
        let mut a = desktop();
        let root = a.root();
        let first = a.insert(root, panel(1, 0)).unwrap();
        let mid = a.insert(root, panel(2, 0)).unwrap();
        let last = a.insert(root, panel(3, 0)).unwrap();

        a.remove(mid).unwrap();
        assert_eq!(forward(&a, root), [1, 3]);
        a.remove(first).unwrap();
        assert_eq!(forward(&a, root), [3]);
        assert_eq!(a.first_child(root), Some(last));
        assert_eq!(a.last_child(root), Some(last));
        a.remove(last).unwrap();
        assert!(forward(&a, root).is_empty());
        assert_eq!(a.first_child(root), None);
        assert_eq!(a.last_child(root), None);
    }

    #[test]
    fn remove_destroys_subtree_and_invalidates_handles() {
        let mut a = desktop();
        let root = a.root();
        let parent = a.insert(root, panel(1, 0)).unwrap();
        let child = a.insert(parent, panel(2, 0)).unwrap();
        let grandchild = a.insert(child, panel(3, 0)).unwrap();
        assert_eq!(a.len(), 4);

        a.remove(parent).unwrap();
        assert_eq!(a.len(), 1);
        assert!(!a.contains(parent));
        assert!(!a.contains(child));
        assert!(!a.contains(grandchild));

        // Slot reuse must not revive the old handle.
        let fresh = a.insert(root, panel(9, 0)).unwrap();
        assert!(a.contains(fresh));
        assert!(!a.contains(grandchild));
    }

    #[test]
    fn move_to_front_respects_z_bands() {
        let mut a = desktop();
        let root = a.root();
        let low = a.insert(root, panel(1, 0)).unwrap();
        a.insert(root, panel(2, 0)).unwrap();
        a.insert(root, panel(3, 7)).unwrap();

        a.move_to_front(low).unwrap();
        // Front of the Z=0 band, still below the Z=7 widget.
        assert_eq!(forward(&a, root), [2, 1, 3]);
    }

    #[test]
    fn set_z_index_resorts() {
        let mut a = desktop();
        let root = a.root();
        let w1 = a.insert(root, panel(1, 0)).unwrap();
        a.insert(root, panel(2, 1)).unwrap();
        a.insert(root, panel(3, 2)).unwrap();

        a.set_z_index(w1, 1).unwrap();
        // Fresh append among the Z=1 band.
        assert_eq!(forward(&a, root), [2, 1, 3]);
    }

    #[test]
    fn sibling_cursors_walk_once() {
        let mut a = desktop();
        let root = a.root();
        a.insert(root, panel(1, 0)).unwrap();
        a.insert(root, panel(2, 0)).unwrap();

        let mut cur = None;
        let mut seen = Vec::new();
        while let Some(id) = a.next_sibling(Some(root), cur) {
            seen.push(a.get(id).unwrap().user_id());
            cur = Some(id);
        }
        assert_eq!(seen, [1, 2]);

        let mut cur = None;
        let mut seen = Vec::new();
        while let Some(id) = a.prev_sibling(Some(root), cur) {
            seen.push(a.get(id).unwrap().user_id());
            cur = Some(id);
        }
        assert_eq!(seen, [2, 1]);
    }

    #[test]
    fn root_is_protected() {
        let mut a = desktop();
        assert_eq!(a.remove(a.root()), Err(Error::InvalidArgument));
    }

    #[test]
    fn insert_into_leaf_widget_fails() {
        let mut a = desktop();
        let root = a.root();
        let label = a
            .insert(
                root,
                WidgetNode::new(5, WidgetKind::Label(crate::widgets::Label::new("x"))),
            )
            .unwrap();
        assert_eq!(
            a.insert(label, panel(6, 0)).unwrap_err(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn subtree_ids_is_paint_preorder() {
        let mut a = desktop();
        let root = a.root();
        let p = a.insert(root, panel(1, 0)).unwrap();
        a.insert(p, panel(2, 0)).unwrap();
        a.insert(p, panel(3, 0)).unwrap();
        a.insert(root, panel(4, 0)).unwrap();

        let uids: Vec<u16> = a
            .subtree_ids(root)
            .into_iter()
            .map(|id| a.get(id).unwrap().user_id())
            .collect();
        assert_eq!(uids, [0, 1, 2, 3, 4]);
    }
}
