//! # Mapper Framework
//!
//! Keeps a tree of target objects in step with a source.
//!
//! A [`MappingContext`] is an arena of mappers. Each mapper pairs a source
//! key with a target object and may own child mappers. Behaviour hangs off
//! [`Synchronizer`]s registered on a mapper: they run when the mapper is
//! attached, on every [`refresh`](MappingContext::refresh), and once more when
//! it is detached.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──attach──▶ Attaching ──▶ Attached ──detach──▶ Detached
//! ```
//!
//! Children can only be attached under a mapper that is `Attaching` or
//! `Attached`. Detaching is recursive and runs children first.
//!
//! The source is passed by reference into every call instead of being owned
//! by the context, so one source value can drive several independent trees.

pub mod synchronizer;

pub use synchronizer::{PropertySynchronizer, RoleSynchronizer, Synchronizer};

use crate::error::MapperError;
use ahash::RandomState;
use hashbrown::HashMap;
use std::hash::Hash;
use std::mem;

/// Handle of a mapper inside its [`MappingContext`].
///
/// Slots of detached mappers are reused, so a handle also carries the slot
/// generation it was issued for. A stale handle never reaches the new mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapperId {
    index: usize,
    generation: u32,
}

impl MapperId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperState {
    Created,
    Attaching,
    Attached,
    Detached,
}

impl MapperState {
    const fn is_live(self) -> bool {
        matches!(self, Self::Attaching | Self::Attached)
    }
}

type Synchronizers<S, K, T> = Vec<Box<dyn Synchronizer<S, K, T>>>;

struct MapperNode<S: ?Sized, K, T> {
    key: K,
    target: T,
    parent: Option<MapperId>,
    children: Vec<MapperId>,
    state: MapperState,
    synchronizers: Synchronizers<S, K, T>,
}

struct Slot<S: ?Sized, K, T> {
    generation: u32,
    node: Option<MapperNode<S, K, T>>,
}

/// Arena of mappers from source keys `K` to targets `T`, driven by a source `S`.
pub struct MappingContext<S: ?Sized, K, T> {
    slots: Vec<Slot<S, K, T>>,
    free: Vec<usize>,
    by_key: HashMap<K, MapperId, RandomState>,
}

impl<S: ?Sized, K, T> std::fmt::Debug for MappingContext<S, K, T>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingContext")
            .field("mappers", &self.len())
            .field("slots", &self.slots.len())
            .field("keys", &self.by_key.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: ?Sized, K, T> Default for MappingContext<S, K, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_key: HashMap::with_hasher(RandomState::new()),
        }
    }
}

type Result<T> = std::result::Result<T, MapperError>;

impl<S: ?Sized, K, T> MappingContext<S, K, T> {
    /// Number of live mappers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated slots, live or free.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<S: ?Sized, K, T> MappingContext<S, K, T>
where
    K: Clone + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a mapper with no parent.
    ///
    /// # Errors
    /// Propagates errors from the mapper's synchronizers.
    pub fn attach_root(&mut self, source: &S, key: K, target: T) -> Result<MapperId> {
        let id = self.create(None, key, target);
        self.attach(source, id)?;
        Ok(id)
    }

    /// Attach a mapper as the last child of `parent`.
    ///
    /// # Errors
    /// [`MapperError::UnknownMapper`] if `parent` does not exist and
    /// [`MapperError::NotAttached`] if it is not attached.
    pub fn attach_child(
        &mut self,
        source: &S,
        parent: MapperId,
        key: K,
        target: T,
    ) -> Result<MapperId> {
        if !self.node(parent)?.state.is_live() {
            return Err(MapperError::NotAttached(parent.index));
        }
        let id = self.create(Some(parent), key, target);
        self.node_mut(parent)?.children.push(id);
        self.attach(source, id)?;
        Ok(id)
    }

    fn create(&mut self, parent: Option<MapperId>, key: K, target: T) -> MapperId {
        let node = MapperNode {
            key,
            target,
            parent,
            children: Vec::new(),
            state: MapperState::Created,
            synchronizers: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            MapperId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            MapperId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    fn attach(&mut self, source: &S, id: MapperId) -> Result<()> {
        let node = self.node_mut(id)?;
        node.state = MapperState::Attaching;
        let key = node.key.clone();
        self.by_key.insert(key, id);
        self.with_synchronizers(id, |sync, ctx| sync.attach(source, ctx, id))?;
        self.node_mut(id)?.state = MapperState::Attached;
        tracing::trace!(mapper = id.index, "attached");
        Ok(())
    }

    /// Register a synchronizer on an attached mapper and run its `attach`.
    ///
    /// # Errors
    /// [`MapperError::UnknownMapper`], [`MapperError::NotAttached`], or an
    /// error from the synchronizer itself.
    pub fn add_synchronizer(
        &mut self,
        source: &S,
        id: MapperId,
        mut synchronizer: Box<dyn Synchronizer<S, K, T>>,
    ) -> Result<()> {
        if !self.node(id)?.state.is_live() {
            return Err(MapperError::NotAttached(id.index));
        }
        synchronizer.attach(source, self, id)?;
        self.node_mut(id)?.synchronizers.push(synchronizer);
        Ok(())
    }

    /// Refresh `id` and then, in order, every mapper below it.
    ///
    /// # Errors
    /// [`MapperError::UnknownMapper`], [`MapperError::NotAttached`], or the
    /// first error returned by a synchronizer.
    pub fn refresh(&mut self, source: &S, id: MapperId) -> Result<()> {
        if !self.node(id)?.state.is_live() {
            return Err(MapperError::NotAttached(id.index));
        }
        self.with_synchronizers(id, |sync, ctx| sync.refresh(source, ctx, id))?;
        let children = self.node(id)?.children.clone();
        for child in children {
            self.refresh(source, child)?;
        }
        Ok(())
    }

    /// Detach `id` and its whole subtree, children first, and free their slots.
    ///
    /// # Errors
    /// [`MapperError::UnknownMapper`] or, if already detached,
    /// [`MapperError::NotAttached`].
    pub fn detach(&mut self, id: MapperId) -> Result<()> {
        let children = self.node(id)?.children.clone();
        for child in children {
            self.detach(child)?;
        }

        let synchronizers = mem::take(&mut self.node_mut(id)?.synchronizers);
        for mut sync in synchronizers {
            sync.detach(self, id);
        }

        let node = self.slots[id.index]
            .node
            .take()
            .ok_or(MapperError::NotAttached(id.index))?;
        if let Some(parent) = node.parent {
            if let Ok(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        if self.by_key.get(&node.key) == Some(&id) {
            self.by_key.remove(&node.key);
        }
        self.free.push(id.index);
        tracing::trace!(mapper = id.index, "detached");
        Ok(())
    }

    /// Run `f` over the synchronizers of `id` with the context unborrowed.
    fn with_synchronizers<F>(&mut self, id: MapperId, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Box<dyn Synchronizer<S, K, T>>, &mut Self) -> Result<()>,
    {
        let mut synchronizers = mem::take(&mut self.node_mut(id)?.synchronizers);
        let result = synchronizers
            .iter_mut()
            .try_for_each(|sync| f(sync, self));
        // A synchronizer may have detached its own mapper.
        if let Ok(node) = self.node_mut(id) {
            // Synchronizers added while these ran go after them.
            let added = mem::replace(&mut node.synchronizers, synchronizers);
            node.synchronizers.extend(added);
        }
        result
    }

    /// Read access to the slot behind `id`, kept only for the generation `id` names.
    fn lookup(&self, id: MapperId) -> Option<&MapperNode<S, K, T>> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node(&self, id: MapperId) -> Result<&MapperNode<S, K, T>> {
        if id.index >= self.slots.len() {
            return Err(MapperError::UnknownMapper(id.index));
        }
        self.lookup(id).ok_or(MapperError::NotAttached(id.index))
    }

    fn node_mut(&mut self, id: MapperId) -> Result<&mut MapperNode<S, K, T>> {
        let slot = self
            .slots
            .get_mut(id.index)
            .ok_or(MapperError::UnknownMapper(id.index))?;
        if slot.generation != id.generation {
            return Err(MapperError::NotAttached(id.index));
        }
        slot.node.as_mut().ok_or(MapperError::NotAttached(id.index))
    }

    /// The live mapper most recently attached for `key`.
    #[must_use]
    pub fn mapper(&self, key: &K) -> Option<MapperId> {
        self.by_key.get(key).copied()
    }

    /// First live mapper for `key` in the subtree of `root`, in pre-order.
    #[must_use]
    pub fn descendant(&self, root: MapperId, key: &K) -> Option<MapperId> {
        let node = self.lookup(root)?;
        if node.key == *key {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|child| self.descendant(*child, key))
    }

    #[must_use]
    pub fn key(&self, id: MapperId) -> Option<&K> {
        self.lookup(id).map(|node| &node.key)
    }

    #[must_use]
    pub fn target(&self, id: MapperId) -> Option<&T> {
        self.lookup(id).map(|node| &node.target)
    }

    pub fn target_mut(&mut self, id: MapperId) -> Option<&mut T> {
        self.node_mut(id).ok().map(|node| &mut node.target)
    }

    #[must_use]
    pub fn parent(&self, id: MapperId) -> Option<MapperId> {
        self.lookup(id)?.parent
    }

    #[must_use]
    pub fn children(&self, id: MapperId) -> &[MapperId] {
        self.lookup(id).map_or(&[], |node| &node.children)
    }

    /// Lifecycle state of `id`; `Detached` once its slot was freed or reused.
    #[must_use]
    pub fn state(&self, id: MapperId) -> Option<MapperState> {
        if id.index >= self.slots.len() {
            return None;
        }
        Some(self.lookup(id).map_or(MapperState::Detached, |node| node.state))
    }

    /// Reorder the children of `parent`; used by [`RoleSynchronizer`].
    pub(crate) fn set_children(&mut self, parent: MapperId, children: Vec<MapperId>) {
        if let Ok(node) = self.node_mut(parent) {
            node.children = children;
        }
    }
}
