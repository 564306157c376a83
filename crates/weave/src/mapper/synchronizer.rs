use crate::error::MapperError;
use crate::mapper::{MapperId, MappingContext};
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use std::hash::Hash;

/// Behaviour attached to one mapper.
///
/// `attach` runs once when the synchronizer is registered on a live mapper
/// (or when its mapper attaches), `refresh` on every refresh, and `detach`
/// when the mapper goes away.
pub trait Synchronizer<S: ?Sized, K, T> {
    /// # Errors
    /// Whatever [`refresh`](Self::refresh) reports.
    fn attach(
        &mut self,
        source: &S,
        ctx: &mut MappingContext<S, K, T>,
        mapper: MapperId,
    ) -> Result<(), MapperError> {
        self.refresh(source, ctx, mapper)
    }

    /// # Errors
    /// Mapper lifecycle errors met while updating the tree.
    fn refresh(
        &mut self,
        source: &S,
        ctx: &mut MappingContext<S, K, T>,
        mapper: MapperId,
    ) -> Result<(), MapperError>;

    fn detach(&mut self, _ctx: &mut MappingContext<S, K, T>, _mapper: MapperId) {}
}

/// Copies a property of the source into the mapper's own target.
pub struct PropertySynchronizer<F> {
    update: F,
}

impl<F> PropertySynchronizer<F> {
    pub const fn new(update: F) -> Self {
        Self { update }
    }
}

impl<S, K, T, F> Synchronizer<S, K, T> for PropertySynchronizer<F>
where
    S: ?Sized,
    K: Clone + Eq + Hash,
    F: FnMut(&S, &mut T),
{
    fn refresh(
        &mut self,
        source: &S,
        ctx: &mut MappingContext<S, K, T>,
        mapper: MapperId,
    ) -> Result<(), MapperError> {
        let target = ctx
            .target_mut(mapper)
            .ok_or(MapperError::NotAttached(mapper.index()))?;
        (self.update)(source, target);
        Ok(())
    }
}

type KeysFn<S, K> = Box<dyn Fn(&S) -> Vec<K>>;
type FactoryFn<S, K, T> = Box<dyn FnMut(&S, &K) -> T>;
type UpdateFn<S, K, T> = Box<dyn FnMut(&S, &K, &mut T)>;

/// Keeps the children of a mapper in step with an ordered key list.
///
/// On every refresh the keys are read from the source; children whose key is
/// still present are reused (and updated), new keys get a child built by the
/// factory, children whose key disappeared are detached, and the survivors
/// are put in key order.
pub struct RoleSynchronizer<S: ?Sized, K, T> {
    keys: KeysFn<S, K>,
    factory: FactoryFn<S, K, T>,
    update: Option<UpdateFn<S, K, T>>,
}

impl<S: ?Sized, K, T> RoleSynchronizer<S, K, T> {
    pub fn new<KF, FF>(keys: KF, factory: FF) -> Self
    where
        KF: Fn(&S) -> Vec<K> + 'static,
        FF: FnMut(&S, &K) -> T + 'static,
    {
        Self {
            keys: Box::new(keys),
            factory: Box::new(factory),
            update: None,
        }
    }

    /// Run `update` on every reused child's target.
    #[must_use]
    pub fn with_update<U>(mut self, update: U) -> Self
    where
        U: FnMut(&S, &K, &mut T) + 'static,
    {
        self.update = Some(Box::new(update));
        self
    }
}

impl<S: ?Sized, K, T> Synchronizer<S, K, T> for RoleSynchronizer<S, K, T>
where
    K: Clone + Eq + Hash,
{
    fn refresh(
        &mut self,
        source: &S,
        ctx: &mut MappingContext<S, K, T>,
        mapper: MapperId,
    ) -> Result<(), MapperError> {
        let keys = (self.keys)(source);
        let previous = ctx.children(mapper).to_vec();
        let mut existing: HashMap<K, MapperId, RandomState> = previous
            .iter()
            .filter_map(|child| ctx.key(*child).map(|key| (key.clone(), *child)))
            .collect();

        let mut children = Vec::with_capacity(keys.len());
        let mut created = 0usize;
        for key in keys {
            if let Some(child) = existing.remove(&key) {
                if let (Some(update), Some(target)) = (self.update.as_mut(), ctx.target_mut(child)) {
                    update(source, &key, target);
                }
                children.push(child);
            } else {
                let target = (self.factory)(source, &key);
                children.push(ctx.attach_child(source, mapper, key, target)?);
                created += 1;
            }
        }

        // Stale children go in their previous order.
        let kept: HashSet<MapperId, RandomState> = children.iter().copied().collect();
        let mut removed = 0usize;
        for child in previous.into_iter().filter(|child| !kept.contains(child)) {
            ctx.detach(child)?;
            removed += 1;
        }
        ctx.set_children(mapper, children);
        tracing::trace!(mapper = mapper.index(), created, removed, "role synchronized");
        Ok(())
    }

    fn detach(&mut self, _ctx: &mut MappingContext<S, K, T>, mapper: MapperId) {
        tracing::trace!(mapper = mapper.index(), "role synchronizer detached");
    }
}
