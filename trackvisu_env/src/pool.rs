//! Tagged resource pooling.
//!
//! Rebuilding a scene replaces many short-lived resources of a few kinds.
//! Released resources wait in a per-tag queue and are handed out again,
//! oldest first, before the factory is asked for a new one.

use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::types::{ResourceId, ResourceTag};

/// A resource checked out of a pool.
#[derive(Debug)]
pub struct Pooled<T> {
    id: ResourceId,
    tag: ResourceTag,
    value: T,
}

impl<T> Pooled<T> {
    pub fn new(tag: ResourceTag, value: T) -> Self {
        Self {
            id: ResourceId::new(),
            tag,
            value,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn tag(&self) -> &ResourceTag {
        &self.tag
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Source of reusable resources grouped by tag.
pub trait ResourcePool<T> {
    /// Returns an idle resource of `tag`, or one made by `factory`.
    fn acquire<F>(&mut self, tag: &ResourceTag, factory: F) -> Pooled<T>
    where
        F: FnOnce() -> T;

    /// Hands a resource back for later reuse under its own tag.
    fn release(&mut self, item: Pooled<T>);

    /// Number of idle resources waiting under `tag`.
    fn idle_count(&self, tag: &ResourceTag) -> usize;

    /// Drops every idle resource of `tag`.
    fn clear(&mut self, tag: &ResourceTag);
}

/// In-memory pool with one FIFO queue per tag.
#[derive(Debug)]
pub struct TaggedPool<T> {
    idle: HashMap<ResourceTag, VecDeque<Pooled<T>>>,
    created: usize,
    reused: usize,
}

impl<T> Default for TaggedPool<T> {
    fn default() -> Self {
        Self {
            idle: HashMap::new(),
            created: 0,
            reused: 0,
        }
    }
}

impl<T> TaggedPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources ever produced by a factory.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Acquisitions served from an idle queue.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Drops the idle resources of every tag.
    pub fn dispose_all(&mut self) {
        self.idle.clear();
    }
}

impl<T> ResourcePool<T> for TaggedPool<T> {
    fn acquire<F>(&mut self, tag: &ResourceTag, factory: F) -> Pooled<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(item) = self.idle.get_mut(tag).and_then(VecDeque::pop_front) {
            self.reused += 1;
            return item;
        }

        self.created += 1;
        let item = Pooled::new(tag.clone(), factory());
        debug!("Pool created {} resource {}", tag, item.id());
        item
    }

    fn release(&mut self, item: Pooled<T>) {
        self.idle
            .entry(item.tag.clone())
            .or_default()
            .push_back(item);
    }

    fn idle_count(&self, tag: &ResourceTag) -> usize {
        self.idle.get(tag).map_or(0, VecDeque::len)
    }

    fn clear(&mut self, tag: &ResourceTag) {
        self.idle.remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_when_empty() {
        let mut pool: TaggedPool<Vec<u8>> = TaggedPool::new();
        let tag = ResourceTag::from("mesh");

        let item = pool.acquire(&tag, || vec![1, 2, 3]);
        assert_eq!(*item, vec![1, 2, 3]);
        assert_eq!(item.tag(), &tag);
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.idle_count(&tag), 0);
    }

    #[test]
    fn test_release_then_reuse_by_tag() {
        let mut pool: TaggedPool<String> = TaggedPool::new();
        let road = ResourceTag::from("road");
        let terrain = ResourceTag::from("terrain");

        let first = pool.acquire(&road, || "a".to_string());
        let first_id = first.id();
        pool.release(first);
        assert_eq!(pool.idle_count(&road), 1);
        assert_eq!(pool.idle_count(&terrain), 0);

        // a different tag never receives the idle road resource
        let other = pool.acquire(&terrain, || "b".to_string());
        assert_ne!(other.id(), first_id);
        assert_eq!(pool.idle_count(&road), 1);

        let again = pool.acquire(&road, || unreachable!("must reuse the idle resource"));
        assert_eq!(again.id(), first_id);
        assert_eq!(*again, "a");
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.reused(), 1);
    }

    #[test]
    fn test_reuse_is_fifo() {
        let mut pool: TaggedPool<u32> = TaggedPool::new();
        let tag = ResourceTag::from("t");
        let a = pool.acquire(&tag, || 1);
        let b = pool.acquire(&tag, || 2);
        pool.release(a);
        pool.release(b);

        assert_eq!(*pool.acquire(&tag, || 0), 1);
        assert_eq!(*pool.acquire(&tag, || 0), 2);
    }

    #[test]
    fn test_clear_and_dispose() {
        let mut pool: TaggedPool<u32> = TaggedPool::new();
        let a = ResourceTag::from("a");
        let b = ResourceTag::from("b");
        let x = pool.acquire(&a, || 1);
        let y = pool.acquire(&b, || 2);
        pool.release(x);
        pool.release(y);

        pool.clear(&a);
        assert_eq!(pool.idle_count(&a), 0);
        assert_eq!(pool.idle_count(&b), 1);

        pool.dispose_all();
        assert_eq!(pool.idle_count(&b), 0);
    }

    #[test]
    fn test_pooled_value_is_mutable() {
        let mut pool: TaggedPool<Vec<u32>> = TaggedPool::new();
        let tag = ResourceTag::from("buf");
        let mut item = pool.acquire(&tag, Vec::new);
        item.push(5);
        pool.release(item);

        let item = pool.acquire(&tag, Vec::new);
        assert_eq!(item.into_inner(), vec![5]);
    }
}
