//! Registry of pooled entities keyed by host-assigned id.
//!
//! Ids come from the host's create natives; the pool never invents one. At
//! most one live instance is registered per id, and a released id may be
//! registered again once the host hands it out anew.

use std::collections::BTreeMap;

use crate::error::BridgeError;

/// An entity that knows its host id.
pub trait Identified {
    fn id(&self) -> i32;
}

/// Id to instance map for one entity kind.
#[derive(Debug, Clone)]
pub struct IdentifiedPool<T> {
    items: BTreeMap<i32, T>,
}

impl<T> Default for IdentifiedPool<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Identified> IdentifiedPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under its id.
    pub fn register(&mut self, item: T) -> Result<&mut T, BridgeError> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(BridgeError::DuplicateId(id));
        }
        Ok(self.items.entry(id).or_insert(item))
    }

    pub fn lookup(&self, id: i32) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn lookup_mut(&mut self, id: i32) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    /// Like [`lookup`](Self::lookup), failing with `NotFound`.
    pub fn get(&self, id: i32) -> Result<&T, BridgeError> {
        self.items.get(&id).ok_or(BridgeError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: i32) -> Result<&mut T, BridgeError> {
        self.items.get_mut(&id).ok_or(BridgeError::NotFound(id))
    }

    /// Remove the instance registered under `id`.
    pub fn release(&mut self, id: i32) -> Result<T, BridgeError> {
        self.items.remove(&id).ok_or(BridgeError::NotFound(id))
    }

    /// Swap the host object behind `id` for a new one.
    ///
    /// `destroy` runs while the instance is still registered; if it fails
    /// nothing changes. The instance is then released and `create` makes a
    /// new host object, updating its id. If `create` fails the instance
    /// stays released. A new id that is already taken is destroyed again and
    /// reported as `DuplicateId`.
    pub fn recreate<N, D, F>(
        &mut self,
        id: i32,
        natives: &mut N,
        mut destroy: D,
        create: F,
    ) -> Result<i32, BridgeError>
    where
        N: ?Sized,
        D: FnMut(&mut N, &T) -> Result<(), BridgeError>,
        F: FnOnce(&mut N, &mut T) -> Result<(), BridgeError>,
    {
        destroy(natives, self.get(id)?)?;
        let mut item = self.release(id)?;
        create(natives, &mut item)?;
        let new_id = item.id();
        if self.items.contains_key(&new_id) {
            destroy(natives, &item)?;
            return Err(BridgeError::DuplicateId(new_id));
        }
        self.items.insert(new_id, item);
        Ok(new_id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Object {
        id: i32,
        model: i32,
    }

    impl Identified for Object {
        fn id(&self) -> i32 {
            self.id
        }
    }

    #[test]
    fn test_register_duplicate() {
        let mut pool = IdentifiedPool::new();
        pool.register(Object { id: 3, model: 1 }).unwrap();
        let err = pool.register(Object { id: 3, model: 2 }).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateId(3)));
        assert_eq!(pool.lookup(3).unwrap().model, 1);
    }

    #[test]
    fn test_release_then_register() {
        let mut pool = IdentifiedPool::new();
        pool.register(Object { id: 0, model: 1 }).unwrap();
        let released = pool.release(0).unwrap();
        assert_eq!(released.model, 1);
        assert!(pool.lookup(0).is_none());
        pool.register(Object { id: 0, model: 2 }).unwrap();
        assert_eq!(pool.get(0).unwrap().model, 2);
    }

    #[test]
    fn test_release_unknown() {
        let mut pool: IdentifiedPool<Object> = IdentifiedPool::new();
        assert!(matches!(pool.release(9), Err(BridgeError::NotFound(9))));
        assert!(matches!(pool.get(9), Err(BridgeError::NotFound(9))));
    }

    /// Host stand-in: hands out ids from `next` and records destroys.
    #[derive(Default)]
    struct Host {
        next: i32,
        destroyed: Vec<i32>,
        fail_destroy: bool,
    }

    fn destroy(host: &mut Host, obj: &Object) -> Result<(), BridgeError> {
        if host.fail_destroy {
            return Err(BridgeError::UnknownNative("DestroyObject".to_string()));
        }
        host.destroyed.push(obj.id);
        Ok(())
    }

    fn create(host: &mut Host, obj: &mut Object) -> Result<(), BridgeError> {
        obj.id = host.next;
        host.next += 1;
        Ok(())
    }

    #[test]
    fn test_recreate_moves_id() {
        let mut pool = IdentifiedPool::new();
        let mut host = Host { next: 4, ..Host::default() };
        pool.register(Object { id: 1, model: 5 }).unwrap();
        let new_id = pool.recreate(1, &mut host, destroy, create).unwrap();
        assert_eq!(new_id, 4);
        assert_eq!(host.destroyed, vec![1]);
        assert!(!pool.contains(1));
        assert_eq!(pool.get(4).unwrap().model, 5);
        assert_eq!(pool.ids().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_recreate_destroy_failure_keeps_instance() {
        let mut pool = IdentifiedPool::new();
        let mut host = Host { fail_destroy: true, ..Host::default() };
        pool.register(Object { id: 1, model: 5 }).unwrap();
        let err = pool.recreate(1, &mut host, destroy, create).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownNative(_)));
        assert_eq!(pool.get(1).unwrap().model, 5);
        assert_eq!(host.next, 0);
    }

    #[test]
    fn test_recreate_create_failure_leaves_released() {
        let mut pool = IdentifiedPool::new();
        let mut host = Host::default();
        pool.register(Object { id: 1, model: 5 }).unwrap();
        let err = pool
            .recreate(1, &mut host, destroy, |_: &mut Host, _: &mut Object| {
                Err(BridgeError::HostRejected { native: "CreateObject" })
            })
            .unwrap_err();
        assert!(matches!(err, BridgeError::HostRejected { .. }));
        assert!(pool.is_empty());
        assert_eq!(host.destroyed, vec![1]);
    }

    #[test]
    fn test_recreate_onto_taken_id_destroys_new_object() {
        let mut pool = IdentifiedPool::new();
        let mut host = Host { next: 2, ..Host::default() };
        pool.register(Object { id: 1, model: 5 }).unwrap();
        pool.register(Object { id: 2, model: 6 }).unwrap();
        let err = pool.recreate(1, &mut host, destroy, create).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateId(2)));
        assert_eq!(host.destroyed, vec![1, 2]);
        assert_eq!(pool.get(2).unwrap().model, 6);
        assert!(!pool.contains(1));
    }
}
