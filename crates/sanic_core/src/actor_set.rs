//! Actor collection with deferred mutation
//!
//! The set is guarded by an advisory lock. While a consumer holds it (the
//! per-actor update pass), `add` and `remove` do not touch the active
//! membership; they are queued and applied by [`ActorSet::flush`] once the
//! pass is over. Storage is allocated immediately so ids are stable from the
//! moment an actor is created.

use slotmap::{new_key_type, Key, KeyData, SlotMap};

new_key_type! {
    /// Key for actors in an [`ActorSet`]
    pub struct ActorId;
}

impl ActorId {
    /// Pack the id into a physics shape's user data slot
    pub fn to_user_data(self) -> u64 {
        self.data().as_ffi()
    }

    /// Recover an id from a shape's user data slot
    pub fn from_user_data(value: u64) -> Self {
        ActorId::from(KeyData::from_ffi(value))
    }
}

/// Outcome of a removal request
#[derive(Debug)]
pub enum Removal<T> {
    /// The value was taken out of the set right away
    Removed(T),
    /// The set is locked; the removal happens on the next flush
    Deferred,
    /// Unknown or already removed id
    Missing,
}

/// Slotmap-backed collection with an advisory lock and deferred queues
pub struct ActorSet<T> {
    storage: SlotMap<ActorId, T>,
    /// Iteration order of the active members
    active: Vec<ActorId>,
    pending_add: Vec<ActorId>,
    pending_remove: Vec<ActorId>,
    locked: bool,
}

impl<T> Default for ActorSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActorSet<T> {
    pub fn new() -> Self {
        Self {
            storage: SlotMap::with_key(),
            active: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            locked: false,
        }
    }

    /// Acquire the advisory lock; false if it is already held
    pub fn try_lock(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Add a value, returning its id
    pub fn add(&mut self, value: T) -> ActorId {
        self.add_with(|_| value)
    }

    /// Add a value that needs to know its own id
    pub fn add_with(&mut self, build: impl FnOnce(ActorId) -> T) -> ActorId {
        let id = self.storage.insert_with_key(build);
        if self.locked {
            self.pending_add.push(id);
        } else {
            self.activate(id);
        }
        id
    }

    /// Like [`ActorSet::add_with`] for builders that can fail; nothing is
    /// stored on error
    pub fn try_add_with<E>(&mut self, build: impl FnOnce(ActorId) -> Result<T, E>) -> Result<ActorId, E> {
        let id = self.storage.try_insert_with_key(build)?;
        if self.locked {
            self.pending_add.push(id);
        } else {
            self.activate(id);
        }
        Ok(id)
    }

    /// Remove a value, or queue the removal while locked
    pub fn remove(&mut self, id: ActorId) -> Removal<T> {
        if !self.storage.contains_key(id) {
            return Removal::Missing;
        }
        if self.locked {
            if !self.pending_remove.contains(&id) {
                self.pending_remove.push(id);
            }
            return Removal::Deferred;
        }
        self.take(id).map_or(Removal::Missing, Removal::Removed)
    }

    /// Apply queued removals, then queued additions
    ///
    /// Returns the removed values so the caller can tear them down. Does
    /// nothing while the set is locked.
    pub fn flush(&mut self) -> Vec<T> {
        if self.locked {
            return Vec::new();
        }

        let removals = std::mem::take(&mut self.pending_remove);
        let removed: Vec<T> = removals.into_iter().filter_map(|id| self.take(id)).collect();

        for id in std::mem::take(&mut self.pending_add) {
            if self.storage.contains_key(id) {
                self.activate(id);
            }
        }
        removed
    }

    pub fn get(&self, id: ActorId) -> Option<&T> {
        self.storage.get(id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut T> {
        self.storage.get_mut(id)
    }

    /// Mutable access to two distinct values at once
    pub fn get_pair_mut(&mut self, a: ActorId, b: ActorId) -> Option<[&mut T; 2]> {
        self.storage.get_disjoint_mut([a, b])
    }

    /// Whether the id is an active (iterable) member
    pub fn contains(&self, id: ActorId) -> bool {
        self.active.contains(&id)
    }

    /// Number of active members
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Snapshot of the active ids in iteration order
    pub fn ids(&self) -> Vec<ActorId> {
        self.active.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &T)> {
        self.active
            .iter()
            .filter_map(move |id| self.storage.get(*id).map(|value| (*id, value)))
    }

    pub fn pending_removals(&self) -> usize {
        self.pending_remove.len()
    }

    fn activate(&mut self, id: ActorId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    fn take(&mut self, id: ActorId) -> Option<T> {
        self.active.retain(|member| *member != id);
        self.pending_add.retain(|member| *member != id);
        self.storage.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        alive: bool,
        updates: u32,
    }

    fn dummy() -> Dummy {
        Dummy {
            alive: true,
            updates: 0,
        }
    }

    #[test]
    fn test_add_and_remove_unlocked() {
        let mut set = ActorSet::new();
        let id = set.add(dummy());
        assert_eq!(set.len(), 1);
        assert!(set.contains(id));

        assert!(matches!(set.remove(id), Removal::Removed(_)));
        assert!(set.is_empty());
        assert!(matches!(set.remove(id), Removal::Missing), "double removal is a no-op");
    }

    #[test]
    fn test_lock_is_advisory() {
        let mut set: ActorSet<Dummy> = ActorSet::new();
        assert!(set.try_lock());
        assert!(!set.try_lock());
        set.unlock();
        assert!(set.try_lock());
    }

    #[test]
    fn test_death_mid_pass_is_deferred() {
        let mut set = ActorSet::new();
        let ids: Vec<ActorId> = (0..3).map(|_| set.add(dummy())).collect();

        assert!(set.try_lock());
        for id in set.ids() {
            if id == ids[1] {
                if let Some(actor) = set.get_mut(id) {
                    actor.alive = false;
                }
            }
            let dead = set.get(id).map(|a| !a.alive).unwrap_or(false);
            if dead {
                assert!(matches!(set.remove(id), Removal::Deferred));
            }
            if let Some(actor) = set.get_mut(id) {
                actor.updates += 1;
            }
            assert_eq!(set.len(), 3, "membership is frozen mid-pass");
        }
        assert!(set.get(ids[1]).is_some(), "dead actor stays readable");

        assert!(set.flush().is_empty(), "flush waits for the lock");
        set.unlock();
        let removed = set.flush();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].updates, 1);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(ids[1]));
    }

    #[test]
    fn test_add_while_locked_is_deferred() {
        let mut set = ActorSet::new();
        set.add(dummy());
        set.try_lock();
        let late = set.add(dummy());
        assert_eq!(set.len(), 1);
        assert!(set.get(late).is_some(), "storage is allocated immediately");

        set.unlock();
        set.flush();
        assert_eq!(set.len(), 2);
        assert!(set.contains(late));
    }

    #[test]
    fn test_duplicate_removal_requests_collapse() {
        let mut set = ActorSet::new();
        let id = set.add(dummy());
        set.try_lock();
        set.remove(id);
        set.remove(id);
        assert_eq!(set.pending_removals(), 1);
        set.unlock();
        assert_eq!(set.flush().len(), 1);
        assert!(set.flush().is_empty());
    }

    #[test]
    fn test_add_then_remove_in_same_pass() {
        let mut set = ActorSet::new();
        set.try_lock();
        let id = set.add(dummy());
        set.remove(id);
        set.unlock();
        let removed = set.flush();
        assert_eq!(removed.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_failed_build_stores_nothing() {
        let mut set: ActorSet<Dummy> = ActorSet::new();
        let failed: Result<ActorId, &str> = set.try_add_with(|_| Err("no spawn point"));
        assert!(failed.is_err());
        assert!(set.is_empty());

        let mut seen = None;
        let id = set
            .try_add_with(|id| {
                seen = Some(id);
                Ok::<_, &str>(dummy())
            })
            .expect("build succeeds");
        assert_eq!(seen, Some(id));
        assert!(set.contains(id));
    }

    #[test]
    fn test_user_data_round_trip() {
        let mut set = ActorSet::new();
        let id = set.add(dummy());
        assert_eq!(ActorId::from_user_data(id.to_user_data()), id);
        assert!(set.get(ActorId::from_user_data(0)).is_none());
    }
}
