//! Geometry id to mesh lookup.

use std::sync::Arc;
use tinyray_accel::GeometryId;

/// Maps engine-issued geometry ids to the meshes they were issued for.
///
/// Engines are free to hand out ids in any order and with gaps, so the
/// store is a slot vector indexed by id. When an id lands past the end the
/// slot count grows to `max(2 * len, 2 * (id + 1))`; unused slots stay `None`.
pub struct MeshRegistry<M> {
    slots: Vec<Option<Arc<M>>>,
    count: usize,
}

impl<M> MeshRegistry<M> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            count: 0,
        }
    }

    /// Record `mesh` under `id`.
    ///
    /// # Panics
    /// If `id` is already taken. Engines never reissue an id, so this means
    /// the registry and the engine disagree.
    pub fn insert(&mut self, id: GeometryId, mesh: Arc<M>) {
        let index = id as usize;
        if index >= self.slots.len() {
            let grown = (2 * self.slots.len()).max(2 * (index + 1));
            self.slots.resize_with(grown, || None);
        }

        let slot = &mut self.slots[index];
        assert!(slot.is_none(), "geometry id {} registered twice", id);
        *slot = Some(mesh);
        self.count += 1;
    }

    /// The mesh registered under `id`, if any.
    pub fn get(&self, id: GeometryId) -> Option<&M> {
        self.slots.get(id as usize)?.as_deref()
    }

    /// Number of slots currently allocated.
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of registered meshes.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Registered meshes with their ids, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GeometryId, &M)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_deref().map(|mesh| (id as GeometryId, mesh)))
    }
}

impl<M> Default for MeshRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_policy() {
        let mut registry = MeshRegistry::new();
        assert_eq!(registry.capacity(), 0);

        registry.insert(0, Arc::new("a"));
        assert_eq!(registry.capacity(), 2);

        // max(2 * 2, 2 * 6)
        registry.insert(5, Arc::new("b"));
        assert_eq!(registry.capacity(), 12);

        // Fits, no growth
        registry.insert(1, Arc::new("c"));
        assert_eq!(registry.capacity(), 12);

        // max(2 * 12, 2 * 13)
        registry.insert(12, Arc::new("d"));
        assert_eq!(registry.capacity(), 26);

        // Sequential ids reallocate only a logarithmic number of times
        let mut dense = MeshRegistry::new();
        let mut reallocations = 0;
        for id in 0..1000 {
            let before = dense.capacity();
            dense.insert(id, Arc::new(id));
            if dense.capacity() != before {
                reallocations += 1;
            }
        }
        assert_eq!(dense.len(), 1000);
        assert!(reallocations <= 10);
    }

    #[test]
    fn test_sparse_lookup() {
        let mut registry = MeshRegistry::new();
        registry.insert(0, Arc::new("zero"));
        registry.insert(5, Arc::new("five"));
        registry.insert(1, Arc::new("one"));

        assert_eq!(registry.get(0), Some(&"zero"));
        assert_eq!(registry.get(5), Some(&"five"));
        assert_eq!(registry.get(1), Some(&"one"));
        assert_eq!(registry.get(3), None);
        assert_eq!(registry.get(1000), None);
        assert_eq!(registry.len(), 3);

        let ids: Vec<GeometryId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 5]);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_id_panics() {
        let mut registry = MeshRegistry::new();
        registry.insert(3, Arc::new(()));
        registry.insert(3, Arc::new(()));
    }
}
