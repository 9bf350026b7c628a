use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentStorage, SparseSet};
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::resource::Resources;

/// Owns entities, their components, and shared resources.
#[derive(Default)]
pub struct World {
    entities: EntityAllocator,
    components: HashMap<TypeId, Box<dyn ComponentStorage>>,
    resources: Resources,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Entities ----

    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawn an entity and drop all of its components.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        for storage in self.components.values_mut() {
            storage.remove(entity.index);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ---- Components ----

    fn storage<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.components.get(&TypeId::of::<T>())?.as_any().downcast_ref()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        self.components.get_mut(&TypeId::of::<T>())?.as_any_mut().downcast_mut()
    }

    /// Attach a component, returning the one it replaced.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Result<Option<T>, EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        if self.storage::<T>().is_none() {
            self.components
                .insert(TypeId::of::<T>(), Box::new(SparseSet::<T>::new()));
        }
        let replaced = self
            .storage_mut::<T>()
            .and_then(|storage| storage.insert(entity.index, component));
        Ok(replaced)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity.index)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity.index)
    }

    /// Detach a component. Returns `true` if it was present.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.components
            .get_mut(&TypeId::of::<T>())
            .is_some_and(|storage| storage.remove(entity.index))
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Live entities that carry a `T`.
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>()
            .map(|storage| {
                storage
                    .indices()
                    .filter_map(|index| self.entities.entity_at(index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of entities carrying a `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, SparseSet::len)
    }

    // ---- Resources ----

    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(value);
    }

    pub fn resource<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn remove_resource<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }
}
