use crate::{
    CameraComponent, Component, ComponentType, EcsError, Entity, Material, MaterialConfig,
};
use glam::Mat4;
use spacekit_common::{
    ComponentId, EntityId, IdAllocator, MaterialId, SceneId, Transform, TransformConfig, WorldId,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
struct ComponentSlot {
    owner: Option<EntityId>,
    component: Component,
}

/// Registry of entities, components and identity allocators.
///
/// Components live in the world independently of entities; attaching one
/// records ownership on both sides. A component has at most one owner, and
/// attaching it elsewhere moves it.
///
/// Each world draws a fresh process-unique [`WorldId`]; its other identities
/// restart at 0 and are only unique within that world.
#[derive(Debug)]
pub struct World {
    id: WorldId,
    entities: BTreeMap<EntityId, Entity>,
    components: BTreeMap<ComponentId, ComponentSlot>,
    entity_ids: IdAllocator,
    component_ids: IdAllocator,
    material_ids: IdAllocator,
    scene_ids: IdAllocator,
}

impl Default for World {
    fn default() -> Self {
        Self {
            id: WorldId::next(),
            entities: BTreeMap::new(),
            components: BTreeMap::new(),
            entity_ids: IdAllocator::new(),
            component_ids: IdAllocator::new(),
            material_ids: IdAllocator::new(),
            scene_ids: IdAllocator::new(),
        }
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Create an entity with the given transform and no components.
    pub fn spawn(&mut self, config: TransformConfig) -> EntityId {
        let id: EntityId = self.entity_ids.allocate();
        self.entities.insert(id, Entity::new(id, Transform::new(config)));
        tracing::trace!(%id, "spawned entity");
        id
    }

    /// Create an entity and attach freshly created components, in order.
    pub fn spawn_with<I>(&mut self, config: TransformConfig, components: I) -> EntityId
    where
        I: IntoIterator<Item = Component>,
    {
        let entity = self.spawn(config);
        for component in components {
            let id = self.insert_component(component);
            self.attach(entity, id);
        }
        entity
    }

    /// Remove an entity. Its components stay in the world, detached.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity, EcsError> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(EcsError::EntityNotFound(id))?;
        for (component, _) in entity.components() {
            if let Some(slot) = self.components.get_mut(&component) {
                slot.owner = None;
            }
        }
        tracing::trace!(%id, "despawned entity");
        Ok(entity)
    }

    /// Store a component without attaching it.
    pub fn create_component(&mut self, component: impl Into<Component>) -> ComponentId {
        self.insert_component(component.into())
    }

    /// Detach (if attached) and remove a component from the world.
    pub fn destroy_component(&mut self, id: ComponentId) -> Result<Component, EcsError> {
        let slot = self
            .components
            .remove(&id)
            .ok_or(EcsError::ComponentNotFound(id))?;
        if let Some(owner) = slot.owner.and_then(|e| self.entities.get_mut(&e)) {
            owner.detach(id);
        }
        Ok(slot.component)
    }

    /// Attach an existing component to `entity`, moving it off any previous
    /// owner. Attaching to the current owner is a no-op.
    pub fn add_component(&mut self, entity: EntityId, component: ComponentId) -> Result<(), EcsError> {
        if !self.entities.contains_key(&entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        if !self.components.contains_key(&component) {
            return Err(EcsError::ComponentNotFound(component));
        }
        self.attach(entity, component);
        Ok(())
    }

    /// Detach `component` from `entity`. The component stays in the world.
    pub fn remove_component(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Result<(), EcsError> {
        let owner = self
            .entities
            .get_mut(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        if !owner.detach(component) {
            return Err(EcsError::NotAttached { component, entity });
        }
        if let Some(slot) = self.components.get_mut(&component) {
            slot.owner = None;
        }
        tracing::trace!(%entity, %component, "detached component");
        Ok(())
    }

    pub fn owner(&self, component: ComponentId) -> Option<EntityId> {
        self.components.get(&component).and_then(|slot| slot.owner)
    }

    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.entities.get(&entity).map(Entity::transform)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.entities.get_mut(&entity).map(Entity::transform_mut)
    }

    /// Transform of the entity owning `component`.
    pub fn component_transform(&self, component: ComponentId) -> Option<&Transform> {
        self.owner(component).and_then(|owner| self.transform(owner))
    }

    /// Untyped access by id.
    pub fn raw_component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id).map(|slot| &slot.component)
    }

    pub fn component<T: ComponentType>(&self, id: ComponentId) -> Option<&T> {
        self.raw_component(id).and_then(T::from_component)
    }

    pub fn component_mut<T: ComponentType>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.components
            .get_mut(&id)
            .and_then(|slot| T::from_component_mut(&mut slot.component))
    }

    /// Id of the first attached component of type `T`.
    pub fn find_component<T: ComponentType>(&self, entity: EntityId) -> Option<ComponentId> {
        self.entities.get(&entity)?.first_of(T::KIND)
    }

    /// First attached component of type `T`, if any.
    pub fn get_component<T: ComponentType>(&self, entity: EntityId) -> Option<&T> {
        self.find_component::<T>(entity)
            .and_then(|id| self.component(id))
    }

    /// All attached components of type `T`, in creation order.
    pub fn get_components<T: ComponentType>(&self, entity: EntityId) -> Vec<&T> {
        let Some(owner) = self.entities.get(&entity) else {
            return Vec::new();
        };
        owner
            .all_of(T::KIND)
            .filter_map(|id| self.component(id))
            .collect()
    }

    /// Like [`World::get_component`] but absence is an error.
    pub fn require_component<T: ComponentType>(&self, entity: EntityId) -> Result<&T, EcsError> {
        if !self.entities.contains_key(&entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        self.get_component::<T>(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                kind: T::KIND,
            })
    }

    /// Resolve an attached component of type `T` together with its owner's
    /// transform.
    pub fn attached<T: ComponentType>(&self, id: ComponentId) -> Result<(&T, &Transform), EcsError> {
        let slot = self
            .components
            .get(&id)
            .ok_or(EcsError::ComponentNotFound(id))?;
        let component = T::from_component(&slot.component).ok_or(EcsError::WrongKind {
            id,
            expected: T::KIND,
            found: slot.component.kind(),
        })?;
        let transform = slot
            .owner
            .and_then(|owner| self.transform(owner))
            .ok_or(EcsError::Detached(id))?;
        Ok((component, transform))
    }

    /// View-projection of an attached camera.
    pub fn camera_view_projection(&self, camera: ComponentId) -> Result<Mat4, EcsError> {
        let (camera, transform) = self.attached::<CameraComponent>(camera)?;
        Ok(camera.view_projection(transform))
    }

    /// Build an immutable material with a fresh id.
    pub fn create_material(&mut self, config: MaterialConfig) -> Arc<Material> {
        let id: MaterialId = self.material_ids.allocate();
        Arc::new(Material::new(id, config))
    }

    pub fn allocate_scene_id(&mut self) -> SceneId {
        self.scene_ids.allocate()
    }

    fn insert_component(&mut self, component: Component) -> ComponentId {
        let id: ComponentId = self.component_ids.allocate();
        self.components.insert(
            id,
            ComponentSlot {
                owner: None,
                component,
            },
        );
        id
    }

    /// Both ids must exist.
    fn attach(&mut self, entity: EntityId, component: ComponentId) {
        let Some(slot) = self.components.get_mut(&component) else {
            return;
        };
        let kind = slot.component.kind();
        let previous = slot.owner.replace(entity);
        if previous == Some(entity) {
            return;
        }
        if let Some(prev) = previous.and_then(|e| self.entities.get_mut(&e)) {
            prev.detach(component);
        }
        if let Some(owner) = self.entities.get_mut(&entity) {
            owner.attach(component, kind);
        }
        tracing::trace!(%entity, %component, %kind, "attached component");
    }
}
