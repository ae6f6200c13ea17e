use crate::ComponentKind;
use spacekit_common::{ComponentId, EntityId, Transform};
use std::collections::BTreeMap;

/// A transform plus the ids of the components attached to it.
///
/// Component ids are kept ordered, so "the first component of a kind" is the
/// one created earliest.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    transform: Transform,
    components: BTreeMap<ComponentId, ComponentKind>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            components: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Attached components in creation order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, ComponentKind)> + '_ {
        self.components.iter().map(|(id, kind)| (*id, *kind))
    }

    pub fn has(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn first_of(&self, kind: ComponentKind) -> Option<ComponentId> {
        self.all_of(kind).next()
    }

    pub fn all_of(&self, kind: ComponentKind) -> impl Iterator<Item = ComponentId> + '_ {
        self.components
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(id, _)| *id)
    }

    pub(crate) fn attach(&mut self, id: ComponentId, kind: ComponentKind) {
        self.components.insert(id, kind);
    }

    pub(crate) fn detach(&mut self, id: ComponentId) -> bool {
        self.components.remove(&id).is_some()
    }
}
