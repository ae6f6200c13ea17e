use crate::ComponentKind;
use spacekit_common::{ComponentId, EntityId};

/// Errors from entity/component operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),
    /// Raised by `require_component`; callers wanting optional behavior use
    /// `get_component` instead.
    #[error("entity {entity} has no {kind} component")]
    MissingComponent {
        entity: EntityId,
        kind: ComponentKind,
    },
    #[error("component {id} is a {found} component, expected {expected}")]
    WrongKind {
        id: ComponentId,
        expected: ComponentKind,
        found: ComponentKind,
    },
    #[error("component {0} is not attached to any entity")]
    Detached(ComponentId),
    #[error("component {component} is not attached to entity {entity}")]
    NotAttached {
        component: ComponentId,
        entity: EntityId,
    },
    #[error("bitmap of {width}x{height} needs {expected} bytes of RGBA, got {actual}")]
    BitmapSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
