use crate::{CameraComponent, DirectionalLightComponent, MeshComponent, PointLightComponent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Camera,
    DirectionalLight,
    PointLight,
    Mesh,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Camera => "camera",
            Self::DirectionalLight => "directional light",
            Self::PointLight => "point light",
            Self::Mesh => "mesh",
        };
        f.write_str(name)
    }
}

/// Every component the world can hold. The set is closed.
#[derive(Debug, Clone)]
pub enum Component {
    Camera(CameraComponent),
    DirectionalLight(DirectionalLightComponent),
    PointLight(PointLightComponent),
    Mesh(MeshComponent),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Camera(_) => ComponentKind::Camera,
            Self::DirectionalLight(_) => ComponentKind::DirectionalLight,
            Self::PointLight(_) => ComponentKind::PointLight,
            Self::Mesh(_) => ComponentKind::Mesh,
        }
    }
}

/// Typed access to one [`Component`] variant, used for kind-filtered lookups.
pub trait ComponentType: Into<Component> + 'static {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_type {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$variant(value)
            }
        }

        impl ComponentType for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

component_type!(CameraComponent, Camera);
component_type!(DirectionalLightComponent, DirectionalLight);
component_type!(PointLightComponent, PointLight);
component_type!(MeshComponent, Mesh);
