use crate::layout::LightKind;
use spacekit_common::WorldId;
use spacekit_scene::SceneError;

/// Failure to provide shader source text.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("shader `{0}` not found")]
    NotFound(String),
    #[error("failed to read shader `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("graphics device lost")]
    DeviceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("render target unavailable: {0}")]
    TargetUnavailable(String),
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
    #[error("{kind} light capacity exceeded: {count} lights, capacity {capacity}")]
    LightCapacityExceeded {
        kind: LightKind,
        count: usize,
        capacity: usize,
    },
    #[error("no GPU resources ensured for {0}")]
    NotEnsured(String),
    #[error("renderer is bound to {bound}, cannot draw {found}")]
    ForeignWorld { bound: WorldId, found: WorldId },
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl RenderError {
    /// Whether the renderer cannot continue. Non-fatal errors only cost the
    /// current frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceLost | Self::OutOfMemory | Self::Pipeline(_) | Self::Shader(_)
        )
    }
}
