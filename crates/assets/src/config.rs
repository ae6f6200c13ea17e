use crate::{AssetError, AssetLoader};
use serde::{Deserialize, Serialize};
use spacekit_ecs::{CameraConfig, MeshComponent, World};
use spacekit_input::FlyController;
use spacekit_render::RendererConfig;
use std::path::{Path, PathBuf};

/// Optional model placed in the demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding `{name}.obj` and the texture.
    pub root: PathBuf,
    pub name: String,
    /// Relative to `root`.
    pub texture: PathBuf,
}

impl ModelConfig {
    pub fn load(&self, world: &mut World) -> Result<MeshComponent, AssetError> {
        AssetLoader::new(&self.root).load_mesh(world, &self.name, &self.texture)
    }
}

/// Application settings. Every section is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub renderer: RendererConfig,
    pub controller: FlyController,
    pub model: Option<ModelConfig>,
    /// Directory of `.wgsl` overrides; the built-in shader is used when unset.
    pub shader_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded app config");
        Ok(config)
    }

    /// Camera settings sized to the renderer's initial surface.
    pub fn camera_for_surface(&self) -> CameraConfig {
        CameraConfig {
            screen_width: self.renderer.width,
            screen_height: self.renderer.height,
            ..self.camera
        }
    }
}
