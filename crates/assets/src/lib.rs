//! File-backed asset loading.
//!
//! [`AssetLoader`] turns `{root}/{name}.obj` plus an image file into a
//! [`MeshComponent`] whose material is registered with the world.
//! [`FileShaderSource`] serves WGSL text from `{root}/{name}.wgsl`.
//! [`demo`] assembles the stock scene used by the viewer and the CLI, and
//! [`AppConfig`] is the JSON file both of them accept.
//!
//! # Invariants
//! - Every loaded mesh gets a fresh material identity from the world.
//! - Loaded textures are RGBA8 and sampled with linear filters.
//! - Parse errors carry the 1-based source line.

mod config;
pub mod demo;
mod obj;
mod primitives;

pub use config::{AppConfig, ModelConfig};
pub use demo::{DemoScene, build_demo_scene};
pub use obj::{ObjMesh, parse_obj};
pub use primitives::cube_vertices;

use spacekit_ecs::{Bitmap, EcsError, MaterialConfig, MeshComponent, World};
use spacekit_render::{ShaderError, ShaderSource};
use std::path::{Path, PathBuf};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("OBJ parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Loads meshes and textures relative to a root directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mesh_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.obj"))
    }

    /// Parse `{root}/{name}.obj` without touching any texture.
    pub fn load_obj(&self, name: &str) -> Result<ObjMesh, AssetError> {
        load_obj_file(self.mesh_path(name))
    }

    /// Load `{root}/{name}.obj` and texture it with `texture_path`
    /// (relative to the root unless absolute).
    pub fn load_mesh(
        &self,
        world: &mut World,
        name: &str,
        texture_path: impl AsRef<Path>,
    ) -> Result<MeshComponent, AssetError> {
        let obj = self.load_obj(name)?;
        let bitmap = load_bitmap(self.root.join(texture_path))?;
        let material = world.create_material(MaterialConfig::linear(bitmap));
        tracing::info!(
            mesh = name,
            vertices = obj.vertex_count(),
            material = %material.id(),
            "loaded mesh"
        );
        Ok(MeshComponent::new(obj.vertices, material))
    }
}

pub fn load_obj_file(path: impl AsRef<Path>) -> Result<ObjMesh, AssetError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&source)
}

/// Decode any supported image into an RGBA8 [`Bitmap`].
pub fn load_bitmap(path: impl AsRef<Path>) -> Result<Bitmap, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "decoded texture");
    Ok(Bitmap::new(width, height, rgba.into_raw())?)
}

/// WGSL sources read from `{root}/{name}.wgsl`.
#[derive(Debug, Clone)]
pub struct FileShaderSource {
    root: PathBuf,
}

impl FileShaderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ShaderSource for FileShaderSource {
    fn load_shader(&self, name: &str) -> Result<String, ShaderError> {
        let path = self.root.join(format!("{name}.wgsl"));
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ShaderError::NotFound(name.to_string()))
            }
            Err(source) => Err(ShaderError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacekit_ecs::VERTEX_FLOATS;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn load_mesh_builds_textured_component() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.obj"), TRIANGLE).unwrap();
        std::fs::create_dir(dir.path().join("tri")).unwrap();
        write_png(&dir.path().join("tri/skin.png"), 4, 2);

        let mut world = World::new();
        let loader = AssetLoader::new(dir.path());
        let mesh = loader.load_mesh(&mut world, "tri", "tri/skin.png").unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices().len(), 3 * VERTEX_FLOATS);
        let material = mesh.material();
        assert_eq!(material.texture_size(), [4, 2]);
        assert_eq!(&material.texture().pixels()[0..4], &[10, 20, 30, 255]);
        assert_eq!(material.min_filter(), spacekit_ecs::FilterMode::Linear);
    }

    #[test]
    fn each_load_gets_a_new_material() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.obj"), TRIANGLE).unwrap();
        write_png(&dir.path().join("skin.png"), 1, 1);

        let mut world = World::new();
        let loader = AssetLoader::new(dir.path());
        let a = loader.load_mesh(&mut world, "tri", "skin.png").unwrap();
        let b = loader.load_mesh(&mut world, "tri", "skin.png").unwrap();
        assert_ne!(a.material().id(), b.material().id());
    }

    #[test]
    fn missing_mesh_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = World::new();
        let err = AssetLoader::new(dir.path())
            .load_mesh(&mut world, "nope", "skin.png")
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }), "{err}");
    }

    #[test]
    fn corrupt_texture_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.obj"), TRIANGLE).unwrap();
        std::fs::write(dir.path().join("skin.png"), b"not a png").unwrap();
        let mut world = World::new();
        let err = AssetLoader::new(dir.path())
            .load_mesh(&mut world, "tri", "skin.png")
            .unwrap_err();
        assert!(matches!(err, AssetError::Image(_)), "{err}");
    }

    #[test]
    fn parse_error_surfaces_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.obj"), "v 0 0\n").unwrap();
        let err = AssetLoader::new(dir.path()).load_obj("bad").unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn file_shader_source_reads_wgsl() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.wgsl"), "fn vs_main() {}").unwrap();
        let shaders = FileShaderSource::new(dir.path());
        assert_eq!(shaders.load_shader("base").unwrap(), "fn vs_main() {}");
        assert!(matches!(
            shaders.load_shader("missing"),
            Err(ShaderError::NotFound(name)) if name == "missing"
        ));
    }
}
