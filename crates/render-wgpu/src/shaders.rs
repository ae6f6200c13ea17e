use spacekit_render::{ShaderError, ShaderSource};

/// Textured Lambert shading lit by the packed directional and point lights.
pub const BASE_SHADER: &str = r#"
struct Scene {
    view_proj: mat4x4<f32>,
    camera_position: vec3<f32>,
    directional_count: u32,
    point_count: u32,
};

struct DirectionalLight {
    color: vec3<f32>,
    intensity: f32,
    rotation: mat3x3<f32>,
};

struct PointLight {
    position: vec3<f32>,
    intensity: f32,
    color: vec3<f32>,
    range: f32,
    direction: vec3<f32>,
    angle: f32,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat3x3<f32>,
};

@group(0) @binding(0)
var<uniform> scene_data: Scene;
@group(0) @binding(1)
var<storage, read> directional_lights: array<DirectionalLight>;
@group(0) @binding(2)
var<storage, read> point_lights: array<PointLight>;

@group(1) @binding(0)
var<uniform> object_data: Object;
@group(1) @binding(1)
var object_sampler: sampler;
@group(1) @binding(2)
var object_texture: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

const AMBIENT: f32 = 0.15;

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object_data.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = scene_data.view_proj * world;
    out.world_position = world.xyz;
    out.uv = vertex.uv;
    out.normal = object_data.normal * vertex.normal;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(object_texture, object_sampler, in.uv);
    let n = normalize(in.normal);
    var lighting = vec3<f32>(AMBIENT);

    for (var i = 0u; i < scene_data.directional_count; i++) {
        let light = directional_lights[i];
        let dir = light.rotation * vec3<f32>(0.0, 0.0, -1.0);
        lighting += light.color * light.intensity * max(dot(n, -dir), 0.0);
    }

    for (var i = 0u; i < scene_data.point_count; i++) {
        let light = point_lights[i];
        let to_light = light.position - in.world_position;
        let dist = length(to_light);
        if (dist > light.range) {
            continue;
        }
        let l = to_light / max(dist, 0.0001);
        // Outside the cone around the light's forward axis.
        if (dot(-l, normalize(light.direction)) < cos(light.angle)) {
            continue;
        }
        let falloff = 1.0 - dist / light.range;
        lighting += light.color * light.intensity * falloff * max(dot(n, l), 0.0);
    }

    return vec4<f32>(base.rgb * lighting, base.a);
}
"#;

/// Shaders compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedShaders;

impl ShaderSource for EmbeddedShaders {
    fn load_shader(&self, name: &str) -> Result<String, ShaderError> {
        match name {
            "base" => Ok(BASE_SHADER.to_string()),
            _ => Err(ShaderError::NotFound(name.to_string())),
        }
    }
}
