//! WGSL sources for the three pipelines.
//!
//! All programs share `FrameUniforms` at group 0 so one bind group serves
//! every pass. Object uniforms live at group 1 behind a dynamic offset.

/// Depth-only program for the shadow pass. No fragment stage.
pub const DEPTH_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    skybox_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light_pos: vec4<f32>,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> object: ObjectUniforms;

@vertex
fn vs_depth(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return frame.light_space * object.model * vec4<f32>(position, 1.0);
}
"#;

/// Lit program: ambient + Lambert + Blinn-Phong, attenuated by a 3x3 PCF
/// shadow lookup.
pub const LIT_SHADER: &str = r#"
const AMBIENT: f32 = 0.3;
const SHININESS: f32 = 32.0;
const SPECULAR_STRENGTH: f32 = 0.5;

struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    skybox_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light_pos: vec4<f32>,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    // x: 1.0 when a texture is bound
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> object: ObjectUniforms;

@group(2) @binding(0)
var shadow_map: texture_depth_2d;
@group(2) @binding(1)
var shadow_sampler: sampler_comparison;

@group(3) @binding(0)
var albedo_texture: texture_2d<f32>;
@group(3) @binding(1)
var albedo_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) light_space_pos: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (object.normal * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    out.light_space_pos = frame.light_space * world;
    return out;
}

// Fraction of the 3x3 neighbourhood that is occluded, 0 = fully lit.
fn shadow_factor(light_space_pos: vec4<f32>, n: vec3<f32>, l: vec3<f32>) -> f32 {
    let proj = light_space_pos.xyz / light_space_pos.w;
    let uv = vec2<f32>(proj.x * 0.5 + 0.5, 1.0 - (proj.y * 0.5 + 0.5));
    if (proj.z > 1.0 || uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0) {
        return 0.0;
    }

    let bias = max(0.005 * (1.0 - dot(n, l)), 0.0005);
    let texel = 1.0 / vec2<f32>(textureDimensions(shadow_map));
    var shadow = 0.0;
    for (var x: i32 = -1; x <= 1; x = x + 1) {
        for (var y: i32 = -1; y <= 1; y = y + 1) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            let lit = textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, proj.z - bias);
            shadow = shadow + (1.0 - lit);
        }
    }
    return shadow / 9.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(albedo_texture, albedo_sampler, in.uv);
    let albedo = object.color.rgb * mix(vec3<f32>(1.0), texel.rgb, object.params.x);

    let n = normalize(in.normal);
    let l = normalize(frame.light_pos.xyz - in.world_pos);
    let v = normalize(frame.camera_pos.xyz - in.world_pos);
    let h = normalize(l + v);

    let diffuse = max(dot(n, l), 0.0);
    let specular = SPECULAR_STRENGTH * pow(max(dot(n, h), 0.0), SHININESS);
    let shadow = shadow_factor(in.light_space_pos, n, l);

    let lighting = AMBIENT + (1.0 - shadow) * (diffuse + specular);
    return vec4<f32>(lighting * albedo, 1.0);
}
"#;

/// Skybox program: rotation-only view, depth pinned to the far plane.
pub const SKYBOX_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    skybox_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light_pos: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var sky_texture: texture_cube<f32>;
@group(1) @binding(1)
var sky_sampler: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> SkyOutput {
    let clip = frame.skybox_view_proj * vec4<f32>(position, 1.0);

    var out: SkyOutput;
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_present() {
        assert!(DEPTH_SHADER.contains("fn vs_depth"));
        assert!(!DEPTH_SHADER.contains("@fragment"));
        assert!(LIT_SHADER.contains("fn vs_main"));
        assert!(LIT_SHADER.contains("fn fs_main"));
        assert!(SKYBOX_SHADER.contains("fn vs_sky"));
        assert!(SKYBOX_SHADER.contains("fn fs_sky"));
    }

    #[test]
    fn lighting_constants() {
        assert!(LIT_SHADER.contains("const AMBIENT: f32 = 0.3;"));
        assert!(LIT_SHADER.contains("const SHININESS: f32 = 32.0;"));
        assert!(LIT_SHADER.contains("max(0.005 * (1.0 - dot(n, l)), 0.0005)"));
        assert!(LIT_SHADER.contains("shadow / 9.0"));
    }

    #[test]
    fn skybox_sits_on_far_plane() {
        assert!(SKYBOX_SHADER.contains("clip.xyww"));
        assert!(SKYBOX_SHADER.contains("texture_cube<f32>"));
    }

    #[test]
    fn frame_uniform_block_is_shared() {
        let block = |src: &str| {
            let start = src.find("struct FrameUniforms").unwrap();
            let end = start + src[start..].find("};").unwrap();
            src[start..end].to_string()
        };
        assert_eq!(block(DEPTH_SHADER), block(LIT_SHADER));
        assert_eq!(block(LIT_SHADER), block(SKYBOX_SHADER));
    }
}
