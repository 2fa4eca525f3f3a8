//! WGSL sources for the three render passes.
//!
//! - the sprite pass draws one instanced quad per particle into the offscreen
//!   target, writing a radial falloff to alpha;
//! - the composite pass draws the viewport quad, maps the target's alpha through
//!   the threshold ramp and mixes film grain on top (`fs_main`), or copies the
//!   target unchanged (`fs_debug`);
//! - the label pass draws the text mask, tinted, over the composite.
//!
//! Uniform struct layouts match [`crate::uniforms`] and [`crate::ramp::RampUniform`].

use crate::config::Falloff;
use crate::ramp::MAX_BANDS;

/// Hash-based grain noise in `[0, 1)`.
pub const GRAIN_WGSL: &str = r#"
fn grain(coord: vec2<f32>, time: f32) -> f32 {
    let p = coord + vec2<f32>(time);
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453123);
}
"#;

/// WGSL expression for the sprite alpha, given `dist` from the quad centre.
pub fn falloff_expr(falloff: Falloff) -> &'static str {
    match falloff {
        Falloff::Clamped => "clamp(0.5 - dist, 0.0, 1.0)",
        Falloff::Unclamped => "0.5 - dist",
    }
}

/// Instanced soft-circle sprite.
///
/// Vertex buffer 0 is per-instance: one `vec2<f32>` particle position.
pub fn sprite_shader(falloff: Falloff) -> String {
    let falloff = falloff_expr(falloff);
    format!(
        r#"struct Sprite {{
    projection: mat4x4<f32>,
    extent: vec4<f32>,
}};

@group(0) @binding(0)
var<uniform> sprite: Sprite;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) offset: vec2<f32>,
) -> VertexOutput {{
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>( 0.5, -0.5),
        vec2<f32>( 0.5,  0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>( 0.5,  0.5),
        vec2<f32>(-0.5,  0.5),
    );
    let corner = corners[vertex_index];
    let world = offset + corner * sprite.extent.x;

    var out: VertexOutput;
    out.clip_position = sprite.projection * vec4<f32>(world, 0.0, 1.0);
    out.uv = corner + vec2<f32>(0.5);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = distance(in.uv, vec2<f32>(0.5));
    let c = {falloff};
    return vec4<f32>(vec3<f32>(1.0), c);
}}
"#
    )
}

const QUAD_VERTEX_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.projection * vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

/// Threshold ramp and grain over the offscreen target, plus the debug blit.
pub fn composite_shader() -> String {
    format!(
        r#"struct Uniforms {{
    projection: mat4x4<f32>,
    // xy unused, z = grain time, w = grain blend
    params: vec4<f32>,
}};

struct Ramp {{
    base: vec4<f32>,
    colors: array<vec4<f32>, {bands}>,
    edges: array<vec4<f32>, {bands}>,
    count: vec4<u32>,
}};

@group(0) @binding(0)
var field_texture: texture_2d<f32>;

@group(0) @binding(1)
var field_sampler: sampler;

@group(0) @binding(2)
var<uniform> uniforms: Uniforms;

@group(0) @binding(3)
var<uniform> ramp: Ramp;
{vertex}
{grain}
fn band_weight(edge: vec4<f32>, a: f32) -> f32 {{
    if edge.y <= 0.0 {{
        return step(edge.x, a);
    }}
    return smoothstep(edge.x, edge.x + edge.y, a);
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let a = textureSample(field_texture, field_sampler, in.uv).a;

    var color = ramp.base.rgb;
    let count = min(ramp.count.x, {bands}u);
    for (var i = 0u; i < count; i = i + 1u) {{
        color = mix(color, ramp.colors[i].rgb, band_weight(ramp.edges[i], a));
    }}

    let speckle = grain(in.clip_position.xy, uniforms.params.z);
    color = mix(color, vec3<f32>(speckle), uniforms.params.w);
    return vec4<f32>(color, 1.0);
}}

@fragment
fn fs_debug(in: VertexOutput) -> @location(0) vec4<f32> {{
    return textureSample(field_texture, field_sampler, in.uv);
}}
"#,
        bands = MAX_BANDS,
        vertex = QUAD_VERTEX_WGSL,
        grain = GRAIN_WGSL,
    )
}

/// Tinted text mask quad.
pub fn label_shader() -> String {
    format!(
        r#"struct Uniforms {{
    projection: mat4x4<f32>,
    tint: vec4<f32>,
}};

@group(0) @binding(0)
var mask_texture: texture_2d<f32>;

@group(0) @binding(1)
var mask_sampler: sampler;

@group(0) @binding(2)
var<uniform> uniforms: Uniforms;
{vertex}
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let coverage = textureSample(mask_texture, mask_sampler, in.uv).r;
    return vec4<f32>(uniforms.tint.rgb, coverage * uniforms.tint.a);
}}
"#,
        vertex = QUAD_VERTEX_WGSL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_sprite_shader_valid() {
        for falloff in [Falloff::Clamped, Falloff::Unclamped] {
            let src = sprite_shader(falloff);
            assert!(src.contains(falloff_expr(falloff)));
            validate_wgsl(&src).expect("sprite WGSL should be valid");
        }
    }

    #[test]
    fn test_composite_shader_valid() {
        let src = composite_shader();
        assert!(src.contains("fn fs_debug"));
        assert!(src.contains("array<vec4<f32>, 4>"));
        // Only z and w of params carry data.
        assert!(!src.contains("params.x") && !src.contains("params.y"));
        validate_wgsl(&src).expect("composite WGSL should be valid");
    }

    #[test]
    fn test_label_shader_valid() {
        validate_wgsl(&label_shader()).expect("label WGSL should be valid");
    }
}
