//! Tunnel shader sources
//!
//! The embedded pair is always available. A `tunnel.glsl` fragment shader
//! in the shader directory replaces the embedded fragment stage; the vertex
//! stage is always the embedded one.
//!
//! Uniforms the renderer sets (missing ones are skipped silently):
//! `u_texture`, `u_time`, `u_resolution`, `u_vignette_strength`, `u_warmth`,
//! `u_distortion`, `u_focal`, `u_vignette_outer`, `u_vignette_inner`,
//! `u_breath_amount`, `u_breath_speed`.

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Override file name looked up in the shader directory
pub const OVERRIDE_FILE: &str = "tunnel.glsl";

/// Full-screen quad, clip-space positions
pub const VERTEX_SHADER: &str = r#"
#version 330 core

layout (location = 0) in vec2 a_pos;
layout (location = 1) in vec2 a_uv;

out vec2 v_uv;

void main() {
    gl_Position = vec4(a_pos, 0.0, 1.0);
    v_uv = a_uv;
}
"#;

/// Lens distortion, warmth grade, vignette (in that order)
pub const FRAGMENT_SHADER: &str = r#"
#version 330 core

in vec2 v_uv;
out vec4 FragColor;

uniform sampler2D u_texture;
uniform float u_time;
uniform vec2 u_resolution;
uniform float u_vignette_strength;
uniform float u_warmth;
uniform float u_distortion;
uniform vec2 u_focal;
uniform float u_vignette_outer;
uniform float u_vignette_inner;
uniform float u_breath_amount;
uniform float u_breath_speed;

void main() {
    vec2 uv = v_uv;

    // Lens: pull samples toward the focal point, breathing over time
    vec2 delta = uv - u_focal;
    float r2 = dot(delta, delta);
    float f = 1.0 + r2 * (u_distortion + u_breath_amount * sin(u_time * u_breath_speed));
    vec2 dUv = u_focal + delta / f;

    // Rows are uploaded top-first
    vec4 color = texture(u_texture, vec2(dUv.x, 1.0 - dUv.y));

    vec3 warm_filter = vec3(1.0, 0.95, 0.85);
    color.rgb = mix(color.rgb, color.rgb * warm_filter, u_warmth);

    // Vignette on the undistorted coordinate
    float d = distance(uv, u_focal);
    color.rgb *= smoothstep(u_vignette_outer, u_vignette_inner, d * u_vignette_strength);

    FragColor = color;
}
"#;

/// Where the active fragment shader came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Embedded,
    File(PathBuf),
}

/// Vertex + fragment pair handed to the renderer
#[derive(Debug, Clone)]
pub struct TunnelShaders {
    vertex: String,
    fragment: String,
    source: ShaderSource,
}

impl Default for TunnelShaders {
    fn default() -> Self {
        Self::embedded()
    }
}

impl TunnelShaders {
    pub fn embedded() -> Self {
        Self {
            vertex: VERTEX_SHADER.to_string(),
            fragment: FRAGMENT_SHADER.to_string(),
            source: ShaderSource::Embedded,
        }
    }

    /// Embedded shaders, overridden by `dir/tunnel.glsl` when present
    pub fn load(dir: &Path) -> Self {
        let mut shaders = Self::embedded();
        let path = dir.join(OVERRIDE_FILE);

        if !path.exists() {
            info!("No {} in {}, using embedded shader", OVERRIDE_FILE, dir.display());
            return shaders;
        }

        match fs::read_to_string(&path) {
            Ok(fragment) if !fragment.trim().is_empty() => {
                info!("Loaded shader override: {}", path.display());
                shaders.fragment = fragment;
                shaders.source = ShaderSource::File(path);
            }
            Ok(_) => warn!("Shader override {} is empty, ignoring", path.display()),
            Err(e) => warn!("Failed to read shader file {}: {}", path.display(), e),
        }
        shaders
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_uses_embedded() {
        let shaders = TunnelShaders::load(Path::new("/nonexistent/shaders"));
        assert_eq!(shaders.source(), &ShaderSource::Embedded);
        assert_eq!(shaders.fragment(), FRAGMENT_SHADER);
    }

    #[test]
    fn test_override_file_replaces_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let custom = "#version 330 core\nout vec4 FragColor;\nvoid main() { FragColor = vec4(1.0); }\n";
        fs::write(dir.path().join(OVERRIDE_FILE), custom).unwrap();

        let shaders = TunnelShaders::load(dir.path());
        assert_eq!(shaders.fragment(), custom);
        assert_eq!(shaders.vertex(), VERTEX_SHADER);
        assert!(matches!(shaders.source(), ShaderSource::File(_)));
    }

    #[test]
    fn test_empty_override_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(OVERRIDE_FILE), "  \n").unwrap();
        assert_eq!(TunnelShaders::load(dir.path()).source(), &ShaderSource::Embedded);
    }

    #[test]
    fn test_embedded_declares_pipeline_uniforms() {
        for name in ["u_texture", "u_time", "u_vignette_strength", "u_warmth", "u_distortion"] {
            assert!(FRAGMENT_SHADER.contains(name), "missing {}", name);
        }
    }
}
