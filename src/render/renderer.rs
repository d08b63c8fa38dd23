//! OpenGL tunnel renderer
//!
//! Draws one full-viewport quad through the tunnel shader, sampling the
//! active frame. Runs inside an egui paint callback, so the GL viewport is
//! already set to the tunnel rect when `render()` is called.
//!
//! The texture is re-uploaded only when the `ShaderState` revision changes;
//! the shader clock and tuning uniforms are set every draw.

use eframe::glow::{self, HasContext};
use log::{debug, error, info, trace};
use std::fmt;

use super::shaders::TunnelShaders;
use super::state::{RendererPhase, ShaderState};
use crate::entities::frame::Frame;

/// Presentation surface errors
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTargetError {
    /// Window was created without a glow context
    NoContext,
    /// Shader stage failed to compile
    Compile { stage: &'static str, log: String },
    /// Program failed to link
    Link(String),
    /// GL object allocation failed
    Resource(String),
}

impl fmt::Display for RenderTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTargetError::NoContext => write!(f, "No OpenGL context available"),
            RenderTargetError::Compile { stage, log } => {
                write!(f, "{} shader compilation failed: {}", stage, log)
            }
            RenderTargetError::Link(log) => write!(f, "Shader program linking failed: {}", log),
            RenderTargetError::Resource(msg) => write!(f, "GL resource error: {}", msg),
        }
    }
}

impl std::error::Error for RenderTargetError {}

/// GL objects for the tunnel pass
pub struct TunnelRenderer {
    program: Option<glow::Program>,
    vao: Option<glow::VertexArray>,
    vbo: Option<glow::Buffer>,
    texture: Option<glow::Texture>,
    texture_width: usize,
    texture_height: usize,
    uploaded_revision: Option<u64>,
    shaders: TunnelShaders,
}

impl TunnelRenderer {
    pub fn new(shaders: TunnelShaders) -> Self {
        Self {
            program: None,
            vao: None,
            vbo: None,
            texture: None,
            texture_width: 0,
            texture_height: 0,
            uploaded_revision: None,
            shaders,
        }
    }

    /// Compile the program and build the quad
    ///
    /// Called once at app creation; a failure here means the tunnel cannot
    /// be shown at all.
    pub fn init(&mut self, gl: &glow::Context) -> Result<(), RenderTargetError> {
        let program = compile_program(gl, self.shaders.vertex(), self.shaders.fragment())
            .inspect_err(|e| error!("{}", e))?;

        unsafe {
            if let Some(old) = self.program.replace(program) {
                gl.delete_program(old);
            }

            if self.vao.is_none() {
                let vao = gl.create_vertex_array().map_err(RenderTargetError::Resource)?;
                gl.bind_vertex_array(Some(vao));

                let vbo = gl.create_buffer().map_err(RenderTargetError::Resource)?;
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));

                // Clip-space quad, uv origin bottom-left
                #[rustfmt::skip]
                let vertices: [f32; 16] = [
                    // pos.x, pos.y, uv.x, uv.y
                    -1.0, -1.0,  0.0, 0.0,  // bottom-left
                     1.0, -1.0,  1.0, 0.0,  // bottom-right
                     1.0,  1.0,  1.0, 1.0,  // top-right
                    -1.0,  1.0,  0.0, 1.0,  // top-left
                ];

                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(&vertices),
                    glow::STATIC_DRAW,
                );

                gl.enable_vertex_attrib_array(0);
                gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 16, 0);
                gl.enable_vertex_attrib_array(1);
                gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 16, 8);

                gl.bind_vertex_array(None);
                gl.bind_buffer(glow::ARRAY_BUFFER, None);

                self.vao = Some(vao);
                self.vbo = Some(vbo);
            }
        }

        info!("TunnelRenderer initialized ({:?} shader)", self.shaders.source());
        Ok(())
    }

    /// Copy a frame's pixels into the texture, reallocating on size change
    pub fn upload_frame(&mut self, gl: &glow::Context, frame: &Frame) {
        let (width, height) = frame.resolution();

        unsafe {
            let realloc = self.texture.is_none()
                || self.texture_width != width
                || self.texture_height != height;

            if self.texture.is_none() {
                self.texture = gl.create_texture().ok();
            }
            let Some(texture) = self.texture else {
                error!("Failed to create tunnel texture");
                return;
            };

            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);

            if realloc {
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    glow::RGBA8 as i32,
                    width as i32,
                    height as i32,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    glow::PixelUnpackData::Slice(Some(frame.pixels())),
                );
                for (param, value) in [
                    (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
                    (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
                    (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
                    (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
                ] {
                    gl.tex_parameter_i32(glow::TEXTURE_2D, param, value as i32);
                }
                self.texture_width = width;
                self.texture_height = height;
                debug!("Tunnel texture allocated {}x{}", width, height);
            } else {
                gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    0,
                    0,
                    width as i32,
                    height as i32,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    glow::PixelUnpackData::Slice(Some(frame.pixels())),
                );
            }

            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        trace!("Uploaded frame {}", frame.index());
    }

    /// Draw the tunnel for the current state
    ///
    /// Never blocks; before the first frame is resolved it draws nothing.
    pub fn render(&mut self, gl: &glow::Context, state: &ShaderState) {
        if state.phase() == RendererPhase::Uninitialized {
            return;
        }

        if self.uploaded_revision != Some(state.revision())
            && let Some(frame) = state.active()
        {
            self.upload_frame(gl, frame);
            self.uploaded_revision = Some(state.revision());
        }

        let (Some(program), Some(vao), Some(texture)) = (self.program, self.vao, self.texture)
        else {
            return;
        };

        let params = &state.params;
        let size = state.viewport_size();

        unsafe {
            gl.disable(glow::BLEND);
            gl.use_program(Some(program));

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            if let Some(loc) = gl.get_uniform_location(program, "u_texture") {
                gl.uniform_1_i32(Some(&loc), 0);
            }

            let floats = [
                ("u_time", state.elapsed()),
                ("u_vignette_strength", params.vignette_strength),
                ("u_warmth", params.warmth),
                ("u_distortion", params.distortion),
                ("u_vignette_outer", params.vignette_outer),
                ("u_vignette_inner", params.vignette_inner),
                ("u_breath_amount", params.breath_amount),
                ("u_breath_speed", params.breath_speed),
            ];
            for (name, value) in floats {
                if let Some(loc) = gl.get_uniform_location(program, name) {
                    gl.uniform_1_f32(Some(&loc), value);
                }
            }
            if let Some(loc) = gl.get_uniform_location(program, "u_resolution") {
                gl.uniform_2_f32(Some(&loc), size.x, size.y);
            }
            if let Some(loc) = gl.get_uniform_location(program, "u_focal") {
                gl.uniform_2_f32(Some(&loc), params.focal.x, params.focal.y);
            }

            gl.bind_vertex_array(Some(vao));
            gl.draw_arrays(glow::TRIANGLE_FAN, 0, 4);
            gl.bind_vertex_array(None);

            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    /// Cleanup OpenGL resources
    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            if let Some(texture) = self.texture.take() {
                gl.delete_texture(texture);
            }
            if let Some(vbo) = self.vbo.take() {
                gl.delete_buffer(vbo);
            }
            if let Some(vao) = self.vao.take() {
                gl.delete_vertex_array(vao);
            }
            if let Some(program) = self.program.take() {
                gl.delete_program(program);
            }
        }
        self.uploaded_revision = None;
    }
}

impl Drop for TunnelRenderer {
    fn drop(&mut self) {
        // GL objects need the context; destroy() must run first
        if self.program.is_some() {
            error!("TunnelRenderer dropped without calling destroy()");
        }
    }
}

fn compile_stage(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, RenderTargetError> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(RenderTargetError::Resource)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(RenderTargetError::Compile { stage, log });
        }
        Ok(shader)
    }
}

fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, RenderTargetError> {
    let vertex = compile_stage(gl, glow::VERTEX_SHADER, "Vertex", vertex_src)?;
    let fragment = match compile_stage(gl, glow::FRAGMENT_SHADER, "Fragment", fragment_src) {
        Ok(s) => s,
        Err(e) => {
            unsafe { gl.delete_shader(vertex) };
            return Err(e);
        }
    };

    unsafe {
        let program = match gl.create_program() {
            Ok(p) => p,
            Err(e) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(RenderTargetError::Resource(e));
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);

        let linked = gl.get_program_link_status(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        if !linked {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(RenderTargetError::Link(log));
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = RenderTargetError::Compile {
            stage: "Fragment",
            log: "0:12: syntax error".into(),
        };
        assert_eq!(e.to_string(), "Fragment shader compilation failed: 0:12: syntax error");
        assert_eq!(RenderTargetError::NoContext.to_string(), "No OpenGL context available");
    }
}
