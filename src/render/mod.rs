//! Tunnel rendering - shader state, GL pass and its CPU reference

pub mod post;
pub mod renderer;
pub mod shaders;
pub mod state;

pub use renderer::{RenderTargetError, TunnelRenderer};
pub use shaders::TunnelShaders;
pub use state::{RendererPhase, ShaderParams, ShaderState};
