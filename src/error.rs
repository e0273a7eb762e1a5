//! # Error Types
//!
//! Every fallible operation in the renderer returns [`RenderError`]. The
//! variants fall into four groups:
//!
//! - **Native call failures**: the graphics API reported an error code or
//!   refused to create an object.
//! - **Shader build failures**: compile or link errors, carrying the
//!   compiler log verbatim.
//! - **Contract violations**: missing uniforms, malformed vertex layouts,
//!   invalid transforms.
//! - **Missing resources**: files that could not be found or decoded.
//!
//! None of these are retried. They propagate to the frame loop, which logs
//! them and shuts down.

use std::path::PathBuf;

use thiserror::Error;

use crate::gl::ShaderStage;

/// Errors raised by GPU resource wrappers, the scene graph and the frame loop
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("native call `{call}` failed with GL error 0x{code:04X}")]
    NativeCall { call: &'static str, code: u32 },

    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    #[error("{stage} shader `{file}` failed to compile:\n{log}")]
    ShaderCompile {
        stage: ShaderStage,
        file: String,
        log: String,
    },

    #[error("program ({vertex}, {fragment}) failed to link:\n{log}")]
    ProgramLink {
        vertex: String,
        fragment: String,
        log: String,
    },

    #[error("uniform `{uniform}` not found in program ({vertex}, {fragment})")]
    UnknownUniform {
        uniform: String,
        vertex: String,
        fragment: String,
    },

    #[error("shader program lacks required uniforms: {}", .missing.join(", "))]
    MissingRequiredUniforms { missing: Vec<String> },

    #[error(
        "attribute {semantic} spans elements {offset}..{} but the vertex stride is {stride}",
        .offset + .element_count
    )]
    InvalidAttributeLayout {
        semantic: String,
        offset: usize,
        element_count: usize,
        stride: usize,
    },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    #[error("resource not found: {}", .path.display())]
    ResourceNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("model load error: {0}")]
    ModelLoad(#[from] tobj::LoadError),

    #[error("window or context error: {0}")]
    Context(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    /// Wraps any displayable window-system or context error
    pub fn context(err: impl std::fmt::Display) -> Self {
        Self::Context(err.to_string())
    }

    /// Maps an I/O error on `path` to [`RenderError::ResourceNotFound`] when
    /// the file is missing, and to [`RenderError::Io`] otherwise
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ResourceNotFound { path: path.into() }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_call_message_names_call_and_code() {
        let err = RenderError::NativeCall {
            call: "glBufferData",
            code: 0x0502,
        };
        let message = err.to_string();
        assert!(message.contains("glBufferData"));
        assert!(message.contains("0x0502"));
    }

    #[test]
    fn test_missing_uniforms_are_listed() {
        let err = RenderError::MissingRequiredUniforms {
            missing: vec!["uModel".to_string(), "uView".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "shader program lacks required uniforms: uModel, uView"
        );
    }

    #[test]
    fn test_shader_compile_message_carries_log() {
        let err = RenderError::ShaderCompile {
            stage: ShaderStage::Fragment,
            file: "lit.frag".to_string(),
            log: "0:12: syntax error".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("fragment shader `lit.frag`"));
        assert!(message.ends_with("0:12: syntax error"));
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        match RenderError::from_io(io, "assets/missing.png") {
            RenderError::ResourceNotFound { path } => {
                assert_eq!(path, PathBuf::from("assets/missing.png"))
            }
            other => panic!("unexpected error: {other}"),
        }

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            RenderError::from_io(io, "x"),
            RenderError::Io(_)
        ));
    }

    #[test]
    fn test_attribute_layout_message_shows_extent() {
        let err = RenderError::InvalidAttributeLayout {
            semantic: "normal".to_string(),
            offset: 6,
            element_count: 3,
            stride: 8,
        };
        assert!(err.to_string().contains("6..9"));
    }
}
