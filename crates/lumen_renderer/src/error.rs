//! Error types for rendering and scene loading.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while starting or collecting a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Camera used before initialize() was called")]
    CameraNotInitialized,

    #[error("Failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("No row arrived within {timeout:?} ({completed}/{total} rows done); render is still running")]
    Stalled {
        timeout: Duration,
        completed: u32,
        total: u32,
    },

    #[error("Render workers stopped with {missing} of {total} rows never delivered")]
    RowsLost { missing: u32, total: u32 },

    #[error("Render was cancelled after {completed}/{total} rows")]
    Cancelled { completed: u32, total: u32 },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading or building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {what}: {reason}")]
    Invalid { what: String, reason: String },
}

impl SceneError {
    pub(crate) fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        SceneError::Invalid {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
