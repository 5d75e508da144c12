use crate::{AttributeUsage, DataType, Stage};
use thiserror::Error;

/// Errors reported by the engine and the precompute pipeline.
#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("failed to build shader `{shader}': {log}")]
    ShaderBuild { shader: &'static str, log: String },

    #[error("framebuffer incomplete (status {status:#06x})")]
    IncompleteFramebuffer { status: u32 },

    #[error("failed to allocate {resource}")]
    Allocation { resource: &'static str },

    #[error("failed to upload {resource} data")]
    Upload { resource: &'static str },

    #[error("invalid vertex layout: attribute {index} ({usage:?}) has type {kind:?}")]
    InvalidVertexLayout {
        index: usize,
        usage: AttributeUsage,
        kind: DataType,
    },

    #[error("failed to load radiance image `{url}': {reason}")]
    ImageLoad { url: String, reason: String },

    #[error("failed to decode radiance image: {0}")]
    ImageDecode(String),

    #[error("a radiance image was already assigned to this pipeline")]
    ImageAlreadyAssigned,

    #[error("extension `{0}' missing")]
    MissingExtension(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attributes this error to a pipeline stage.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(error: image::ImageError) -> Self {
        Self::ImageDecode(error.to_string())
    }
}
