pub type CppnResult<T> = Result<T, CppnError>;

#[derive(thiserror::Error, Debug)]
pub enum CppnError {
    #[error("empty model: {0}")]
    EmptyModel(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("feature dimension mismatch: built {built} features, first layer expects {expected}")]
    FeatureDimensionMismatch { built: usize, expected: usize },

    #[error("unknown world '{0}'")]
    UnknownWorld(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("unsupported document version {found} (supported: {supported})")]
    UnsupportedVersion { found: i128, supported: u32 },

    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    #[error("encoder failure: {0}")]
    EncoderFailure(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("world '{world}' clip {clip}{}: {source}", frame.map(|f| format!(" frame {f}")).unwrap_or_default())]
    Clip {
        world: String,
        clip: u32,
        frame: Option<u64>,
        #[source]
        source: Box<CppnError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CppnError {
    pub fn empty_model(msg: impl Into<String>) -> Self {
        Self::EmptyModel(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::InvalidCheckpoint(msg.into())
    }

    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::EncoderFailure(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Attach world/clip/frame context. Already-wrapped errors keep their original context.
    pub fn in_clip(self, world: &str, clip: u32, frame: Option<u64>) -> Self {
        match self {
            e @ Self::Clip { .. } => e,
            e => Self::Clip {
                world: world.to_owned(),
                clip,
                frame,
                source: Box::new(e),
            },
        }
    }

    /// The underlying error with any [`CppnError::Clip`] context stripped.
    pub fn root_cause(&self) -> &CppnError {
        match self {
            Self::Clip { source, .. } => source.root_cause(),
            e => e,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
