use layers::GeometryKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The 2D view has no projection or resolution yet.
    ViewNotReady,
    UnsupportedGeometry { kind: GeometryKind },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::ViewNotReady => write!(f, "view not ready"),
            ConvertError::UnsupportedGeometry { kind } => {
                write!(f, "unsupported geometry kind: {kind}")
            }
        }
    }
}

impl std::error::Error for ConvertError {}
