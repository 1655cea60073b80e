use convert::ConvertError;
use foundation::LayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Convert(ConvertError),
    UnknownLayer(LayerId),
    /// Events were processed before the first `synchronize`.
    NotSynchronized,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Convert(err) => write!(f, "conversion failed: {err}"),
            SyncError::UnknownLayer(id) => write!(f, "unknown layer {id}"),
            SyncError::NotSynchronized => write!(f, "synchronizer has not run yet"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Convert(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConvertError> for SyncError {
    fn from(err: ConvertError) -> Self {
        SyncError::Convert(err)
    }
}
