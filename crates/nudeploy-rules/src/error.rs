use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read mapping rules {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed mapping rules in {document}: {message}")]
    Malformed { document: String, message: String },

    #[error("Mapping rules have not been loaded")]
    NotLoaded,
}

impl RuleError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        RuleError::Malformed {
            document: "<inline>".to_string(),
            message: message.into(),
        }
    }

    /// Attach the document path to a parse error.
    pub(crate) fn in_document(self, path: &std::path::Path) -> Self {
        match self {
            RuleError::Malformed { message, .. } => RuleError::Malformed {
                document: path.display().to_string(),
                message,
            },
            other => other,
        }
    }
}
