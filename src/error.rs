//! Errors produced while turning a markdown document into themed HTML.
//!
//! Every variant is terminal for the document being rendered: the pipeline
//! never retries and never emits partial output.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MdocError {
    /// The front matter block could not be decoded.
    #[error("failed to parse front matter of {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A template failed to compile, or referenced a value that doesn't exist.
    #[error("template error in {name}: {message}")]
    Template { name: String, message: String },

    /// Markdown could not be converted to HTML.
    #[error("failed to convert markdown to HTML: {0}")]
    Render(String),

    /// A named theme could not be opened or read.
    #[error("failed to load theme from {}", path.display())]
    ThemeLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input stream could not be read.
    #[error("failed to read document input")]
    Io(#[from] std::io::Error),
}

impl MdocError {
    pub(crate) fn template<N: ToString, M: ToString>(name: N, message: M) -> MdocError {
        MdocError::Template {
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T, E = MdocError> = std::result::Result<T, E>;
