//! The Network Description Language: a plain text format for describing the
//! nodes, links and routes of a simulated network.
mod generating;
pub mod parsing;
pub use generating::{core_generator, GenerateError};
pub use parsing::core_parser;

use std::path::Path;
use stopwait_core::{topology::NetworkSpec, RoutingTable};
use thiserror::Error as ThisError;

/// Parses a description and builds the network it declares.
pub fn generate(contents: &str) -> Result<(NetworkSpec, RoutingTable), NdlError> {
    let ndl = core_parser(contents)?;
    Ok(core_generator(&ndl)?)
}

/// Reads a description from a file and builds the network it declares.
pub fn load(file_path: impl AsRef<Path>) -> Result<(NetworkSpec, RoutingTable), NdlError> {
    let file_path = file_path.as_ref();
    let contents = std::fs::read_to_string(file_path).map_err(|source| NdlError::Io {
        path: file_path.display().to_string(),
        source,
    })?;
    generate(&contents).map_err(|e| match e {
        NdlError::Invalid { source, .. } => NdlError::Invalid {
            path: file_path.display().to_string(),
            source,
        },
        e => e,
    })
}

#[derive(Debug, ThisError)]
pub enum NdlError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Errors at {path}: {source}")]
    Invalid { path: String, source: GenerateError },
}

impl From<parsing::ParseError> for NdlError {
    fn from(e: parsing::ParseError) -> Self {
        GenerateError::from(e).into()
    }
}

impl From<GenerateError> for NdlError {
    fn from(source: GenerateError) -> Self {
        Self::Invalid {
            path: "<input>".to_string(),
            source,
        }
    }
}
