//! Error types for loading and checking graphs.

use derive_more::{Display, From};

use crate::parser::ParseError;
use crate::validation::ValidationResult;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Display, From)]
pub enum IrError {
    #[display("{_0}")]
    Parse(ParseError),

    #[display("I/O error: {_0}")]
    Io(std::io::Error),

    #[display("graph @{graph} is inconsistent:\n{report}")]
    #[from(skip)]
    Invalid { graph: String, report: String },
}

impl IrError {
    pub fn invalid(graph: &str, result: &ValidationResult) -> Self {
        IrError::Invalid {
            graph: graph.to_owned(),
            report: result.to_string(),
        }
    }
}

impl std::error::Error for IrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IrError::Parse(e) => Some(e),
            IrError::Io(e) => Some(e),
            IrError::Invalid { .. } => None,
        }
    }
}
