use thiserror::Error;

/// Failure taxonomy for planning and execution.
///
/// The first three variants are recoverable: the executor records them on the
/// [`Report`](crate::Report) and moves on to the next requirement. Parser and
/// project failures are fatal and abort the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Function declaration not found")]
    DeclarationNotFound { target: String },

    #[error("More than one function declaration matched")]
    AmbiguousDeclaration { target: String, matches: usize },

    #[error("Function not found")]
    CallNotFound { target: String, enclosing: String },

    #[error("parser error: {0}")]
    Parser(String),

    #[error("project I/O error: {0}")]
    ProjectIo(String),

    #[error("planned requirement budget exceeded while expanding `{requirement}`")]
    PlannerCycle { requirement: String },
}

impl Error {
    /// Whether the executor may record this failure and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DeclarationNotFound { .. }
                | Error::AmbiguousDeclaration { .. }
                | Error::CallNotFound { .. }
                | Error::PlannerCycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_report_messages() {
        let err = Error::DeclarationNotFound { target: "priv".to_string() };
        assert_eq!(err.to_string(), "Function declaration not found");
        let err = Error::AmbiguousDeclaration { target: "priv".to_string(), matches: 2 };
        assert_eq!(err.to_string(), "More than one function declaration matched");
        let err = Error::CallNotFound { target: "priv".to_string(), enclosing: "caller".to_string() };
        assert_eq!(err.to_string(), "Function not found");
    }

    #[test]
    fn fatal_errors_are_not_recoverable() {
        assert!(!Error::Parser("bad tree".to_string()).is_recoverable());
        assert!(!Error::ProjectIo("missing file".to_string()).is_recoverable());
        assert!(Error::PlannerCycle { requirement: "AddParameter".to_string() }.is_recoverable());
    }
}
