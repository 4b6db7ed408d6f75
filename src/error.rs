//! Error type shared by every pipeline stage.
//!
//! Each variant corresponds to one failure class of the fit workflow. The
//! binary maps them to process exit codes:
//!
//! - `2`: caller-supplied inputs (parameter block, constants, beam mode)
//! - `3`: measurement data
//! - `4`: physics / fitting
//! - `5`: I/O outside the core (exports, terminal)

/// Errors raised by the HFS pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HfsError {
    /// The parameter declaration block failed to evaluate or is incomplete.
    #[error("Parameter parsing error: {0}")]
    Parameter(String),

    /// A caller-supplied numeric field could not be parsed.
    #[error("Invalid numerical input for {field}: {message}")]
    InputValidation { field: String, message: String },

    /// The measurement file is missing, unreadable, or has too few usable rows.
    #[error("File loading failed: {0}")]
    DataFormat(String),

    /// β could not be computed (unphysical voltage/mass combination).
    #[error("Unphysical inputs: {0}")]
    PhysicsDomain(String),

    /// Beam mode outside `co` / `anti`.
    #[error("Invalid beam mode '{0}' (expected 'co' or 'anti')")]
    InvalidMode(String),

    /// The fitting engine failed to converge or raised internally.
    #[error("Fitting failed: {0}")]
    Fit(String),

    /// Export or terminal I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl HfsError {
    pub fn input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            HfsError::Parameter(_) | HfsError::InputValidation { .. } | HfsError::InvalidMode(_) => 2,
            HfsError::DataFormat(_) => 3,
            HfsError::PhysicsDomain(_) | HfsError::Fit(_) => 4,
            HfsError::Io(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_class() {
        assert_eq!(HfsError::Parameter("x".into()).exit_code(), 2);
        assert_eq!(HfsError::input("m_u", "bad").exit_code(), 2);
        assert_eq!(HfsError::InvalidMode("side".into()).exit_code(), 2);
        assert_eq!(HfsError::DataFormat("x".into()).exit_code(), 3);
        assert_eq!(HfsError::Fit("x".into()).exit_code(), 4);
        assert_eq!(HfsError::Io("x".into()).exit_code(), 5);
    }

    #[test]
    fn messages_name_the_field() {
        let err = HfsError::input("appl_V", "invalid float literal");
        assert_eq!(
            err.to_string(),
            "Invalid numerical input for appl_V: invalid float literal"
        );
    }
}
