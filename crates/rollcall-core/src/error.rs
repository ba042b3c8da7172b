use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("not initialized: run 'rollcall init'")]
    NotInitialized,

    #[error("student not found: {0}")]
    StudentNotFound(i64),

    #[error("roll not found: {0}")]
    RollNotFound(i64),

    #[error("student roll state not found: {0}")]
    RollStateNotFound(i64),

    #[error("group not found: {0}")]
    GroupNotFound(i64),

    #[error("group student not found: {0}")]
    GroupStudentNotFound(i64),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid comparator '{0}': expected '<' or '>'")]
    InvalidComparator(String),

    #[error("invalid roll state '{0}'")]
    InvalidRollState(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl RollcallError {
    /// Short human-facing message carried in the response envelope.
    pub fn user_message(&self) -> &'static str {
        match self {
            RollcallError::StudentNotFound(_) => "Student not found",
            RollcallError::RollNotFound(_) => "Roll not found",
            RollcallError::RollStateNotFound(_) => "Student roll state not found",
            RollcallError::GroupNotFound(_) => "Group not found",
            RollcallError::GroupStudentNotFound(_) => "Group student not found",
            _ => "error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RollcallError::StudentNotFound(_)
                | RollcallError::RollNotFound(_)
                | RollcallError::RollStateNotFound(_)
                | RollcallError::GroupNotFound(_)
                | RollcallError::GroupStudentNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_carry_entity_message() {
        assert_eq!(RollcallError::GroupNotFound(4).user_message(), "Group not found");
        assert_eq!(RollcallError::StudentNotFound(1).user_message(), "Student not found");
        assert!(RollcallError::RollNotFound(9).is_not_found());
    }

    #[test]
    fn other_variants_use_generic_message() {
        let err = RollcallError::InvalidComparator("=".into());
        assert_eq!(err.user_message(), "error");
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "invalid comparator '=': expected '<' or '>'"
        );
    }
}
