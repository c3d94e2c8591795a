//! Domain error types.

/// Top-level error type for ticksim.
#[derive(Debug, thiserror::Error)]
pub enum TicksimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{name} required")]
    MissingCollaborator { name: &'static str },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("execution error: {reason}")]
    Execution { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TicksimError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            TicksimError::ConfigParse { .. }
                | TicksimError::ConfigMissing { .. }
                | TicksimError::ConfigInvalid { .. }
                | TicksimError::MissingCollaborator { .. }
                | TicksimError::UnknownStrategy { .. }
        )
    }
}

impl From<&TicksimError> for std::process::ExitCode {
    fn from(err: &TicksimError) -> Self {
        let code: u8 = match err {
            TicksimError::Io(_) => 1,
            TicksimError::ConfigParse { .. }
            | TicksimError::ConfigMissing { .. }
            | TicksimError::ConfigInvalid { .. }
            | TicksimError::MissingCollaborator { .. }
            | TicksimError::UnknownStrategy { .. } => 2,
            TicksimError::Execution { .. } => 3,
            TicksimError::Data { .. } | TicksimError::Json(_) | TicksimError::Csv(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_collaborator_message() {
        let err = TicksimError::MissingCollaborator { name: "strategy" };
        assert_eq!(err.to_string(), "strategy required");
        assert!(err.is_config());
    }

    #[test]
    fn execution_is_not_config() {
        let err = TicksimError::Execution {
            reason: "rejected".into(),
        };
        assert!(!err.is_config());
        assert_eq!(err.to_string(), "execution error: rejected");
    }

    #[test]
    fn config_invalid_message() {
        let err = TicksimError::ConfigInvalid {
            section: "risk".into(),
            key: "tick_size".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [risk] tick_size: must be positive"
        );
    }
}
