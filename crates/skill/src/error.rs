//! Skill scoring error types.

/// Errors that can occur while scoring forecasts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SkillError {
    /// Two arrays that must line up do not.
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    Shape {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// An observation window falls outside the anomaly series.
    #[error(
        "observation window for start {start} at lag {lag} needs rows up to {end}, series has {available}"
    )]
    Alignment {
        start: usize,
        lag: usize,
        end: usize,
        available: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The reference distribution could not be built.
    #[error("distribution error: {reason}")]
    Distribution { reason: String },

    /// JSON serialization failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_display() {
        let err = SkillError::Shape {
            context: "forecast vs observations",
            expected: 48,
            got: 36,
        };
        let msg = err.to_string();
        assert!(msg.contains("forecast vs observations"));
        assert!(msg.contains("expected 48"));
        assert!(msg.contains("got 36"));
    }

    #[test]
    fn test_alignment_display() {
        let err = SkillError::Alignment {
            start: 12,
            lag: 36,
            end: 96,
            available: 90,
        };
        let msg = err.to_string();
        assert!(msg.contains("start 12"));
        assert!(msg.contains("lag 36"));
        assert!(msg.contains("series has 90"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = SkillError::InvalidConfig {
            field: "sigma",
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration for sigma: must be positive"
        );
    }

    #[test]
    fn test_serialization_display() {
        let err = SkillError::Serialization {
            reason: "invalid JSON".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("serialization error"));
        assert!(msg.contains("invalid JSON"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<SkillError>();
    }
}
