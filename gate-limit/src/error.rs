/// Errors produced when building a limiter from raw float configuration.
///
/// The `u32` constructors cannot fail; zero values are legal and yield the
/// documented degenerate behavior (always-deny for zero capacity, a frozen
/// bucket for zero rate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Capacity was negative, NaN, or infinite.
    #[error("capacity must be a non-negative finite number, got {0}")]
    InvalidCapacity(f64),

    /// Rate was negative, NaN, or infinite.
    #[error("rate must be a non-negative finite number, got {0}")]
    InvalidRate(f64),
}

pub(crate) fn validate_rates(capacity: f64, rate: f64) -> Result<(), ConfigError> {
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(ConfigError::InvalidCapacity(capacity));
    }

    if !rate.is_finite() || rate < 0.0 {
        return Err(ConfigError::InvalidRate(rate));
    }

    Ok(())
}
