use thiserror::Error;

/// Field-level rejection of numeric input. Shown next to the field and never
/// sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required")]
    Required,
    #[error("Must be a number")]
    NotANumber,
    #[error("Must be an integer")]
    NotAnInteger,
    #[error("Must be a positive number")]
    Negative,
    #[error("{message}")]
    TooLarge { max: u64, message: String },
}

/// Validates a non-negative integer count, optionally bounded by `max`.
///
/// `message` replaces the default "Must be smaller than {max}" text. A zero
/// bound means unbounded.
pub fn validate_count(
    raw: &str,
    max: Option<u64>,
    message: Option<&str>,
) -> Result<u64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }
    let bound = max.filter(|max| *max > 0);
    let count = match trimmed.parse::<u64>() {
        Ok(count) => count,
        Err(_) => {
            let value: f64 = trimmed
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or(ValidationError::NotANumber)?;
            if value.fract() != 0.0 {
                return Err(ValidationError::NotAnInteger);
            }
            if value < 0.0 {
                return Err(ValidationError::Negative);
            }
            // u64::MAX rounds up to 2^64, the first value that does not fit.
            if value >= u64::MAX as f64 {
                return Err(too_large(bound.unwrap_or(u64::MAX), message));
            }
            value as u64
        }
    };
    match bound {
        Some(max) if count > max => Err(too_large(max, message)),
        _ => Ok(count),
    }
}

fn too_large(max: u64, message: Option<&str>) -> ValidationError {
    ValidationError::TooLarge {
        max,
        message: message
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("Must be smaller than {max}")),
    }
}
