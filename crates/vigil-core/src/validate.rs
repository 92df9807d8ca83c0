//! Input validation shared by every `New*` and `*Update` payload.
//!
//! Length limits mirror the column widths of the relational schema.

use crate::error::CoreError;

pub trait Validate {
    fn validate(&self) -> Result<(), CoreError>;
}

/// A required text field: non-blank and at most `max` characters.
pub fn required(field: &'static str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    max_len(field, value, max)
}

pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn optional_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

pub fn int_range(
    field: &'static str,
    value: Option<i32>,
    min: i32,
    max: i32,
) -> Result<(), CoreError> {
    match value {
        Some(v) if v < min || v > max => Err(CoreError::validation(
            field,
            format!("must be between {min} and {max}"),
        )),
        _ => Ok(()),
    }
}

pub fn float_range(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.is_finite() => Err(CoreError::validation(field, "must be a finite number")),
        Some(v) if v < min || v > max => Err(CoreError::validation(
            field,
            format!("must be between {min} and {max}"),
        )),
        _ => Ok(()),
    }
}

pub fn non_negative(field: &'static str, value: Option<f64>) -> Result<(), CoreError> {
    float_range(field, value, 0.0, f64::MAX)
}

/// Loose structural check; deliverability is not our concern.
pub fn email(field: &'static str, value: &str) -> Result<(), CoreError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::validation(field, "must be an email address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert!(required("mrn", "   ", 50).is_err());
        assert!(required("mrn", "MRN-1", 50).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(max_len("city", "Zürich", 6).is_ok());
        assert!(max_len("city", "Zürichs", 6).is_err());
    }

    #[test]
    fn int_range_is_inclusive() {
        assert!(int_range("heart_rate", Some(0), 0, 300).is_ok());
        assert!(int_range("heart_rate", Some(300), 0, 300).is_ok());
        assert!(int_range("heart_rate", Some(301), 0, 300).is_err());
        assert!(int_range("heart_rate", None, 0, 300).is_ok());
    }

    #[test]
    fn float_range_rejects_nan() {
        let err = float_range("risk_score", Some(f64::NAN), 0.0, 100.0).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "nurse@example.org").is_ok());
        assert!(email("email", "nurse@example").is_err());
        assert!(email("email", "@example.org").is_err());
        assert!(email("email", "nurse @example.org").is_err());
    }
}
