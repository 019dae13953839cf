use crate::utils::error::{PackError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PackError::ValidationError {
            message: format!("Field '{}' cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PackError::ValidationError {
            message: format!("Field '{}': path cannot be empty", field_name),
        });
    }

    if path.contains('\0') {
        return Err(PackError::ValidationError {
            message: format!("Field '{}': path contains null bytes", field_name),
        });
    }

    Ok(())
}

/// Dotted Java-style group identifier, e.g. `com.example.demo`.
pub fn validate_group_id(field_name: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.split('.').all(|seg| {
            !seg.is_empty()
                && seg.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(PackError::ValidationError {
            message: format!(
                "Field '{}': '{}' is not a valid dotted identifier",
                field_name, value
            ),
        });
    }
    Ok(())
}
