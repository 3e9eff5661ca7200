//! Settings validation

use crate::schema::RawSettings;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("product.{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("product.platform_dist '{0}' must not contain '/' or whitespace")]
    InvalidPlatformDist(String),
}

/// Validate raw settings, collecting every problem
pub fn validate_settings(settings: &RawSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let product = &settings.product;

    for (field, value) in [
        ("app_name", &product.app_name),
        ("updater_name", &product.updater_name),
        ("banner", &product.banner),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyField { field });
        }
    }

    if let Some(bundle) = &product.bundle_name {
        if bundle.trim().is_empty() {
            errors.push(ValidationError::EmptyField {
                field: "bundle_name",
            });
        }
    }

    // The dist is a URL path segment
    if let Some(dist) = &product.platform_dist {
        if dist.trim().is_empty() {
            errors.push(ValidationError::EmptyField {
                field: "platform_dist",
            });
        } else if dist.contains('/') || dist.chars().any(char::is_whitespace) {
            errors.push(ValidationError::InvalidPlatformDist(dist.clone()));
        }
    }

    errors
}
