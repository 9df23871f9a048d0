//! Dashboard input validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Maximum length of a dashboard name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a dashboard description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Create/replace payload for a dashboard. Saving replaces every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl DashboardInput {
    /// Validate and normalise (trim) the input.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        Ok(self)
    }
}

pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Dashboard name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Dashboard name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Dashboard description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}
