use crate::error::{DeclutterError, Result};
use crate::models::{ItemDraft, ItemPatch};

/// Minimum password length the gateway accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

fn invalid(message: impl Into<String>) -> DeclutterError {
    DeclutterError::Validation(message.into())
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(invalid("Email cannot be empty"));
        }

        if email.len() > 254 {
            return Err(invalid("Email too long (max 254 characters)"));
        }

        let Some((local_part, domain_part)) = email.split_once('@') else {
            return Err(invalid("Email must contain @ symbol"));
        };

        if domain_part.contains('@') {
            return Err(invalid("Email must have exactly one @ symbol"));
        }

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(invalid("Email local part invalid"));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(invalid("Email domain invalid"));
        }

        Ok(())
    }

    /// Validate a password before it is sent to the gateway
    pub fn validate_password(password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(invalid(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        Ok(())
    }

    /// Validate item name
    pub fn validate_item_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(invalid("Item name cannot be empty"));
        }

        Ok(())
    }

    /// Validate item category; any text is allowed, suggestions are not enforced
    pub fn validate_category(category: &str) -> Result<()> {
        if category.trim().is_empty() {
            return Err(invalid("Category cannot be empty"));
        }

        Ok(())
    }

    /// Validate every user-supplied field of a new item
    pub fn validate_item_draft(draft: &ItemDraft) -> Result<()> {
        Self::validate_item_name(&draft.name)?;
        Self::validate_category(&draft.category)
    }

    /// Validate the fields a patch sets. An empty patch only refreshes `updated_at`.
    pub fn validate_item_patch(patch: &ItemPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            Self::validate_item_name(name)?;
        }
        if let Some(category) = &patch.category {
            Self::validate_category(category)?;
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length() {
        assert!(InputValidator::validate_password("12345").is_err());
        assert!(InputValidator::validate_password("123456").is_ok());
    }

    #[test]
    fn test_patch_fields_checked() {
        let patch = ItemPatch {
            name: Some("   ".to_string()),
            ..ItemPatch::default()
        };
        assert!(InputValidator::validate_item_patch(&patch).is_err());
        assert!(InputValidator::validate_item_patch(&ItemPatch::default()).is_ok());
    }
}
