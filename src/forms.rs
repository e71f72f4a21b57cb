//! Form payloads and their validation.
//!
//! Every field is `#[serde(default)]` so a missing field reaches validation and
//! is reported inline instead of failing extraction. Unknown fields (an
//! `author` smuggled into the POST, say) are ignored by deserialization.

use serde::{Deserialize, Serialize};

use crate::database::models::{TestimonialChanges, LOCATION_MAX_LEN};

pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialForm {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub location: String,
}

/// Inline messages for the testimonial form
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TestimonialErrors {
    pub body: Option<String>,
    pub location: Option<String>,
}

impl TestimonialForm {
    /// Trimmed fields ready to persist, or the inline errors to show
    pub fn validate(&self) -> Result<TestimonialChanges, TestimonialErrors> {
        let body = self.body.trim();
        let location = self.location.trim();
        let mut errors = TestimonialErrors::default();

        if body.is_empty() {
            errors.body = Some(REQUIRED.to_string());
        }
        if location.chars().count() > LOCATION_MAX_LEN {
            errors.location = Some(format!(
                "Ensure this value has at most {} characters (it has {}).",
                LOCATION_MAX_LEN,
                location.chars().count()
            ));
        }

        if errors != TestimonialErrors::default() {
            return Err(errors);
        }

        Ok(TestimonialChanges {
            body: body.to_string(),
            location: (!location.is_empty()).then(|| location.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegisterErrors {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
/// Matches `accounts.first_name VARCHAR(150)`
pub const FIRST_NAME_MAX_LEN: usize = 150;

/// Letters, digits and @/./+/-/_ only
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len == 0 {
        return Err(REQUIRED.to_string());
    }
    if len < USERNAME_MIN_LEN {
        return Err(format!("Username must be at least {} characters long.", USERNAME_MIN_LEN));
    }
    if len > USERNAME_MAX_LEN {
        return Err(format!("Username must be at most {} characters long.", USERNAME_MAX_LEN));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may contain only letters, numbers, and @/./+/-/_ characters.".to_string());
    }
    Ok(())
}

pub fn validate_first_name(first_name: &str) -> Result<(), String> {
    let len = first_name.chars().count();
    if len > FIRST_NAME_MAX_LEN {
        return Err(format!(
            "Ensure this value has at most {} characters (it has {}).",
            FIRST_NAME_MAX_LEN, len
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(format!("Password must be at least {} characters long.", PASSWORD_MIN_LEN));
    }
    Ok(())
}

impl RegisterForm {
    /// Field checks that need no store access. Uniqueness is checked by the handler.
    pub fn validate(&self) -> Result<(), RegisterErrors> {
        let mut errors = RegisterErrors {
            username: validate_username(self.username.trim()).err(),
            first_name: validate_first_name(self.first_name.trim()).err(),
            password: validate_password(&self.password).err(),
            password_confirm: None,
        };
        if errors.password.is_none() && self.password != self.password_confirm {
            errors.password_confirm = Some("The two password fields didn't match.".to_string());
        }

        if errors == RegisterErrors::default() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
