use once_cell::sync::Lazy;
use serde::Deserialize;
use validator::{Validate, ValidateEmail, ValidationError};

static USERNAME_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[a-zA-Z0-9_]+$").expect("USERNAME_REGEX is a valid regex pattern")
});

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub first_name: String,

    #[validate(length(min = 1, max = 128))]
    pub last_name: String,

    #[validate(
        length(min = 3, max = 50),
        regex(
            path = *USERNAME_REGEX,
            message = "Username must be alphanumeric with underscores"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_login_identity"))]
pub struct LoginRequest {
    pub username: Option<String>,
    /// A blank email falls back to `username`.
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn validate_login_identity(request: &LoginRequest) -> Result<(), ValidationError> {
    let has_username = request.username.as_deref().is_some_and(|u| !u.trim().is_empty());
    let email = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if email.is_some_and(|e| !e.validate_email()) {
        return Err(ValidationError::new("email").with_message("Invalid email format".into()));
    }
    if has_username || email.is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("missing_identity")
            .with_message("Email or username and password are required".into()))
    }
}

/// Body of `/refresh-token` and `/logout`; the refresh JWT itself travels
/// in the `Authorization` header.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TokenIdRequest {
    #[validate(length(min = 1, max = 64, message = "Refresh token ID is required"))]
    pub token_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create_request() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            username: "jane_smith".to_string(),
            email: "jane@example.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_create_user_request_valid() {
        assert!(valid_create_request().validate().is_ok());
    }

    #[test]
    fn test_create_user_request_rejects_bad_username() {
        let mut request = valid_create_request();
        request.username = "jane smith!".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_user_request_rejects_short_password() {
        let mut request = valid_create_request();
        request.password = "short".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_requires_username_or_email() {
        let request = LoginRequest {
            username: None,
            email: Some("  ".to_string()),
            password: "secret".to_string(),
        };
        assert!(request.validate().is_err());

        let request = LoginRequest {
            username: Some("jane".to_string()),
            email: None,
            password: "secret".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_blank_email_falls_back_to_username() {
        let request = LoginRequest {
            username: Some("jane".to_string()),
            email: Some(String::new()),
            password: "secret".to_string(),
        };
        assert!(request.validate().is_ok());

        let request = LoginRequest {
            username: Some("jane".to_string()),
            email: Some("not-an-email".to_string()),
            password: "secret".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_token_id_request_rejects_empty() {
        let request = TokenIdRequest {
            token_id: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
