//! Registration and login form model.
//!
//! Covers the client-side checks and the JSON shapes exchanged with the
//! backend. The transport itself belongs to the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shortest password the registration form accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Passwords must be at least 6 characters long")]
    PasswordTooShort,

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

/// Which request a server error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Register,
    Login,
}

impl FormAction {
    /// Message shown when the server gives no usable reason.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            FormAction::Register => "Registration fail. Please try again later.",
            FormAction::Login => "Login failed. Please check your credentials",
        }
    }
}

/// Fields of the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub full_name: String,
    pub contact_number: String,
    pub email_address: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Client-side checks run before anything is sent.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FormError::PasswordTooShort);
        }
        Ok(())
    }

    /// Body of the register request, with the cropped avatar if there is one.
    pub fn into_payload(self, user_image: Option<String>) -> RegistrationPayload {
        RegistrationPayload {
            full_name: self.full_name,
            contact_number: self.contact_number,
            email_address: self.email_address,
            password: self.password,
            user_image,
        }
    }

    /// Login issued right after a successful registration.
    pub fn login_request(&self) -> LoginRequest {
        LoginRequest {
            email_address: self.email_address.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    pub full_name: String,
    pub contact_number: String,
    pub email_address: String,
    pub password: String,
    /// Cropped avatar as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email_address: String,
    pub password: String,
}

/// Token response of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrator: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl AuthResponse {
    pub fn from_json(body: &str) -> Result<Self, FormError> {
        serde_json::from_str(body).map_err(|e| FormError::InvalidResponse(e.to_string()))
    }

    /// Profile of whoever logged in; administrators take precedence.
    pub fn user_data(&self) -> Option<&Value> {
        self.administrator
            .as_ref()
            .filter(|v| !v.is_null())
            .or(self.user.as_ref().filter(|v| !v.is_null()))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Message to show for a failed request: the server's `message` field when
/// present, otherwise the action's fallback.
pub fn server_error_message(body: Option<&str>, action: FormAction) -> String {
    body.and_then(|b| serde_json::from_str::<ErrorBody>(b).ok())
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| action.fallback_message().to_string())
}
