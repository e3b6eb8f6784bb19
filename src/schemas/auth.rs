use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::TeacherAccount;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) password: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) school: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) subject: Option<String>,
    pub(crate) school: Option<String>,
    pub(crate) created_at: String,
}

impl TeacherResponse {
    pub(crate) fn from_account(account: &TeacherAccount) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            subject: account.subject.clone(),
            school: account.school.clone(),
            created_at: format_primitive(account.created_at),
        }
    }
}
