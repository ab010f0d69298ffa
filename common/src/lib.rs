use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

pub mod lead;
pub mod utils;

pub use lead::{InvalidChoice, LeadChanges, LeadFields, LeadPriority, LeadStatus};

/// A lead as stored and as returned by the API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow, ToSchema)]
pub struct LeadDto {
    pub id: i64,
    pub company: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub confidence: Option<i32>,
    pub estimated_value: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: LeadStatus,
    #[sqlx(try_from = "String")]
    pub priority: LeadPriority,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl LeadDto {
    pub fn fields(&self) -> LeadFields {
        LeadFields {
            company: self.company.clone(),
            contact_person: self.contact_person.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            website: self.website.clone(),
            confidence: self.confidence,
            estimated_value: self.estimated_value,
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Request body for creating or updating a lead.
///
/// Fields are kept as raw JSON so that a value of the wrong type is reported
/// against its field by [`LeadInput::to_changes`] instead of failing the whole
/// body. Which fields are required depends on the operation. Read-only
/// columns (`id`, `created_by`, `created_at`, `modified_at`) are not part of
/// the body and are ignored if sent.
///
/// For every field `None` means the key was absent and `Some(Value::Null)`
/// an explicit `null`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, ToSchema)]
pub struct LeadInput {
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub company: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub contact_person: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub confidence: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub estimated_value: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<LeadStatus>)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<LeadPriority>)]
    pub priority: Option<Value>,
}

// Keeps an explicit `null` as `Some(Value::Null)`; an absent key stays `None`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Validate, ToSchema)]
pub struct RegisterPayload {
    #[serde(default)]
    #[validate(custom(function = "utils::validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "utils::validate_email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "utils::validate_password"))]
    pub password: String,
    /// Confirmation; when sent it must match `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password2: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "utils::validate_person_name"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(custom(function = "utils::validate_person_name"))]
    pub last_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct RefreshPayload {
    pub refresh: String,
}

/// Public view of a user account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, FromRow, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct RegisterResponse {
    pub refresh: String,
    pub access: String,
    pub user: UserProfile,
}
