use crate::entities::{ConsultantType, consultant_entity as consultants};
use crate::models::common::deserialize_present;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsultantOwner {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsultantResponse {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub consultant_type: ConsultantType,
    pub domain: String,
    pub bio: Option<String>,
    pub languages: Option<String>,
    pub hourly_price: f64,
    pub profile_pic: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ConsultantOwner>,
}

impl ConsultantResponse {
    pub fn with_owner(mut self, email: impl Into<String>) -> Self {
        self.user = Some(ConsultantOwner {
            email: email.into(),
        });
        self
    }
}

impl From<consultants::Model> for ConsultantResponse {
    fn from(m: consultants::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            consultant_type: m.consultant_type,
            domain: m.domain,
            bio: m.bio,
            languages: m.languages,
            hourly_price: m.hourly_price,
            profile_pic: m.profile_pic,
            is_verified: m.is_verified,
            rating: m.rating,
            total_reviews: m.total_reviews,
            created_at: m.created_at,
            updated_at: m.updated_at,
            user: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterConsultantRequest {
    #[serde(rename = "type")]
    #[schema(example = "Individual")]
    pub consultant_type: Option<String>,
    #[schema(example = "Tax Law")]
    pub domain: Option<String>,
    pub bio: Option<String>,
    #[schema(example = "English, Hindi")]
    pub languages: Option<String>,
    /// Number or numeric string.
    #[schema(value_type = Option<f64>, example = 1500.0)]
    pub hourly_price: Option<serde_json::Value>,
}

/// Partial update. `bio` and `languages` keep the stored value only when the
/// key is absent; an explicit `null` or `""` overwrites it.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateConsultantRequest {
    #[serde(rename = "type")]
    pub consultant_type: Option<String>,
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub languages: Option<Option<String>>,
    #[schema(value_type = Option<f64>)]
    pub hourly_price: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DirectoryQuery {
    /// Case-insensitive substring match on the consultant's domain.
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilePicResponse {
    pub profile_pic: String,
    pub consultant: ConsultantResponse,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct VerifyConsultantRequest {
    pub verified: Option<bool>,
}

/// Multipart form accepted by the profile picture upload.
#[derive(ToSchema)]
pub struct ProfilePicUpload {
    /// Image file, at most 5 MB.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
