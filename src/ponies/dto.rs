use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::ponies::repo::{NewPony, Pony};

/// Creation body. Fields deserialize as options so a missing field reports
/// as a Validation error rather than a body-decoding failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePonyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub talent: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreatePonyRequest {
    /// Every field is required and must be non-blank.
    pub fn into_new_pony(self) -> Result<NewPony, ApiError> {
        fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ApiError::Validation(format!("`{field}` is required"))),
            }
        }

        Ok(NewPony {
            name: required(self.name, "name")?,
            element: required(self.element, "element")?,
            personality: required(self.personality, "personality")?,
            talent: required(self.talent, "talent")?,
            summary: required(self.summary, "summary")?,
            image_url: required(self.image_url, "imageUrl")?,
        })
    }
}

/// Partial update body; absent fields leave the record untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePonyRequest {
    pub name: Option<String>,
    pub element: Option<String>,
    pub personality: Option<String>,
    pub talent: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub is_favorite: Option<bool>,
}

impl UpdatePonyRequest {
    /// Merge the fields present in the request over an existing record.
    pub fn apply_to(self, pony: &mut Pony) {
        if let Some(v) = self.name {
            pony.name = v;
        }
        if let Some(v) = self.element {
            pony.element = v;
        }
        if let Some(v) = self.personality {
            pony.personality = v;
        }
        if let Some(v) = self.talent {
            pony.talent = v;
        }
        if let Some(v) = self.summary {
            pony.summary = v;
        }
        if let Some(v) = self.image_url {
            pony.image_url = v;
        }
        if let Some(v) = self.is_favorite {
            pony.is_favorite = v;
        }
    }
}

/// List projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PonySummary {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub is_favorite: bool,
}

impl From<Pony> for PonySummary {
    fn from(pony: Pony) -> Self {
        Self {
            id: pony.id,
            name: pony.name,
            image_url: pony.image_url,
            is_favorite: pony.is_favorite,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}
