use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{AccidentTypeDto, RuleDto};
use crate::features::accidents::models::{Accident, AccidentStatus};
use crate::features::files::dtos::FileUpload;

/// Fields of the accident multipart form, collected before validation
#[derive(Debug, Clone, Validate)]
pub struct AccidentFormDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,

    #[validate(length(min = 1, max = 512, message = "Address must be 1-512 characters"))]
    pub address: String,

    #[validate(range(min = 1, message = "Type id must be positive"))]
    pub type_id: i32,

    /// Raw rule ids; parsed and resolved by the service
    pub rule_ids: Vec<String>,

    pub image: FileUpload,
}

impl AccidentFormDto {
    /// Unsaved accident plus the rule ids and photo to attach
    pub fn into_draft(self) -> (Accident, Vec<String>, FileUpload) {
        let accident = Accident::draft(self.name, self.text, self.address, self.type_id);
        (accident, self.rule_ids, self.image)
    }

    /// Overwrite the editable fields of an existing accident.
    ///
    /// Status, reporter and photo binding are left as loaded.
    pub fn apply_to(self, mut accident: Accident) -> (Accident, Vec<String>, FileUpload) {
        accident.name = self.name;
        accident.text = self.text;
        accident.address = self.address;
        accident.accident_type.id = self.type_id;
        (accident, self.rule_ids, self.image)
    }
}

/// Multipart form schema for creating or replacing an accident
///
/// Documentation only. The handlers read axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AccidentUploadDto {
    #[schema(example = "Collision at the crossing")]
    pub name: String,
    #[schema(example = "A car hit a cyclist turning right")]
    pub text: String,
    #[schema(example = "Main St 1")]
    pub address: String,
    #[schema(example = 5)]
    pub type_id: i32,
    /// Repeat the field once per rule
    #[schema(example = json!(["7", "9"]))]
    pub rule_ids: Vec<String>,
    /// Photo of the scene (jpeg, png, gif, webp)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccidentResponseDto {
    pub id: i32,
    pub name: String,
    pub text: String,
    pub address: String,
    pub status: AccidentStatus,
    pub accident_type: AccidentTypeDto,
    /// Username of the reporter
    pub reporter: Option<String>,
    /// Cited rules, ascending by id
    pub rules: Vec<RuleDto>,
    pub file_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<Accident> for AccidentResponseDto {
    fn from(a: Accident) -> Self {
        let mut rules: Vec<RuleDto> = a.rules.into_iter().map(RuleDto::from).collect();
        rules.sort_by_key(|r| r.id);

        Self {
            id: a.id,
            name: a.name,
            text: a.text,
            address: a.address,
            status: a.status,
            accident_type: a.accident_type.into(),
            reporter: a.user.map(|u| u.username),
            rules,
            file_id: a.file_id,
            created_at: a.created_at,
        }
    }
}

/// Saved accident and whether its previous photo still needs removing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveAccidentResponseDto {
    pub accident: AccidentResponseDto,
    pub file_cleanup_pending: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccidentResponseDto {
    pub deleted: bool,
    pub file_cleanup_pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccidentStatusDto {
    pub status: AccidentStatus,
}
