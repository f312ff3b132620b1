use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::accidents::models::{AccidentType, Rule};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccidentTypeDto {
    pub id: i32,
    pub name: String,
}

impl From<AccidentType> for AccidentTypeDto {
    fn from(t: AccidentType) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RuleDto {
    pub id: i32,
    pub name: String,
}

impl From<Rule> for RuleDto {
    fn from(r: Rule) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

/// Request body for adding an accident type or a rule
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCatalogEntryDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    #[schema(example = "Vehicle and cyclist")]
    pub name: String,
}
