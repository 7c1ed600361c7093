use serde::{Deserialize, Serialize};
use validator::Validate;

/// Book category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Create or update payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
