// src/models/settings.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the single-row 'settings' table (id is always 1).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Settings {
    pub id: i64,
    pub site_name: String,
    pub allow_signup: bool,
    pub maintenance_mode: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for updating settings. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 100))]
    pub site_name: Option<String>,
    pub allow_signup: Option<bool>,
    pub maintenance_mode: Option<bool>,
}
