// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
    pub setting_key: String,
    pub setting_value: String,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingPayload {
    #[validate(length(min = 1, message = "O valor não pode ser vazio."))]
    pub value: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingResponse {
    pub success: bool,
    pub value: String,
}
