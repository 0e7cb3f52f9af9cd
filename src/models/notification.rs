// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Product,
    Alert,
    System,
    Posm,
    Order,
    Scheme,
    Warranty,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NotificationType,
    pub link: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_read: bool,
    pub is_cleared: bool,
    pub created_at: DateTime<Utc>,
}

// Entrada interna do serviço de notificações.
#[derive(Debug, Clone)]
pub struct NotifyInput {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub link: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NotifyInput {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            link: None,
            metadata: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// POST /api/notifications/broadcast (admin).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,

    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub message: String,

    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,

    pub link: Option<String>,

    /// Destinatários explícitos; quando ausentes, o alvo é um papel.
    pub target_users: Option<Vec<Uuid>>,

    /// Papel alvo quando não há lista explícita (default: vendor).
    pub target_role: Option<Role>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub videos: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    #[serde(default)]
    pub include_cleared: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub count: i64,
}
