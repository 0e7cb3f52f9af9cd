// src/models/messaging.rs

use serde::{Deserialize, Serialize};

// Canal de saída das mensagens transacionais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_channel", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageChannel {
    Email,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Failed,
}

// Registro de auditoria de cada tentativa de envio.
#[derive(Debug, Clone)]
pub struct MessageLogEntry {
    pub recipient: String,
    pub channel: MessageChannel,
    pub template_name: String,
    pub status: MessageStatus,
    pub context: String,
    pub reference_id: Option<String>,
    pub error_message: Option<String>,
}
