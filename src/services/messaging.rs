// src/services/messaging.rs
// Saída transacional do portal: e-mails via SMTP e avisos via WhatsApp.
// Todo envio (sucesso ou falha) deixa rastro na tabela message_logs.

use std::time::Duration;

use crate::{
    common::error::AppError,
    db::MessageLogRepository,
    models::messaging::{MessageChannel, MessageLogEntry, MessageStatus},
};

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
    pub implicit_tls: bool,
}

#[derive(Clone)]
pub struct Mailer {
    // None = modo de desenvolvimento: o conteúdo vai para o log e nada
    // sai pela rede.
    config: Option<SmtpConfig>,
    log_repo: MessageLogRepository,
}

impl Mailer {
    pub fn new(config: Option<SmtpConfig>, log_repo: MessageLogRepository) -> Self {
        Self { config, log_repo }
    }

    /// Envia um e-mail HTML e registra a tentativa. Erros de SMTP viram
    /// `AppError`, mas a auditoria é gravada antes do retorno.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: String,
        template_name: &str,
        reference_id: Option<String>,
    ) -> Result<(), AppError> {
        let outcome = self.deliver(to, subject, html_body).await;

        let entry = MessageLogEntry {
            recipient: to.to_string(),
            channel: MessageChannel::Email,
            template_name: template_name.to_string(),
            status: if outcome.is_ok() { MessageStatus::Sent } else { MessageStatus::Failed },
            context: subject.to_string(),
            reference_id,
            error_message: outcome.as_ref().err().cloned(),
        };
        if let Err(e) = self.log_repo.record(&entry).await {
            tracing::warn!("⚠️ Falha ao gravar message_log de e-mail: {:?}", e);
        }

        match outcome {
            Ok(()) => {
                tracing::info!("📧 E-mail '{}' enviado para {}", template_name, to);
                Ok(())
            }
            Err(err) => Err(AppError::InternalServerError(anyhow::anyhow!(
                "Falha no envio de e-mail: {err}"
            ))),
        }
    }

    async fn deliver(&self, to: &str, subject: &str, html_body: String) -> Result<(), String> {
        let Some(config) = &self.config else {
            tracing::info!("📭 SMTP desabilitado; e-mail para {} ({}) descartado", to, subject);
            return Ok(());
        };

        let message = mail_builder::MessageBuilder::new()
            .from((config.from_name.as_str(), config.from_address.as_str()))
            .to(to)
            .subject(subject)
            .html_body(html_body);

        mail_send::SmtpClientBuilder::new(config.host.clone(), config.port)
            .implicit_tls(config.implicit_tls)
            .credentials((config.username.clone(), config.password.clone()))
            .timeout(Duration::from_secs(15))
            .connect()
            .await
            .map_err(|err| format!("conexão SMTP: {err:?}"))?
            .send(message)
            .await
            .map_err(|err| format!("envio SMTP: {err:?}"))
    }
}

#[derive(Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub api_token: String,
}

#[derive(Clone)]
pub struct WhatsAppClient {
    config: Option<WhatsAppConfig>,
    http: reqwest::Client,
    log_repo: MessageLogRepository,
}

impl WhatsAppClient {
    pub fn new(config: Option<WhatsAppConfig>, log_repo: MessageLogRepository) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { config, http, log_repo }
    }

    /// Mensagem de texto simples. O envio é sempre melhor-esforço: falhas
    /// ficam no log e não interrompem o fluxo chamador.
    pub async fn send_text(
        &self,
        phone: &str,
        body: &str,
        template_name: &str,
        reference_id: Option<String>,
    ) {
        let Some(recipient) = normalize_phone(phone) else {
            tracing::warn!("⚠️ Telefone inválido para WhatsApp: {}", phone);
            return;
        };

        let outcome = self.deliver(&recipient, body).await;

        let entry = MessageLogEntry {
            recipient: recipient.clone(),
            channel: MessageChannel::Whatsapp,
            template_name: template_name.to_string(),
            status: if outcome.is_ok() { MessageStatus::Sent } else { MessageStatus::Failed },
            context: body.chars().take(200).collect(),
            reference_id,
            error_message: outcome.as_ref().err().cloned(),
        };
        if let Err(e) = self.log_repo.record(&entry).await {
            tracing::warn!("⚠️ Falha ao gravar message_log de WhatsApp: {:?}", e);
        }

        match outcome {
            Ok(()) => tracing::info!("💬 WhatsApp '{}' enviado para {}", template_name, recipient),
            Err(err) => tracing::warn!("⚠️ WhatsApp para {} falhou: {}", recipient, err),
        }
    }

    async fn deliver(&self, recipient: &str, body: &str) -> Result<(), String> {
        let Some(config) = &self.config else {
            tracing::info!("💤 WhatsApp desabilitado; mensagem para {} descartada", recipient);
            return Ok(());
        };

        let response = self
            .http
            .post(&config.api_url)
            .bearer_auth(&config.api_token)
            .json(&serde_json::json!({
                "to": recipient,
                "type": "text",
                "text": { "body": body },
            }))
            .send()
            .await
            .map_err(|err| format!("requisição HTTP: {err}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("API retornou {status}: {text}"));
        }
        Ok(())
    }
}

/// Normaliza para E.164 indiano: 10 dígitos ganham o prefixo 91.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Some(format!("91{digits}")),
        11..=15 => Some(digits),
        _ => None,
    }
}

// ---
// Templates de e-mail do portal
// ---

pub fn otp_email(name: &str, otp: &str) -> (String, String) {
    let subject = "Seu código de acesso".to_string();
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Olá, {name}!</h2>
            <p>Use o código abaixo para concluir o seu login. Ele expira em 10 minutos.</p>
            <p style="font-size:28px;letter-spacing:6px"><b>{otp}</b></p>
            <p>Se você não tentou entrar, ignore este e-mail.</p>
        </div>"#
    );
    (subject, html)
}

pub fn vendor_welcome_email(name: &str, store_name: &str) -> (String, String) {
    let subject = "Cadastro recebido".to_string();
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Bem-vindo, {name}!</h2>
            <p>Recebemos o cadastro da loja <b>{store_name}</b>.</p>
            <p>Sua conta será liberada assim que a equipe concluir a verificação.</p>
        </div>"#
    );
    (subject, html)
}

pub fn vendor_verification_request_email(
    store_name: &str,
    vendor_name: &str,
    vendor_email: &str,
    verify_link: &str,
) -> (String, String) {
    let subject = format!("Nova loja aguardando verificação: {store_name}");
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Nova loja cadastrada</h2>
            <p><b>{store_name}</b> ({vendor_name}, {vendor_email}) aguarda verificação.</p>
            <p><a href="{verify_link}">Verificar loja</a></p>
        </div>"#
    );
    (subject, html)
}

pub fn vendor_verified_email(name: &str, store_name: &str) -> (String, String) {
    let subject = "Sua loja foi verificada".to_string();
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Parabéns, {name}!</h2>
            <p>A loja <b>{store_name}</b> foi verificada e já pode operar no portal.</p>
        </div>"#
    );
    (subject, html)
}

pub fn warranty_status_email(
    customer_name: &str,
    uid: &str,
    status_label: &str,
    reason: Option<&str>,
) -> (String, String) {
    let subject = format!("Atualização da garantia {uid}");
    let reason_block = reason
        .map(|r| format!("<p>Motivo: {r}</p>"))
        .unwrap_or_default();
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Olá, {customer_name}!</h2>
            <p>O registro de garantia <b>{uid}</b> agora está: <b>{status_label}</b>.</p>
            {reason_block}
        </div>"#
    );
    (subject, html)
}

pub fn grievance_ack_email(customer_name: &str, ticket_id: &str) -> (String, String) {
    let subject = format!("Recebemos o seu chamado {ticket_id}");
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Olá, {customer_name}!</h2>
            <p>Seu chamado <b>{ticket_id}</b> foi registrado e já está na fila da equipe.</p>
            <p>Você será notificado a cada atualização.</p>
        </div>"#
    );
    (subject, html)
}

pub fn assignment_email(
    assignee_name: &str,
    ticket_id: &str,
    subject_line: &str,
    description: &str,
    due_date: &str,
    portal_link: &str,
    remarks: Option<&str>,
) -> (String, String) {
    let subject = format!("Chamado {ticket_id} atribuído a você");
    let remarks_block = remarks
        .map(|r| format!("<p>Observações: {r}</p>"))
        .unwrap_or_default();
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Olá, {assignee_name}!</h2>
            <p>O chamado <b>{ticket_id}</b> ({subject_line}) foi atribuído a você.</p>
            <p>{description}</p>
            {remarks_block}
            <p>Prazo estimado: <b>{due_date}</b></p>
            <p><a href="{portal_link}">Registrar andamento</a></p>
        </div>"#
    );
    (subject, html)
}

pub fn follow_up_email(
    assignee_name: &str,
    ticket_id: &str,
    subject_line: &str,
    due_date: &str,
    portal_link: &str,
) -> (String, String) {
    let subject = format!("Lembrete: chamado {ticket_id} aguardando retorno");
    let html = format!(
        r#"<div style="font-family:sans-serif">
            <h2>Olá, {assignee_name}!</h2>
            <p>O chamado <b>{ticket_id}</b> ({subject_line}) venceu em <b>{due_date}</b>
               e ainda não recebeu atualização.</p>
            <p><a href="{portal_link}">Registrar andamento agora</a></p>
        </div>"#
    );
    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("9876543210").as_deref(), Some("919876543210"));
        assert_eq!(normalize_phone("+91 98765 43210").as_deref(), Some("919876543210"));
        assert_eq!(normalize_phone("919876543210").as_deref(), Some("919876543210"));
        assert_eq!(normalize_phone("12345").is_none(), true);
    }
}
