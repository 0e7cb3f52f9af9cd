// src/services/warranty.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{UidRepository, VendorRepository, WarrantyRepository},
    models::{
        auth::Role,
        notification::{NotificationType, NotifyInput},
        warranty::{SubmitWarrantyPayload, WarrantyRegistration, WarrantyStatus},
    },
    services::{
        messaging::{self, Mailer, WhatsAppClient},
        notification::NotificationService,
    },
};

#[derive(Clone)]
pub struct WarrantyService {
    warranty_repo: WarrantyRepository,
    uid_repo: UidRepository,
    vendor_repo: VendorRepository,
    notifications: NotificationService,
    mailer: Mailer,
    whatsapp: WhatsAppClient,
    pool: PgPool,
}

impl WarrantyService {
    pub fn new(
        warranty_repo: WarrantyRepository,
        uid_repo: UidRepository,
        vendor_repo: VendorRepository,
        notifications: NotificationService,
        mailer: Mailer,
        whatsapp: WhatsAppClient,
        pool: PgPool,
    ) -> Self {
        Self { warranty_repo, uid_repo, vendor_repo, notifications, mailer, whatsapp, pool }
    }

    /// Submete um registro de garantia consumindo um UID do pool. Consumo e
    /// inserção acontecem na mesma transação: ou a garantia nasce com o UID
    /// marcado, ou nada muda.
    pub async fn submit(
        &self,
        user_id: Uuid,
        role: Role,
        payload: &SubmitWarrantyPayload,
    ) -> Result<WarrantyRegistration, AppError> {
        // Checagem prévia fora da transação para mensagens de erro precisas.
        match self.uid_repo.find(&payload.uid).await? {
            None => return Err(AppError::UidNotAvailable(payload.uid.clone())),
            Some(existing) if existing.is_used => {
                return Err(AppError::UidAlreadyUsed(payload.uid.clone()));
            }
            Some(_) => {}
        }

        // Garantia submetida por franquia (com instalador) pula a triagem
        // inicial e entra direto na fila do vendor.
        let status = if role == Role::Vendor || payload.manpower_id.is_some() {
            WarrantyStatus::PendingVendor
        } else {
            WarrantyStatus::Pending
        };

        let mut tx = self.pool.begin().await?;

        let consumed = self.uid_repo.consume(&mut *tx, &payload.uid).await?;
        if !consumed {
            // Corrida com outra submissão: alguém consumiu entre a checagem
            // e o UPDATE.
            return Err(AppError::UidAlreadyUsed(payload.uid.clone()));
        }

        let registration = self
            .warranty_repo
            .create(&mut *tx, user_id, status, payload)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🛡️ Garantia {} registrada para {} (status {})",
            registration.uid,
            registration.customer_email,
            registration.status.as_str()
        );

        // Confirmação ao cliente e aviso aos admins, ambos melhor-esforço.
        let (subject, html) = messaging::warranty_status_email(
            &registration.customer_name,
            &registration.uid,
            "recebida e em análise",
            None,
        );
        if let Err(e) = self
            .mailer
            .send(
                &registration.customer_email,
                &subject,
                html,
                "warranty_submitted",
                Some(registration.uid.clone()),
            )
            .await
        {
            tracing::warn!("⚠️ Confirmação de garantia não enviada: {:?}", e);
        }

        let input = NotifyInput::new(
            NotificationType::Warranty,
            "Nova garantia registrada",
            format!(
                "{} registrou a garantia {} ({}).",
                registration.customer_name, registration.uid, registration.product_type
            ),
        )
        .with_link(format!("/admin/warranties?uid={}", registration.uid));
        if let Err(e) = self.notifications.notify_admins(input).await {
            tracing::warn!("⚠️ Falha ao notificar admins da nova garantia: {:?}", e);
        }

        Ok(registration)
    }

    /// Transição de status pelo admin. Rejeição exige motivo; o dono é
    /// notificado por socket, e-mail e WhatsApp (melhor-esforço).
    pub async fn update_status(
        &self,
        uid: &str,
        next: WarrantyStatus,
        rejection_reason: Option<&str>,
    ) -> Result<WarrantyRegistration, AppError> {
        let current = self
            .warranty_repo
            .find_by_uid(uid)
            .await?
            .ok_or(AppError::NotFound("Garantia"))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Transição de '{}' para '{}' não é permitida.",
                current.status.as_str(),
                next.as_str()
            )));
        }
        if next == WarrantyStatus::Rejected
            && rejection_reason.map(str::trim).unwrap_or("").is_empty()
        {
            return Err(AppError::BadRequest(
                "A rejeição exige um motivo.".to_string(),
            ));
        }

        self.warranty_repo.update_status(uid, next, rejection_reason).await?;
        let updated = self
            .warranty_repo
            .find_by_uid(uid)
            .await?
            .ok_or(AppError::NotFound("Garantia"))?;

        tracing::info!("🛡️ Garantia {} movida para {}", uid, next.as_str());

        let status_label = match next {
            WarrantyStatus::Validated => "aprovada",
            WarrantyStatus::Rejected => "rejeitada",
            WarrantyStatus::PendingVendor => "em análise pela loja",
            WarrantyStatus::Pending => "em análise",
        };

        // Notificação in-app para quem submeteu.
        let input = NotifyInput::new(
            NotificationType::Warranty,
            format!("Garantia {status_label}"),
            format!("O registro {uid} foi {status_label}."),
        )
        .with_link(format!("/warranties/{uid}"));
        if let Err(e) = self.notifications.notify(updated.user_id, input).await {
            tracing::warn!("⚠️ Falha ao notificar dono da garantia: {:?}", e);
        }

        if matches!(next, WarrantyStatus::Validated | WarrantyStatus::Rejected) {
            let (subject, html) = messaging::warranty_status_email(
                &updated.customer_name,
                uid,
                status_label,
                updated.rejection_reason.as_deref(),
            );
            if let Err(e) = self
                .mailer
                .send(&updated.customer_email, &subject, html, "warranty_decision", Some(uid.to_string()))
                .await
            {
                tracing::warn!("⚠️ E-mail de decisão não enviado: {:?}", e);
            }

            self.whatsapp
                .send_text(
                    &updated.customer_phone,
                    &format!("Sua garantia {uid} foi {status_label}."),
                    "warranty_decision",
                    Some(uid.to_string()),
                )
                .await;
        }

        Ok(updated)
    }

    /// Moderação pela loja: apenas garantias na fila do vendor, e apenas
    /// pelas lojas envolvidas no registro.
    pub async fn vendor_decide(
        &self,
        uid: &str,
        vendor_user_id: Uuid,
        approve: bool,
        reason: Option<&str>,
    ) -> Result<WarrantyRegistration, AppError> {
        let current = self
            .warranty_repo
            .find_by_uid(uid)
            .await?
            .ok_or(AppError::NotFound("Garantia"))?;

        if current.status != WarrantyStatus::PendingVendor {
            return Err(AppError::BadRequest(
                "Apenas garantias aguardando a loja podem ser moderadas.".to_string(),
            ));
        }
        self.authorize_view(&current, vendor_user_id, Role::Vendor).await?;

        let next = if approve {
            WarrantyStatus::Validated
        } else {
            WarrantyStatus::Rejected
        };
        self.update_status(uid, next, reason).await
    }

    /// Acesso ao detalhe: dono, loja envolvida ou admin.
    pub async fn authorize_view(
        &self,
        registration: &WarrantyRegistration,
        user_id: Uuid,
        role: Role,
    ) -> Result<(), AppError> {
        match role {
            Role::Admin => Ok(()),
            _ if registration.user_id == user_id => Ok(()),
            Role::Vendor => {
                // Visível se o instalador apontado pertence à loja do vendor.
                if let Some(manpower_id) = registration.manpower_id {
                    let own_store = self.vendor_repo.find_by_user_id(user_id).await?;
                    let manpower = self.vendor_repo.find_manpower(manpower_id).await?;
                    if let (Some(store), Some(m)) = (own_store, manpower) {
                        if m.vendor_id == store.id {
                            return Ok(());
                        }
                    }
                }
                Err(AppError::Forbidden(
                    "Você não tem acesso a este registro de garantia.".to_string(),
                ))
            }
            _ => Err(AppError::Forbidden(
                "Você não tem acesso a este registro de garantia.".to_string(),
            )),
        }
    }
}
