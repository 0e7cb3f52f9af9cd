// src/services/grievance.rs

use chrono::Utc;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{GrievanceRepository, UserRepository, VendorRepository},
    models::{
        auth::Role,
        grievance::{
            AssignmentPortalView, AssignmentType, AssignmentUpdatePayload, Grievance,
            GrievanceAssignment, GrievanceStatus, SendAssignmentPayload,
            SubmitFranchiseGrievancePayload, SubmitGrievancePayload,
        },
        notification::{NotificationType, NotifyInput},
    },
    services::{
        auth::random_token,
        messaging::{self, Mailer},
        notification::NotificationService,
    },
};

#[derive(Clone)]
pub struct GrievanceService {
    repo: GrievanceRepository,
    user_repo: UserRepository,
    vendor_repo: VendorRepository,
    notifications: NotificationService,
    mailer: Mailer,
    app_url: String,
    pool: PgPool,
}

impl GrievanceService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: GrievanceRepository,
        user_repo: UserRepository,
        vendor_repo: VendorRepository,
        notifications: NotificationService,
        mailer: Mailer,
        app_url: String,
        pool: PgPool,
    ) -> Self {
        Self { repo, user_repo, vendor_repo, notifications, mailer, app_url, pool }
    }

    /// Chamado aberto por um cliente final.
    pub async fn submit(
        &self,
        customer_id: Uuid,
        payload: &SubmitGrievancePayload,
    ) -> Result<Grievance, AppError> {
        let ticket_id = generate_ticket_id("GR");
        let grievance = self.repo.create_for_customer(customer_id, &ticket_id, payload).await?;

        tracing::info!("📮 Chamado {} aberto (cliente {})", ticket_id, customer_id);
        self.acknowledge_and_alert(&grievance, customer_id).await;
        Ok(grievance)
    }

    /// Chamado aberto pela própria franquia (direcionado a um departamento).
    pub async fn submit_franchise(
        &self,
        franchise_user_id: Uuid,
        payload: &SubmitFranchiseGrievancePayload,
    ) -> Result<Grievance, AppError> {
        let details = self
            .vendor_repo
            .find_by_user_id(franchise_user_id)
            .await?
            .ok_or(AppError::NotFound("Loja do vendor"))?;

        let ticket_id = generate_ticket_id("GR");
        let grievance = self
            .repo
            .create_for_franchise(franchise_user_id, details.id, &ticket_id, payload)
            .await?;

        tracing::info!("📮 Chamado {} aberto (franquia {})", ticket_id, details.store_name);
        self.acknowledge_and_alert(&grievance, franchise_user_id).await;
        Ok(grievance)
    }

    async fn acknowledge_and_alert(&self, grievance: &Grievance, opener_id: Uuid) {
        if let Ok(Some(profile)) = self.user_repo.find_by_id(opener_id).await {
            let (subject, html) = messaging::grievance_ack_email(&profile.name, &grievance.ticket_id);
            if let Err(e) = self
                .mailer
                .send(&profile.email, &subject, html, "grievance_ack", Some(grievance.ticket_id.clone()))
                .await
            {
                tracing::warn!("⚠️ Confirmação de chamado não enviada: {:?}", e);
            }
        }

        let input = NotifyInput::new(
            NotificationType::Alert,
            "Novo chamado aberto",
            format!("{}: {}", grievance.ticket_id, grievance.subject),
        )
        .with_link(format!("/admin/grievances/{}", grievance.id));
        if let Err(e) = self.notifications.notify_admins(input).await {
            tracing::warn!("⚠️ Falha ao notificar admins do chamado: {:?}", e);
        }
    }

    /// Transição de status com notificação ao dono.
    pub async fn update_status(
        &self,
        id: Uuid,
        next: GrievanceStatus,
        priority: Option<&str>,
    ) -> Result<Grievance, AppError> {
        let current = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Chamado"))?;
        if current.status.is_terminal() && current.status != next {
            return Err(AppError::BadRequest(
                "Chamados resolvidos ou rejeitados não mudam mais de status.".to_string(),
            ));
        }

        let updated = self
            .repo
            .update_status(id, Some(next), priority)
            .await?
            .ok_or(AppError::NotFound("Chamado"))?;

        tracing::info!("📮 Chamado {} movido para {:?}", updated.ticket_id, next);

        let label = match next {
            GrievanceStatus::Open => "reaberto",
            GrievanceStatus::InProgress => "em andamento",
            GrievanceStatus::Resolved => "resolvido",
            GrievanceStatus::Rejected => "rejeitado",
        };
        let input = NotifyInput::new(
            NotificationType::Alert,
            format!("Chamado {label}"),
            format!("O chamado {} agora está {label}.", updated.ticket_id),
        )
        .with_link(format!("/grievances/{}", updated.id));
        if let Err(e) = self.notifications.notify(updated.customer_id, input).await {
            tracing::warn!("⚠️ Falha ao notificar dono do chamado: {:?}", e);
        }

        Ok(updated)
    }

    // ---
    // Atribuição a responsáveis externos
    // ---

    /// Atribui o chamado a um responsável externo: registra a linha inicial
    /// do histórico e envia o link do portal com o token de atualização.
    pub async fn send_assignment(
        &self,
        grievance_id: Uuid,
        admin_id: Uuid,
        admin_name: &str,
        payload: &SendAssignmentPayload,
    ) -> Result<GrievanceAssignment, AppError> {
        let grievance = self
            .repo
            .find_by_id(grievance_id)
            .await?
            .ok_or(AppError::NotFound("Chamado"))?;
        if grievance.status.is_terminal() {
            return Err(AppError::BadRequest(
                "Não é possível atribuir um chamado encerrado.".to_string(),
            ));
        }
        if payload.estimated_completion_date < Utc::now().date_naive() {
            return Err(AppError::BadRequest(
                "O prazo estimado não pode estar no passado.".to_string(),
            ));
        }

        let token = random_token(48);
        let mut tx = self.pool.begin().await?;
        let assignment = self
            .repo
            .append_assignment(
                &mut *tx,
                grievance_id,
                payload.assignee_name.trim(),
                &payload.assignee_email.to_lowercase(),
                payload.remarks.as_deref(),
                AssignmentType::Initial,
                payload.estimated_completion_date,
                &token,
                Some(admin_id),
                Some(admin_name),
            )
            .await?;
        tx.commit().await?;

        let portal_link = self.portal_link(&token);
        let (subject, html) = messaging::assignment_email(
            &assignment.assignee_name,
            &grievance.ticket_id,
            &grievance.subject,
            &grievance.description,
            &assignment.estimated_completion_date.to_string(),
            &portal_link,
            assignment.remarks.as_deref(),
        );
        self.mailer
            .send(
                &assignment.assignee_email,
                &subject,
                html,
                "grievance_assignment",
                Some(grievance.ticket_id.clone()),
            )
            .await?;
        self.repo.mark_email_sent(assignment.id).await?;

        // O chamado sai da fila de triagem assim que alguém assume.
        if grievance.status == GrievanceStatus::Open {
            self.repo
                .update_status(grievance_id, Some(GrievanceStatus::InProgress), None)
                .await?;
        }

        tracing::info!(
            "📧 Chamado {} atribuído a {} (prazo {})",
            grievance.ticket_id,
            assignment.assignee_email,
            assignment.estimated_completion_date
        );
        Ok(assignment)
    }

    /// Contexto do portal público do responsável.
    pub async fn portal_view(&self, token: &str) -> Result<AssignmentPortalView, AppError> {
        let assignment = self
            .repo
            .find_latest_by_token(token)
            .await?
            .ok_or(AppError::NotFound("Atribuição"))?;
        let grievance = self
            .repo
            .find_by_id(assignment.grievance_id)
            .await?
            .ok_or(AppError::NotFound("Chamado"))?;

        let customer_name = match self.user_repo.find_by_id(grievance.customer_id).await? {
            Some(p) => Some(p.name),
            None => None,
        };
        let franchise_name = match grievance.franchise_id {
            Some(id) => self.vendor_repo.find_by_id(id).await?.map(|d| d.store_name),
            None => None,
        };

        Ok(AssignmentPortalView {
            ticket_id: grievance.ticket_id,
            category: grievance.category,
            subject: grievance.subject,
            description: grievance.description,
            customer_name,
            franchise_name,
            assignee_name: assignment.assignee_name,
            status: assignment.status,
            estimated_completion_date: assignment.estimated_completion_date,
            assigned_at: assignment.created_at,
        })
    }

    /// Atualização vinda do portal do responsável. Registra o comentário e,
    /// quando `completed`, encerra a atribuição e move o chamado.
    pub async fn portal_update(
        &self,
        token: &str,
        payload: &AssignmentUpdatePayload,
    ) -> Result<Grievance, AppError> {
        let assignment = self
            .repo
            .find_latest_by_token(token)
            .await?
            .ok_or(AppError::NotFound("Atribuição"))?;
        let grievance = self
            .repo
            .find_by_id(assignment.grievance_id)
            .await?
            .ok_or(AppError::NotFound("Chamado"))?;
        if grievance.status.is_terminal() {
            return Err(AppError::BadRequest(
                "Este chamado já foi encerrado.".to_string(),
            ));
        }

        let remark = format!("[{}] {}", assignment.assignee_name, payload.remarks.trim());
        self.repo.add_remark(grievance.id, None, None, &remark).await?;

        let updated = if payload.completed {
            self.repo.complete_by_token(token).await?;
            self.repo
                .update_status(grievance.id, Some(GrievanceStatus::Resolved), None)
                .await?
                .ok_or(AppError::NotFound("Chamado"))?
        } else {
            self.repo
                .update_status(grievance.id, Some(GrievanceStatus::InProgress), None)
                .await?
                .ok_or(AppError::NotFound("Chamado"))?
        };

        let input = NotifyInput::new(
            NotificationType::Alert,
            "Retorno do responsável",
            format!(
                "{} atualizou o chamado {}{}.",
                assignment.assignee_name,
                updated.ticket_id,
                if payload.completed { " (concluído)" } else { "" }
            ),
        )
        .with_link(format!("/admin/grievances/{}", updated.id));
        if let Err(e) = self.notifications.notify_admins(input).await {
            tracing::warn!("⚠️ Falha ao notificar admins do retorno: {:?}", e);
        }

        tracing::info!(
            "🔄 Portal: {} atualizou {} (completed = {})",
            assignment.assignee_email,
            updated.ticket_id,
            payload.completed
        );
        Ok(updated)
    }

    pub fn portal_link(&self, token: &str) -> String {
        format!("{}/assignment/{token}", self.app_url.trim_end_matches('/'))
    }
}

/// Identificador legível de ticket: prefixo + timestamp + sufixo aleatório.
pub fn generate_ticket_id(prefix: &str) -> String {
    let ts = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(100..1000);
    format!("{prefix}-{ts}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_shape() {
        let id = generate_ticket_id("GR");
        assert!(id.starts_with("GR-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 14);
        assert_eq!(parts[2].len(), 3);
    }
}
