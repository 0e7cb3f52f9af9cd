// src/services/scheduler.rs
// Tarefa de fundo: cobrança de atribuições vencidas e higiene de OTPs.
// Roda uma vez na subida e depois a cada hora, até o shutdown.

use std::time::Duration;

use chrono::{FixedOffset, Timelike, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    common::error::AppError,
    db::{GrievanceRepository, UserRepository},
    models::grievance::{AssignmentType, OverdueAssignment},
    services::messaging::{self, Mailer},
};

const RUN_INTERVAL: Duration = Duration::from_secs(60 * 60);

// O negócio opera em horário indiano. Atribuições que vencem hoje só
// entram na cobrança a partir das 17h IST.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;
const DUE_TODAY_CUTOFF_HOUR: u32 = 17;

#[derive(Clone)]
pub struct FollowUpScheduler {
    grievance_repo: GrievanceRepository,
    user_repo: UserRepository,
    mailer: Mailer,
    app_url: String,
    pool: sqlx::PgPool,
}

impl FollowUpScheduler {
    pub fn new(
        grievance_repo: GrievanceRepository,
        user_repo: UserRepository,
        mailer: Mailer,
        app_url: String,
        pool: sqlx::PgPool,
    ) -> Self {
        Self { grievance_repo, user_repo, mailer, app_url, pool }
    }

    /// Loop principal. Bloqueia até o token ser cancelado.
    pub async fn run(self, cancellation_token: CancellationToken) {
        tracing::info!("🕒 Scheduler de follow-up iniciado (intervalo de 1h)");
        let mut interval = tokio::time::interval(RUN_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!("❌ Rodada do scheduler falhou: {:?}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    tracing::info!("🛑 Scheduler de follow-up encerrado");
                    return;
                }
            }
        }
    }

    /// Uma rodada completa: cobranças + poda de OTPs expirados.
    pub async fn run_once(&self) -> Result<(), AppError> {
        let pruned = self.user_repo.prune_expired_otps().await?;
        if pruned > 0 {
            tracing::debug!("🧹 {} OTPs expirados removidos", pruned);
        }

        let ist = FixedOffset::east_opt(IST_OFFSET_SECS)
            .ok_or_else(|| anyhow::anyhow!("offset IST inválido"))?;
        let now_ist = Utc::now().with_timezone(&ist);
        let today = now_ist.date_naive();
        let include_due_today = now_ist.hour() >= DUE_TODAY_CUTOFF_HOUR;

        let overdue = self.grievance_repo.find_overdue(today, include_due_today).await?;
        if overdue.is_empty() {
            tracing::debug!("🕒 Nenhuma atribuição vencida nesta rodada");
            return Ok(());
        }

        tracing::info!("🕒 {} atribuições vencidas para cobrar", overdue.len());
        let mut sent = 0usize;
        for assignment in &overdue {
            match self.follow_up(assignment).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    "⚠️ Follow-up do chamado {} para {} falhou: {:?}",
                    assignment.ticket_id,
                    assignment.assignee_email,
                    e
                ),
            }
        }
        tracing::info!("✅ Rodada concluída: {}/{} cobranças enviadas", sent, overdue.len());
        Ok(())
    }

    /// Cobra um responsável: e-mail de lembrete, marca a linha atual como
    /// cobrada e anexa uma nova linha pendente com o mesmo token.
    async fn follow_up(&self, assignment: &OverdueAssignment) -> Result<(), AppError> {
        let portal_link = format!(
            "{}/assignment/{}",
            self.app_url.trim_end_matches('/'),
            assignment.update_token
        );
        let (subject, html) = messaging::follow_up_email(
            &assignment.assignee_name,
            &assignment.ticket_id,
            &assignment.subject,
            &assignment.estimated_completion_date.to_string(),
            &portal_link,
        );
        self.mailer
            .send(
                &assignment.assignee_email,
                &subject,
                html,
                "grievance_follow_up",
                Some(assignment.ticket_id.clone()),
            )
            .await?;

        // Só depois do envio bem-sucedido o histórico avança.
        let mut tx = self.pool.begin().await?;
        self.grievance_repo.mark_follow_up_sent(&mut *tx, assignment.id).await?;
        self.grievance_repo
            .append_assignment(
                &mut *tx,
                assignment.grievance_id,
                &assignment.assignee_name,
                &assignment.assignee_email,
                None,
                AssignmentType::FollowUp,
                assignment.estimated_completion_date,
                &assignment.update_token,
                None,
                Some("System Scheduler"),
            )
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
