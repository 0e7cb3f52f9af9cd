// src/db/grievance_repo.rs

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PaginationQuery},
    models::{
        auth::Role,
        grievance::{
            AssignmentStatus, AssignmentType, Grievance, GrievanceAssignment, GrievanceListRow,
            GrievanceFilterQuery, GrievanceRemark, GrievanceStatus, OverdueAssignment,
            SubmitFranchiseGrievancePayload, SubmitGrievancePayload,
        },
    },
};

const LIST_COLUMNS: &str = r#"
    g.id, g.ticket_id, g.source_type, g.category, g.subject, g.status,
    g.priority, g.rating, g.created_at,
    p.name AS customer_name, vd.store_name AS franchise_name
"#;

#[derive(Clone)]
pub struct GrievanceRepository {
    pool: PgPool,
}

impl GrievanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_for_customer(
        &self,
        customer_id: Uuid,
        ticket_id: &str,
        payload: &SubmitGrievancePayload,
    ) -> Result<Grievance, AppError> {
        let attachments = serde_json::to_value(&payload.attachments)?;
        let row = sqlx::query_as::<_, Grievance>(
            r#"
            INSERT INTO grievances
                (ticket_id, customer_id, franchise_id, source_type, category,
                 subject, description, attachments)
            VALUES ($1, $2, $3, 'customer', $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(customer_id)
        .bind(payload.franchise_id)
        .bind(&payload.category)
        .bind(&payload.subject)
        .bind(&payload.description)
        .bind(attachments)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_for_franchise(
        &self,
        franchise_user_id: Uuid,
        franchise_details_id: Uuid,
        ticket_id: &str,
        payload: &SubmitFranchiseGrievancePayload,
    ) -> Result<Grievance, AppError> {
        let attachments = serde_json::to_value(&payload.attachments)?;
        let row = sqlx::query_as::<_, Grievance>(
            r#"
            INSERT INTO grievances
                (ticket_id, customer_id, franchise_id, source_type, department,
                 department_details, category, subject, description, attachments)
            VALUES ($1, $2, $3, 'franchise', $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(franchise_user_id)
        .bind(franchise_details_id)
        .bind(&payload.department)
        .bind(&payload.department_details)
        .bind(&payload.category)
        .bind(&payload.subject)
        .bind(&payload.description)
        .bind(attachments)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Grievance>, AppError> {
        let row = sqlx::query_as::<_, Grievance>("SELECT * FROM grievances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_ticket(&self, ticket_id: &str) -> Result<Option<Grievance>, AppError> {
        let row = sqlx::query_as::<_, Grievance>("SELECT * FROM grievances WHERE ticket_id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_for_user(&self, customer_id: Uuid) -> Result<Vec<Grievance>, AppError> {
        let rows = sqlx::query_as::<_, Grievance>(
            "SELECT * FROM grievances WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Chamados que a própria franquia abriu junto à matriz.
    pub async fn list_franchise_submitted(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Grievance>, AppError> {
        let rows = sqlx::query_as::<_, Grievance>(
            r#"
            SELECT * FROM grievances
            WHERE customer_id = $1 AND source_type = 'franchise'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Chamados de clientes contra uma loja específica.
    pub async fn list_for_franchise(&self, franchise_id: Uuid) -> Result<Vec<Grievance>, AppError> {
        let rows = sqlx::query_as::<_, Grievance>(
            r#"
            SELECT * FROM grievances
            WHERE franchise_id = $1 AND source_type = 'customer'
            ORDER BY created_at DESC
            "#,
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(
        &self,
        filter: &GrievanceFilterQuery,
    ) -> Result<(Vec<GrievanceListRow>, i64), AppError> {
        let page = PaginationQuery { page: filter.page, limit: filter.limit };
        let search = filter.search.as_deref().map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM grievances g
            LEFT JOIN profiles p ON p.id = g.customer_id
            WHERE ($1::grievance_status IS NULL OR g.status = $1)
              AND ($2::text IS NULL
                   OR g.ticket_id ILIKE $2
                   OR g.subject ILIKE $2
                   OR p.name ILIKE $2)
            "#,
        )
        .bind(filter.status)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            r#"
            SELECT {LIST_COLUMNS}
            FROM grievances g
            LEFT JOIN profiles p ON p.id = g.customer_id
            LEFT JOIN vendor_details vd ON vd.id = g.franchise_id
            WHERE ($1::grievance_status IS NULL OR g.status = $1)
              AND ($2::text IS NULL
                   OR g.ticket_id ILIKE $2
                   OR g.subject ILIKE $2
                   OR p.name ILIKE $2)
            ORDER BY g.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, GrievanceListRow>(&query)
            .bind(filter.status)
            .bind(&search)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: Option<GrievanceStatus>,
        priority: Option<&str>,
    ) -> Result<Option<Grievance>, AppError> {
        let row = sqlx::query_as::<_, Grievance>(
            r#"
            UPDATE grievances
            SET status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                status_updated_at = CASE WHEN $2 IS NOT NULL THEN now() ELSE status_updated_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(priority)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn admin_update(
        &self,
        id: Uuid,
        category: Option<&str>,
        priority: Option<&str>,
        admin_notes: Option<&str>,
    ) -> Result<Option<Grievance>, AppError> {
        let row = sqlx::query_as::<_, Grievance>(
            r#"
            UPDATE grievances
            SET category = COALESCE($2, category),
                priority = COALESCE($3, priority),
                admin_notes = COALESCE($4, admin_notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(category)
        .bind(priority)
        .bind(admin_notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// A avaliação só entra uma vez, pelo dono, com o chamado resolvido.
    pub async fn set_rating(&self, id: Uuid, customer_id: Uuid, rating: i32) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE grievances
            SET rating = $3
            WHERE id = $1 AND customer_id = $2 AND status = 'resolved' AND rating IS NULL
            "#,
        )
        .bind(id)
        .bind(customer_id)
        .bind(rating)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self, status: GrievanceStatus) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM grievances WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // ---
    // Comentários internos
    // ---

    pub async fn add_remark(
        &self,
        grievance_id: Uuid,
        author_id: Option<Uuid>,
        author_role: Option<Role>,
        remark: &str,
    ) -> Result<GrievanceRemark, AppError> {
        let row = sqlx::query_as::<_, GrievanceRemark>(
            r#"
            INSERT INTO grievance_remarks (grievance_id, author_id, author_role, remark)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(grievance_id)
        .bind(author_id)
        .bind(author_role)
        .bind(remark)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_remarks(&self, grievance_id: Uuid) -> Result<Vec<GrievanceRemark>, AppError> {
        let rows = sqlx::query_as::<_, GrievanceRemark>(
            "SELECT * FROM grievance_remarks WHERE grievance_id = $1 ORDER BY created_at ASC",
        )
        .bind(grievance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Atribuições (histórico append-only)
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn append_assignment(
        &self,
        conn: &mut PgConnection,
        grievance_id: Uuid,
        assignee_name: &str,
        assignee_email: &str,
        remarks: Option<&str>,
        assignment_type: AssignmentType,
        estimated_completion_date: NaiveDate,
        update_token: &str,
        sent_by: Option<Uuid>,
        sent_by_name: Option<&str>,
    ) -> Result<GrievanceAssignment, AppError> {
        let row = sqlx::query_as::<_, GrievanceAssignment>(
            r#"
            INSERT INTO grievance_assignments
                (grievance_id, assignee_name, assignee_email, remarks, assignment_type,
                 estimated_completion_date, update_token, sent_by, sent_by_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(grievance_id)
        .bind(assignee_name)
        .bind(assignee_email)
        .bind(remarks)
        .bind(assignment_type)
        .bind(estimated_completion_date)
        .bind(update_token)
        .bind(sent_by)
        .bind(sent_by_name)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    pub async fn list_assignments(
        &self,
        grievance_id: Uuid,
    ) -> Result<Vec<GrievanceAssignment>, AppError> {
        let rows = sqlx::query_as::<_, GrievanceAssignment>(
            "SELECT * FROM grievance_assignments WHERE grievance_id = $1 ORDER BY id ASC",
        )
        .bind(grievance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// A linha mais recente emitida com esse token. O portal público sempre
    /// opera sobre ela.
    pub async fn find_latest_by_token(
        &self,
        token: &str,
    ) -> Result<Option<GrievanceAssignment>, AppError> {
        let row = sqlx::query_as::<_, GrievanceAssignment>(
            r#"
            SELECT * FROM grievance_assignments
            WHERE update_token = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn mark_email_sent(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE grievance_assignments SET email_sent_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Atribuições vencidas candidatas a follow-up. Considera apenas a linha
    /// mais recente de cada par (reclamação, responsável), ainda pendente,
    /// em reclamação aberta e sem follow-up nas últimas 24 horas.
    pub async fn find_overdue(
        &self,
        today: NaiveDate,
        include_due_today: bool,
    ) -> Result<Vec<OverdueAssignment>, AppError> {
        let rows = sqlx::query_as::<_, OverdueAssignment>(
            r#"
            SELECT a.id, a.grievance_id, a.assignee_name, a.assignee_email,
                   a.estimated_completion_date, a.update_token,
                   g.ticket_id, g.category, g.subject, g.description,
                   p.name AS customer_name, vd.store_name AS franchise_name
            FROM grievance_assignments a
            JOIN (
                SELECT grievance_id, assignee_email, MAX(id) AS latest_id
                FROM grievance_assignments
                GROUP BY grievance_id, assignee_email
            ) latest ON latest.latest_id = a.id
            JOIN grievances g ON g.id = a.grievance_id
            LEFT JOIN profiles p ON p.id = g.customer_id
            LEFT JOIN vendor_details vd ON vd.id = g.franchise_id
            WHERE a.status = 'pending'
              AND g.status NOT IN ('resolved', 'rejected')
              AND (a.estimated_completion_date < $1
                   OR ($2 AND a.estimated_completion_date = $1))
              AND NOT EXISTS (
                  SELECT 1 FROM grievance_assignments f
                  WHERE f.grievance_id = a.grievance_id
                    AND f.assignee_email = a.assignee_email
                    AND f.last_follow_up_at > now() - interval '24 hours'
              )
            ORDER BY a.estimated_completion_date ASC
            "#,
        )
        .bind(today)
        .bind(include_due_today)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_follow_up_sent(
        &self,
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE grievance_assignments
            SET status = 'follow_up_sent', last_follow_up_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Encerra todas as linhas emitidas com esse token.
    pub async fn complete_by_token(&self, token: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE grievance_assignments SET status = $2 WHERE update_token = $1",
        )
        .bind(token)
        .bind(AssignmentStatus::Completed)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
