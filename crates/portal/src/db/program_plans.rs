//! Program plan step storage for `PostgreSQL`.
//!
//! A plan is a header row in `portal.program_plan` plus one row per saved
//! step in `portal.program_plan_step`. Steps are upserted on
//! `(plan_id, step)`, so writing a step never touches its siblings. A new
//! plan is keyed on `(owner_id, creation_token)`, so submitting the same
//! create form twice yields one plan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use pengawas_core::{ProgramPlanId, UserId, WizardStep};

use super::{PlanSummary, PlanTarget, RepositoryError, StepStore};
use crate::models::StepData;

/// Repository for program plans and their steps.
#[derive(Clone)]
pub struct PgStepStore {
    pool: PgPool,
}

impl PgStepStore {
    /// Create a new step store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StepStore for PgStepStore {
    async fn load_step(
        &self,
        plan: ProgramPlanId,
        step: WizardStep,
    ) -> Result<Option<StepData>, RepositoryError> {
        let row: Option<(Json<StepData>,)> = sqlx::query_as(
            "SELECT data FROM portal.program_plan_step WHERE plan_id = $1 AND step = $2",
        )
        .bind(plan)
        .bind(step)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(data),)| data))
    }

    async fn save_step(
        &self,
        owner: UserId,
        plan: PlanTarget,
        step: WizardStep,
        data: &StepData,
    ) -> Result<ProgramPlanId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let plan_id: ProgramPlanId = match plan {
            PlanTarget::Existing(id) => {
                let touched: Option<(ProgramPlanId,)> = sqlx::query_as(
                    "UPDATE portal.program_plan SET updated_at = now() WHERE id = $1 RETURNING id",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
                touched.ok_or(RepositoryError::NotFound)?.0
            }
            PlanTarget::New { creation_token } => {
                // A resubmitted create form hits the conflict and gets the
                // plan its first submit made.
                let (id,): (ProgramPlanId,) = sqlx::query_as(
                    "INSERT INTO portal.program_plan (owner_id, creation_token)
                     VALUES ($1, $2)
                     ON CONFLICT (owner_id, creation_token)
                     DO UPDATE SET updated_at = now()
                     RETURNING id",
                )
                .bind(owner)
                .bind(creation_token)
                .fetch_one(&mut *tx)
                .await?;
                id
            }
        };

        sqlx::query(
            "INSERT INTO portal.program_plan_step (plan_id, step, data)
             VALUES ($1, $2, $3)
             ON CONFLICT (plan_id, step)
             DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        )
        .bind(plan_id)
        .bind(step)
        .bind(Json(data))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(plan_id)
    }

    async fn owner_of(&self, plan: ProgramPlanId) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> =
            sqlx::query_as("SELECT owner_id FROM portal.program_plan WHERE id = $1")
                .bind(plan)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(owner,)| owner))
    }

    async fn list_plans(&self, owner: UserId) -> Result<Vec<PlanSummary>, RepositoryError> {
        let rows: Vec<(ProgramPlanId, DateTime<Utc>, Vec<String>)> = sqlx::query_as(
            "SELECT p.id, p.updated_at,
                    coalesce(array_agg(s.step::text) FILTER (WHERE s.step IS NOT NULL), '{}')
             FROM portal.program_plan p
             LEFT JOIN portal.program_plan_step s ON s.plan_id = p.id
             WHERE p.owner_id = $1
             GROUP BY p.id, p.updated_at
             ORDER BY p.updated_at DESC, p.id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, updated_at, steps)| {
                let mut filled_steps = steps
                    .iter()
                    .map(|s| s.parse::<WizardStep>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
                filled_steps.sort();
                Ok(PlanSummary {
                    id,
                    filled_steps,
                    updated_at,
                })
            })
            .collect()
    }
}
