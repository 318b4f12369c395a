//! Pledge repository

use async_trait::async_trait;
use crowdfund_common::{Currency, RepositoryError};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::transactions::{count_reward_pledges_tx, insert_pledge_tx, lock_reward_tx};
use super::RepoResult;
use crate::domain::entities::{Pledge, PledgeStatus};

/// Outcome of reserving a pledge
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    Created(Pledge),
    /// The chosen reward is gone or all of its units are claimed
    RewardUnavailable,
}

/// Progress of a project, over completed pledges only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PledgeTotals {
    pub pledged: Currency,
    pub backers: i64,
}

#[async_trait]
pub trait PledgeRepository: Send + Sync {
    /// Insert a pledge. When it claims a reward, availability is checked
    /// atomically with the insert so concurrent reservations never exceed
    /// the reward's quantity.
    async fn reserve(&self, pledge: &Pledge) -> RepoResult<Reservation>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Pledge>>;

    /// Persist backer and status changes
    async fn update(&self, pledge: &Pledge) -> RepoResult<Pledge>;

    /// Newest first
    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Pledge>>;

    async fn totals(&self, project_id: Uuid) -> RepoResult<PledgeTotals>;
}

#[derive(Clone)]
pub struct PgPledgeRepository {
    pool: PgPool,
}

impl PgPledgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PledgeRepository for PgPledgeRepository {
    async fn reserve(&self, pledge: &Pledge) -> RepoResult<Reservation> {
        let mut transaction = self.pool.begin().await?;

        if let Some(reward_id) = pledge.reward_id {
            let reward = lock_reward_tx(&mut transaction, reward_id, pledge.project_id).await?;
            let available = match reward {
                Some(reward) => {
                    let pledged = count_reward_pledges_tx(&mut transaction, reward_id).await?;
                    reward.is_available(pledged)
                }
                None => false,
            };

            if !available {
                transaction.rollback().await?;
                tracing::info!(reward_id = %reward_id, "Reward no longer available");
                return Ok(Reservation::RewardUnavailable);
            }
        }

        let created = insert_pledge_tx(&mut transaction, pledge).await?;
        transaction.commit().await?;

        Ok(Reservation::Created(created))
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Pledge>> {
        let pledge = sqlx::query_as::<_, Pledge>(
            r#"
            SELECT id, project_id, reward_id, backer_id, amount, provider, status,
                   created_at, updated_at
            FROM pledges
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pledge)
    }

    async fn update(&self, pledge: &Pledge) -> RepoResult<Pledge> {
        let updated = sqlx::query_as::<_, Pledge>(
            r#"
            UPDATE pledges
            SET backer_id = $2, status = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, project_id, reward_id, backer_id, amount, provider, status,
                      created_at, updated_at
            "#,
        )
        .bind(pledge.id)
        .bind(pledge.backer_id)
        .bind(pledge.status)
        .bind(pledge.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Pledge>> {
        let pledges = sqlx::query_as::<_, Pledge>(
            r#"
            SELECT id, project_id, reward_id, backer_id, amount, provider, status,
                   created_at, updated_at
            FROM pledges
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pledges)
    }

    async fn totals(&self, project_id: Uuid) -> RepoResult<PledgeTotals> {
        let (pledged, backers): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0), COUNT(DISTINCT backer_id)
            FROM pledges
            WHERE project_id = $1 AND status = $2
            "#,
        )
        .bind(project_id)
        .bind(PledgeStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        let pledged = Currency::from_decimal(pledged)
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        Ok(PledgeTotals { pledged, backers })
    }
}
