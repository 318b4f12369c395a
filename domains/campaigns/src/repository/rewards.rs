//! Reward repository

use async_trait::async_trait;
use crowdfund_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::{Reward, RewardAvailability};

#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// Rewards of a project in display order
    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Reward>>;

    /// Rewards of a project with the number of pledges claiming each
    async fn availability(&self, project_id: Uuid) -> RepoResult<Vec<RewardAvailability>>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Reward>>;

    async fn create(&self, reward: &Reward) -> RepoResult<Reward>;

    async fn update(&self, reward: &Reward) -> RepoResult<Reward>;

    /// Pledges that claimed the reward keep existing without one
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgRewardRepository {
    pool: PgPool,
}

impl PgRewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for PgRewardRepository {
    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, project_id, minimum, description, quantity, position, created_at
            FROM rewards
            WHERE project_id = $1
            ORDER BY position ASC, minimum ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    async fn availability(&self, project_id: Uuid) -> RepoResult<Vec<RewardAvailability>> {
        let rows = sqlx::query_as::<_, RewardAvailability>(
            r#"
            SELECT r.id, r.project_id, r.minimum, r.description, r.quantity, r.position,
                   r.created_at, COUNT(p.id) AS pledged
            FROM rewards r
            LEFT JOIN pledges p ON p.reward_id = r.id
            WHERE r.project_id = $1
            GROUP BY r.id
            ORDER BY r.position ASC, r.minimum ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, project_id, minimum, description, quantity, position, created_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    async fn create(&self, reward: &Reward) -> RepoResult<Reward> {
        let created = sqlx::query_as::<_, Reward>(
            r#"
            INSERT INTO rewards (id, project_id, minimum, description, quantity, position, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, project_id, minimum, description, quantity, position, created_at
            "#,
        )
        .bind(reward.id)
        .bind(reward.project_id)
        .bind(reward.minimum)
        .bind(&reward.description)
        .bind(reward.quantity)
        .bind(reward.order)
        .bind(reward.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(created)
    }

    async fn update(&self, reward: &Reward) -> RepoResult<Reward> {
        let updated = sqlx::query_as::<_, Reward>(
            r#"
            UPDATE rewards
            SET minimum = $2, description = $3, quantity = $4, position = $5
            WHERE id = $1
            RETURNING id, project_id, minimum, description, quantity, position, created_at
            "#,
        )
        .bind(reward.id)
        .bind(reward.minimum)
        .bind(&reward.description)
        .bind(reward.quantity)
        .bind(reward.order)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
