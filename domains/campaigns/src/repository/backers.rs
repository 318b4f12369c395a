//! Backer repository

use async_trait::async_trait;
use crowdfund_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Backer;

#[async_trait]
pub trait BackerRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Backer>>;

    async fn get_by_user(&self, user_id: Uuid) -> RepoResult<Option<Backer>>;

    /// Return the user's backer, inserting `candidate` if they have none.
    /// At most one backer ever exists per user.
    async fn get_or_create(&self, candidate: &Backer) -> RepoResult<Backer>;
}

#[derive(Clone)]
pub struct PgBackerRepository {
    pool: PgPool,
}

impl PgBackerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackerRepository for PgBackerRepository {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Backer>> {
        let backer = sqlx::query_as::<_, Backer>(
            "SELECT id, user_id, email, name, created_at FROM backers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(backer)
    }

    async fn get_by_user(&self, user_id: Uuid) -> RepoResult<Option<Backer>> {
        let backer = sqlx::query_as::<_, Backer>(
            "SELECT id, user_id, email, name, created_at FROM backers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(backer)
    }

    async fn get_or_create(&self, candidate: &Backer) -> RepoResult<Backer> {
        sqlx::query(
            r#"
            INSERT INTO backers (id, user_id, email, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(candidate.id)
        .bind(candidate.user_id)
        .bind(&candidate.email)
        .bind(&candidate.name)
        .bind(candidate.created_at)
        .execute(&self.pool)
        .await?;

        self.get_by_user(candidate.user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
