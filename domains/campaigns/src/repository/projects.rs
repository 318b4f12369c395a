//! Project repository

use async_trait::async_trait;
use chrono::NaiveDate;
use crowdfund_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Project;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Project>>;

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Project>>;

    /// Projects that have started by `today`, oldest first, optionally
    /// restricted to one category
    async fn list_started(
        &self,
        today: NaiveDate,
        category_id: Option<Uuid>,
    ) -> RepoResult<Vec<Project>>;

    /// Admin listing: title/slug search, latest end date first
    async fn search(&self, query: Option<&str>, offset: i64, limit: i64)
        -> RepoResult<Vec<Project>>;

    async fn create(&self, project: &Project) -> RepoResult<Project>;

    async fn update(&self, project: &Project) -> RepoResult<Project>;

    /// Deletes the project with its rewards and pledges
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, slug, goal, start_date, end_date, description,
                   category_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, slug, goal, start_date, end_date, description,
                   category_id, created_at, updated_at
            FROM projects
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_started(
        &self,
        today: NaiveDate,
        category_id: Option<Uuid>,
    ) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, slug, goal, start_date, end_date, description,
                   category_id, created_at, updated_at
            FROM projects
            WHERE start_date <= $1
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(today)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn search(
        &self,
        query: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, slug, goal, start_date, end_date, description,
                   category_id, created_at, updated_at
            FROM projects
            WHERE $1::text IS NULL
               OR title ILIKE '%' || $1 || '%'
               OR slug ILIKE '%' || $1 || '%'
            ORDER BY end_date DESC, created_at DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn create(&self, project: &Project) -> RepoResult<Project> {
        let created = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, title, slug, goal, start_date, end_date, description,
                                  category_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, title, slug, goal, start_date, end_date, description,
                      category_id, created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.slug)
        .bind(project.goal)
        .bind(project.start)
        .bind(project.end)
        .bind(&project.description)
        .bind(project.category_id)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(created)
    }

    async fn update(&self, project: &Project) -> RepoResult<Project> {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = $2, slug = $3, goal = $4, start_date = $5, end_date = $6,
                description = $7, category_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, slug, goal, start_date, end_date, description,
                      category_id, created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.slug)
        .bind(project.goal)
        .bind(project.start)
        .bind(project.end)
        .bind(&project.description)
        .bind(project.category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
