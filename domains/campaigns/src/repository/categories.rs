//! Category repository

use async_trait::async_trait;
use crowdfund_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Category;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories by title
    async fn list(&self) -> RepoResult<Vec<Category>>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Category>>;

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;

    async fn create(&self, category: &Category) -> RepoResult<Category>;

    /// Projects in the category keep existing, uncategorized
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, title, slug, created_at FROM categories ORDER BY title ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, slug, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, slug, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn create(&self, category: &Category) -> RepoResult<Category> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, title, slug, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, created_at
            "#,
        )
        .bind(category.id)
        .bind(&category.title)
        .bind(&category.slug)
        .bind(category.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
