//! Transactional free functions for the campaigns domain

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{Pledge, Reward};

/// Lock a reward row of `project_id` for the rest of the transaction.
///
/// Returns `None` if the reward does not exist or belongs to another project.
pub async fn lock_reward_tx(
    transaction: &mut Transaction<'_, Postgres>,
    reward_id: Uuid,
    project_id: Uuid,
) -> std::result::Result<Option<Reward>, sqlx::Error> {
    let reward = sqlx::query_as::<_, Reward>(
        r#"
        SELECT id, project_id, minimum, description, quantity, position, created_at
        FROM rewards
        WHERE id = $1 AND project_id = $2
        FOR UPDATE
        "#,
    )
    .bind(reward_id)
    .bind(project_id)
    .fetch_optional(&mut **transaction)
    .await?;
    Ok(reward)
}

/// Count every pledge claiming a reward, pending or completed.
pub async fn count_reward_pledges_tx(
    transaction: &mut Transaction<'_, Postgres>,
    reward_id: Uuid,
) -> std::result::Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pledges WHERE reward_id = $1")
        .bind(reward_id)
        .fetch_one(&mut **transaction)
        .await?;
    Ok(count)
}

/// Insert a pledge within an existing transaction.
pub async fn insert_pledge_tx(
    transaction: &mut Transaction<'_, Postgres>,
    pledge: &Pledge,
) -> std::result::Result<Pledge, sqlx::Error> {
    let created = sqlx::query_as::<_, Pledge>(
        r#"
        INSERT INTO pledges (id, project_id, reward_id, backer_id, amount, provider, status,
                             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, project_id, reward_id, backer_id, amount, provider, status,
                  created_at, updated_at
        "#,
    )
    .bind(pledge.id)
    .bind(pledge.project_id)
    .bind(pledge.reward_id)
    .bind(pledge.backer_id)
    .bind(pledge.amount)
    .bind(pledge.provider)
    .bind(pledge.status)
    .bind(pledge.created_at)
    .bind(pledge.updated_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}
