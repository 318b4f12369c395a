//! Repository implementations for the campaigns domain
//!
//! Each aggregate sits behind an async trait with a PostgreSQL
//! implementation. The `test-support` feature adds an in-memory store
//! that implements every trait, used by the integration tests.

pub mod backers;
pub mod categories;
pub mod pledges;
pub mod projects;
pub mod rewards;
pub mod transactions;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use std::sync::Arc;

use crowdfund_common::RepositoryError;
use sqlx::PgPool;

pub use backers::{BackerRepository, PgBackerRepository};
pub use categories::{CategoryRepository, PgCategoryRepository};
pub use pledges::{PgPledgeRepository, PledgeRepository, PledgeTotals, Reservation};
pub use projects::{PgProjectRepository, ProjectRepository};
pub use rewards::{PgRewardRepository, RewardRepository};
pub use transactions::{count_reward_pledges_tx, insert_pledge_tx, lock_reward_tx};

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Combined repository access for the campaigns domain
#[derive(Clone)]
pub struct CampaignRepositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub rewards: Arc<dyn RewardRepository>,
    pub backers: Arc<dyn BackerRepository>,
    pub pledges: Arc<dyn PledgeRepository>,
}

impl CampaignRepositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            projects: Arc::new(PgProjectRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            rewards: Arc::new(PgRewardRepository::new(pool.clone())),
            backers: Arc::new(PgBackerRepository::new(pool.clone())),
            pledges: Arc::new(PgPledgeRepository::new(pool)),
        }
    }

    /// All repositories backed by one shared in-memory store
    #[cfg(any(test, feature = "test-support"))]
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::InMemoryCampaigns::default());
        Self {
            projects: store.clone(),
            categories: store.clone(),
            rewards: store.clone(),
            backers: store.clone(),
            pledges: store,
        }
    }
}
