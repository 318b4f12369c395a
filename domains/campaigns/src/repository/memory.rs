//! In-memory implementation of every campaigns repository
//!
//! Mirrors the PostgreSQL constraints the handlers rely on: unique slugs,
//! one backer per user, cascading project deletes, and reward reservation
//! checked under the same lock as the insert.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use crowdfund_common::{Currency, RepositoryError};
use uuid::Uuid;

use super::{
    BackerRepository, CategoryRepository, PledgeRepository, PledgeTotals, ProjectRepository,
    RepoResult, Reservation, RewardRepository,
};
use crate::domain::entities::{
    Backer, Category, Pledge, PledgeStatus, Project, Reward, RewardAvailability,
};

#[derive(Debug, Default)]
struct Tables {
    projects: Vec<Project>,
    categories: Vec<Category>,
    rewards: Vec<Reward>,
    backers: Vec<Backer>,
    pledges: Vec<Pledge>,
}

impl Tables {
    fn pledges_for_reward(&self, reward_id: Uuid) -> i64 {
        self.pledges
            .iter()
            .filter(|p| p.reward_id == Some(reward_id))
            .count() as i64
    }

    fn sorted_rewards(&self, project_id: Uuid) -> Vec<Reward> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        rewards.sort_by(|a, b| a.order.cmp(&b.order).then(a.minimum.cmp(&b.minimum)));
        rewards
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCampaigns {
    tables: Mutex<Tables>,
}

impl InMemoryCampaigns {
    // The lock is never held across an await.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryCampaigns {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        Ok(self.tables().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Project>> {
        Ok(self
            .tables()
            .projects
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn list_started(
        &self,
        today: NaiveDate,
        category_id: Option<Uuid>,
    ) -> RepoResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .tables()
            .projects
            .iter()
            .filter(|p| p.has_started(today))
            .filter(|p| category_id.is_none() || p.category_id == category_id)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn search(
        &self,
        query: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<Project>> {
        let needle = query.map(str::to_lowercase);
        let mut projects: Vec<Project> = self
            .tables()
            .projects
            .iter()
            .filter(|p| match &needle {
                Some(needle) => {
                    p.title.to_lowercase().contains(needle) || p.slug.contains(needle.as_str())
                }
                None => true,
            })
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.end.cmp(&a.end).then(b.created_at.cmp(&a.created_at)));

        Ok(projects
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create(&self, project: &Project) -> RepoResult<Project> {
        let mut tables = self.tables();
        if tables.projects.iter().any(|p| p.slug == project.slug) {
            return Err(RepositoryError::AlreadyExists);
        }
        tables.projects.push(project.clone());
        Ok(project.clone())
    }

    async fn update(&self, project: &Project) -> RepoResult<Project> {
        let mut tables = self.tables();
        if tables
            .projects
            .iter()
            .any(|p| p.slug == project.slug && p.id != project.id)
        {
            return Err(RepositoryError::AlreadyExists);
        }

        let existing = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = Project {
            updated_at: Utc::now(),
            ..project.clone()
        };
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables();
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Ok(false);
        }
        tables.rewards.retain(|r| r.project_id != id);
        tables.pledges.retain(|p| p.project_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCampaigns {
    async fn list(&self) -> RepoResult<Vec<Category>> {
        let mut categories = self.tables().categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self
            .tables()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .tables()
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn create(&self, category: &Category) -> RepoResult<Category> {
        let mut tables = self.tables();
        if tables.categories.iter().any(|c| c.slug == category.slug) {
            return Err(RepositoryError::AlreadyExists);
        }
        tables.categories.push(category.clone());
        Ok(category.clone())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Ok(false);
        }
        for project in tables.projects.iter_mut() {
            if project.category_id == Some(id) {
                project.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl RewardRepository for InMemoryCampaigns {
    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Reward>> {
        Ok(self.tables().sorted_rewards(project_id))
    }

    async fn availability(&self, project_id: Uuid) -> RepoResult<Vec<RewardAvailability>> {
        let tables = self.tables();
        Ok(tables
            .sorted_rewards(project_id)
            .into_iter()
            .map(|reward| RewardAvailability {
                pledged: tables.pledges_for_reward(reward.id),
                reward,
            })
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Reward>> {
        Ok(self.tables().rewards.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, reward: &Reward) -> RepoResult<Reward> {
        let mut tables = self.tables();
        if !tables.projects.iter().any(|p| p.id == reward.project_id) {
            return Err(RepositoryError::InvalidData(
                "Reward references an unknown project".to_string(),
            ));
        }
        tables.rewards.push(reward.clone());
        Ok(reward.clone())
    }

    async fn update(&self, reward: &Reward) -> RepoResult<Reward> {
        let mut tables = self.tables();
        let existing = tables
            .rewards
            .iter_mut()
            .find(|r| r.id == reward.id)
            .ok_or(RepositoryError::NotFound)?;
        existing.minimum = reward.minimum;
        existing.description = reward.description.clone();
        existing.quantity = reward.quantity;
        existing.order = reward.order;
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables();
        let before = tables.rewards.len();
        tables.rewards.retain(|r| r.id != id);
        if tables.rewards.len() == before {
            return Ok(false);
        }
        for pledge in tables.pledges.iter_mut() {
            if pledge.reward_id == Some(id) {
                pledge.reward_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl BackerRepository for InMemoryCampaigns {
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Backer>> {
        Ok(self.tables().backers.iter().find(|b| b.id == id).cloned())
    }

    async fn get_by_user(&self, user_id: Uuid) -> RepoResult<Option<Backer>> {
        Ok(self
            .tables()
            .backers
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    async fn get_or_create(&self, candidate: &Backer) -> RepoResult<Backer> {
        let mut tables = self.tables();
        if let Some(existing) = tables
            .backers
            .iter()
            .find(|b| b.user_id == candidate.user_id)
        {
            return Ok(existing.clone());
        }
        tables.backers.push(candidate.clone());
        Ok(candidate.clone())
    }
}

#[async_trait]
impl PledgeRepository for InMemoryCampaigns {
    async fn reserve(&self, pledge: &Pledge) -> RepoResult<Reservation> {
        let mut tables = self.tables();

        if let Some(reward_id) = pledge.reward_id {
            let available = tables
                .rewards
                .iter()
                .find(|r| r.id == reward_id && r.project_id == pledge.project_id)
                .is_some_and(|reward| reward.is_available(tables.pledges_for_reward(reward_id)));
            if !available {
                return Ok(Reservation::RewardUnavailable);
            }
        }

        tables.pledges.push(pledge.clone());
        Ok(Reservation::Created(pledge.clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Pledge>> {
        Ok(self.tables().pledges.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, pledge: &Pledge) -> RepoResult<Pledge> {
        let mut tables = self.tables();
        let existing = tables
            .pledges
            .iter_mut()
            .find(|p| p.id == pledge.id)
            .ok_or(RepositoryError::NotFound)?;
        existing.backer_id = pledge.backer_id;
        existing.status = pledge.status;
        existing.updated_at = pledge.updated_at;
        Ok(existing.clone())
    }

    async fn list_for_project(&self, project_id: Uuid) -> RepoResult<Vec<Pledge>> {
        let mut pledges: Vec<Pledge> = self
            .tables()
            .pledges
            .iter()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect();
        pledges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pledges)
    }

    async fn totals(&self, project_id: Uuid) -> RepoResult<PledgeTotals> {
        let tables = self.tables();
        let completed: Vec<&Pledge> = tables
            .pledges
            .iter()
            .filter(|p| p.project_id == project_id && p.status == PledgeStatus::Completed)
            .collect();

        let backers: HashSet<Uuid> = completed.iter().filter_map(|p| p.backer_id).collect();

        Ok(PledgeTotals {
            pledged: completed.iter().map(|p| p.amount).sum::<Currency>(),
            backers: backers.len() as i64,
        })
    }
}
