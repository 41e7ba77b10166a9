//! In-process adapter for every repository port.
//!
//! State lives behind one `tokio::sync::RwLock`, so each port call observes
//! and mutates a consistent snapshot. Nothing survives a restart; this store
//! backs local development without a database and the HTTP and behaviour
//! tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{
    GroupRepository, GroupRepositoryError, GroupSetRepository, GroupSetRepositoryError,
    RosterSeed, RosterSeedRepository, RosterSeedRepositoryError, SeedingResult, UnitRepository,
    UnitRepositoryError, UserAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Group, GroupDraft, GroupId, GroupSet, GroupSetId, GroupSummary, Project, ProjectId, Tutorial,
    TutorialId, Unit, UnitId, User, UserId, Username,
};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<UserId, UserAccount>,
    units: HashMap<UnitId, Unit>,
    tutorials: HashMap<TutorialId, Tutorial>,
    projects: HashMap<ProjectId, Project>,
    group_sets: HashMap<GroupSetId, GroupSet>,
    groups: HashMap<GroupId, Group>,
    /// One entry per (group set, project); the key enforces a single group
    /// per set.
    memberships: HashMap<(GroupSetId, ProjectId), GroupId>,
}

impl State {
    fn member_count(&self, group_id: GroupId) -> usize {
        self.memberships
            .values()
            .filter(|member_of| **member_of == group_id)
            .count()
    }

    fn summary(&self, group: &Group) -> GroupSummary {
        GroupSummary {
            group: group.clone(),
            member_count: self.member_count(group.id()),
        }
    }

    fn summaries<'a>(&self, groups: impl Iterator<Item = &'a Group>) -> Vec<GroupSummary> {
        let mut listed: Vec<_> = groups.map(|group| self.summary(group)).collect();
        listed.sort_by_key(|s| (s.group.group_set_id(), s.group.number()));
        listed
    }

    fn group_set_name_taken(&self, candidate: &GroupSet) -> bool {
        let key = candidate.name().uniqueness_key();
        self.group_sets.values().any(|existing| {
            existing.id() != candidate.id()
                && existing.unit_id() == candidate.unit_id()
                && existing.name().uniqueness_key() == key
        })
    }

    fn group_name_taken(&self, group_set_id: GroupSetId, id: GroupId, key: &str) -> bool {
        self.groups.values().any(|existing| {
            existing.id() != id
                && existing.group_set_id() == group_set_id
                && existing.name().uniqueness_key() == key
        })
    }

    fn remove_group(&mut self, id: GroupId) -> bool {
        self.memberships.retain(|_, member_of| *member_of != id);
        self.groups.remove(&id).is_some()
    }
}

/// Thread-safe in-memory store implementing all repository ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitRepository for InMemoryStore {
    async fn find_unit(&self, unit_id: &UnitId) -> Result<Option<Unit>, UnitRepositoryError> {
        Ok(self.state.read().await.units.get(unit_id).cloned())
    }

    async fn find_tutorial(
        &self,
        tutorial_id: &TutorialId,
    ) -> Result<Option<Tutorial>, UnitRepositoryError> {
        Ok(self.state.read().await.tutorials.get(tutorial_id).cloned())
    }

    async fn find_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Project>, UnitRepositoryError> {
        Ok(self.state.read().await.projects.get(project_id).cloned())
    }

    async fn find_project_for_student(
        &self,
        unit_id: &UnitId,
        student: &UserId,
    ) -> Result<Option<Project>, UnitRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|p| p.unit_id == *unit_id && p.student == *student)
            .cloned())
    }
}

#[async_trait]
impl GroupSetRepository for InMemoryStore {
    async fn list_for_unit(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<GroupSet>, GroupSetRepositoryError> {
        let state = self.state.read().await;
        let mut listed: Vec<_> = state
            .group_sets
            .values()
            .filter(|set| set.unit_id() == *unit_id)
            .cloned()
            .collect();
        listed.sort_by_key(|set| set.name().uniqueness_key());
        Ok(listed)
    }

    async fn find(&self, id: &GroupSetId) -> Result<Option<GroupSet>, GroupSetRepositoryError> {
        Ok(self.state.read().await.group_sets.get(id).cloned())
    }

    async fn insert(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError> {
        let mut state = self.state.write().await;
        if state.group_set_name_taken(group_set) {
            return Err(GroupSetRepositoryError::duplicate_name(
                group_set.name().as_ref(),
            ));
        }
        state.group_sets.insert(group_set.id(), group_set.clone());
        Ok(())
    }

    async fn update(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError> {
        let mut state = self.state.write().await;
        if !state.group_sets.contains_key(&group_set.id()) {
            return Err(GroupSetRepositoryError::query(format!(
                "group set {} does not exist",
                group_set.id()
            )));
        }
        if state.group_set_name_taken(group_set) {
            return Err(GroupSetRepositoryError::duplicate_name(
                group_set.name().as_ref(),
            ));
        }
        state.group_sets.insert(group_set.id(), group_set.clone());
        Ok(())
    }

    async fn delete(&self, id: &GroupSetId) -> Result<bool, GroupSetRepositoryError> {
        let mut state = self.state.write().await;
        if state.group_sets.remove(id).is_none() {
            return Ok(false);
        }
        let doomed: Vec<_> = state
            .groups
            .values()
            .filter(|group| group.group_set_id() == *id)
            .map(Group::id)
            .collect();
        for group_id in doomed {
            state.remove_group(group_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn list_for_group_set(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
        let state = self.state.read().await;
        Ok(state.summaries(
            state
                .groups
                .values()
                .filter(|group| group.group_set_id() == *group_set_id),
        ))
    }

    async fn list_for_unit(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
        let state = self.state.read().await;
        Ok(state.summaries(state.groups.values().filter(|group| {
            state
                .group_sets
                .get(&group.group_set_id())
                .is_some_and(|set| set.unit_id() == *unit_id)
        })))
    }

    async fn find(&self, id: &GroupId) -> Result<Option<GroupSummary>, GroupRepositoryError> {
        let state = self.state.read().await;
        Ok(state.groups.get(id).map(|group| state.summary(group)))
    }

    async fn create(
        &self,
        draft: GroupDraft,
        first_member: Option<ProjectId>,
    ) -> Result<Group, GroupRepositoryError> {
        let mut state = self.state.write().await;
        let group_set_id = draft.group_set_id();
        if state.group_name_taken(group_set_id, draft.id(), &draft.name().uniqueness_key()) {
            return Err(GroupRepositoryError::duplicate_name(draft.name().as_ref()));
        }
        if let Some(project_id) = first_member
            && state.memberships.contains_key(&(group_set_id, project_id))
        {
            return Err(GroupRepositoryError::already_in_group_set(project_id));
        }
        let number = state
            .groups
            .values()
            .filter(|group| group.group_set_id() == group_set_id)
            .map(Group::number)
            .max()
            .unwrap_or(0)
            + 1;
        let group = draft
            .into_group(number)
            .map_err(|err| GroupRepositoryError::query(err.to_string()))?;
        state.groups.insert(group.id(), group.clone());
        if let Some(project_id) = first_member {
            state
                .memberships
                .insert((group_set_id, project_id), group.id());
        }
        Ok(group)
    }

    async fn update(&self, group: &Group) -> Result<(), GroupRepositoryError> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&group.id()) {
            return Err(GroupRepositoryError::query(format!(
                "group {} does not exist",
                group.id()
            )));
        }
        if state.group_name_taken(group.group_set_id(), group.id(), &group.name().uniqueness_key())
        {
            return Err(GroupRepositoryError::duplicate_name(group.name().as_ref()));
        }
        state.groups.insert(group.id(), group.clone());
        Ok(())
    }

    async fn delete(&self, id: &GroupId) -> Result<bool, GroupRepositoryError> {
        Ok(self.state.write().await.remove_group(*id))
    }

    async fn members(&self, id: &GroupId) -> Result<Vec<ProjectId>, GroupRepositoryError> {
        let state = self.state.read().await;
        let mut members: Vec<_> = state
            .memberships
            .iter()
            .filter(|(_, member_of)| **member_of == *id)
            .map(|((_, project_id), _)| *project_id)
            .collect();
        members.sort();
        Ok(members)
    }

    async fn group_of_project(
        &self,
        group_set_id: &GroupSetId,
        project_id: &ProjectId,
    ) -> Result<Option<GroupId>, GroupRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(&(*group_set_id, *project_id))
            .copied())
    }

    async fn add_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<(), GroupRepositoryError> {
        let mut state = self.state.write().await;
        let group_set_id = state
            .groups
            .get(id)
            .map(Group::group_set_id)
            .ok_or_else(|| GroupRepositoryError::query(format!("group {id} does not exist")))?;
        let key = (group_set_id, *project_id);
        if state.memberships.contains_key(&key) {
            return Err(GroupRepositoryError::already_in_group_set(*project_id));
        }
        state.memberships.insert(key, *id);
        Ok(())
    }

    async fn remove_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<bool, GroupRepositoryError> {
        let mut state = self.state.write().await;
        let Some(group_set_id) = state.groups.get(id).map(Group::group_set_id) else {
            return Ok(false);
        };
        let key = (group_set_id, *project_id);
        if state.memberships.get(&key) != Some(id) {
            return Ok(false);
        }
        state.memberships.remove(&key);
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        state.accounts.insert(account.user.id(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(id).map(|account| account.user.clone()))
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.user.username() == username)
            .cloned())
    }
}

#[async_trait]
impl RosterSeedRepository for InMemoryStore {
    async fn seed_roster(
        &self,
        seed: RosterSeed,
    ) -> Result<SeedingResult, RosterSeedRepositoryError> {
        let mut state = self.state.write().await;
        if !seed.units.is_empty() && seed.units.iter().all(|u| state.units.contains_key(&u.id())) {
            return Ok(SeedingResult::AlreadySeeded);
        }
        let RosterSeed {
            accounts,
            units,
            tutorials,
            projects,
        } = seed;
        state
            .accounts
            .extend(accounts.into_iter().map(|a| (a.user.id(), a)));
        state.units.extend(units.into_iter().map(|u| (u.id(), u)));
        state
            .tutorials
            .extend(tutorials.into_iter().map(|t| (t.id, t)));
        state
            .projects
            .extend(projects.into_iter().map(|p| (p.id, p)));
        Ok(SeedingResult::Applied)
    }
}
