//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types return
//! `Result<_, String>` so a corrupt row surfaces as a query error instead of
//! a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::UserAccount;
use crate::domain::{
    DisplayName, Group, GroupCapacity, GroupId, GroupName, GroupParts, GroupSet, GroupSetId,
    GroupSetName, GroupSetPolicy, NewGroupSet, PasswordDigest, Project, ProjectId,
    StaffAssignment, StaffRole, Tutorial, TutorialId, Unit, UnitDraft, UnitId, User, UserId,
    Username,
};

use super::schema::{
    group_memberships, group_sets, groups, projects, tutorials, unit_staff, units, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_digest: String,
}

impl UserRow {
    pub fn into_account(self) -> Result<UserAccount, String> {
        let username = Username::new(&self.username).map_err(|err| err.to_string())?;
        let display_name = DisplayName::new(&self.display_name).map_err(|err| err.to_string())?;
        Ok(UserAccount {
            user: User::new(UserId::from_uuid(self.id), username, display_name),
            password_digest: PasswordDigest::from_hex(self.password_digest),
        })
    }
}

/// Insertable struct for user accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub display_name: &'a str,
    pub password_digest: &'a str,
}

impl<'a> From<&'a UserAccount> for NewUserRow<'a> {
    fn from(account: &'a UserAccount) -> Self {
        Self {
            id: *account.user.id().as_uuid(),
            username: account.user.username().as_ref(),
            display_name: account.user.display_name().as_ref(),
            password_digest: account.password_digest.as_hex(),
        }
    }
}

// ---------------------------------------------------------------------------
// Units, staff, tutorials and projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UnitRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub main_convenor_id: Uuid,
}

impl UnitRow {
    pub fn from_domain(unit: &Unit) -> Self {
        Self {
            id: *unit.id().as_uuid(),
            code: unit.code().to_owned(),
            name: unit.name().to_owned(),
            main_convenor_id: *unit.main_convenor().as_uuid(),
        }
    }

    /// Rebuild the unit with the staff rows that belong to it.
    pub fn into_domain(self, staff: Vec<UnitStaffRow>) -> Result<Unit, String> {
        let staff = staff
            .into_iter()
            .map(|row| {
                let role: StaffRole = row.role.parse().map_err(|err| format!("{err}"))?;
                Ok(StaffAssignment {
                    user_id: UserId::from_uuid(row.user_id),
                    role,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        Unit::new(UnitDraft {
            id: UnitId::from_uuid(self.id),
            code: self.code,
            name: self.name,
            main_convenor: UserId::from_uuid(self.main_convenor_id),
            staff,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = unit_staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UnitStaffRow {
    pub unit_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

impl UnitStaffRow {
    pub fn for_unit(unit: &Unit) -> impl Iterator<Item = Self> + '_ {
        unit.staff().iter().map(|assignment| Self {
            unit_id: *unit.id().as_uuid(),
            user_id: *assignment.user_id.as_uuid(),
            role: assignment.role.as_str().to_owned(),
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tutorials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TutorialRow {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub abbreviation: String,
    pub tutor_id: Option<Uuid>,
}

impl From<&Tutorial> for TutorialRow {
    fn from(tutorial: &Tutorial) -> Self {
        Self {
            id: *tutorial.id.as_uuid(),
            unit_id: *tutorial.unit_id.as_uuid(),
            abbreviation: tutorial.abbreviation.clone(),
            tutor_id: tutorial.tutor.map(|id| *id.as_uuid()),
        }
    }
}

impl From<TutorialRow> for Tutorial {
    fn from(row: TutorialRow) -> Self {
        Self {
            id: TutorialId::from_uuid(row.id),
            unit_id: UnitId::from_uuid(row.unit_id),
            abbreviation: row.abbreviation,
            tutor: row.tutor_id.map(UserId::from_uuid),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub student_id: Uuid,
    pub tutorial_id: Option<Uuid>,
    pub enrolled: bool,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: *project.id.as_uuid(),
            unit_id: *project.unit_id.as_uuid(),
            student_id: *project.student.as_uuid(),
            tutorial_id: project.tutorial_id.map(|id| *id.as_uuid()),
            enrolled: project.enrolled,
        }
    }
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::from_uuid(row.id),
            unit_id: UnitId::from_uuid(row.unit_id),
            student: UserId::from_uuid(row.student_id),
            tutorial_id: row.tutorial_id.map(TutorialId::from_uuid),
            enrolled: row.enrolled,
        }
    }
}

// ---------------------------------------------------------------------------
// Group sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = group_sets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupSetRow {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub allow_students_to_create_groups: bool,
    pub allow_students_to_manage_groups: bool,
    pub keep_groups_in_same_class: bool,
    pub capacity: Option<i32>,
}

impl GroupSetRow {
    pub fn into_domain(self) -> Result<GroupSet, String> {
        let name = GroupSetName::new(&self.name).map_err(|err| err.to_string())?;
        let capacity = self
            .capacity
            .map(|raw| {
                let raw = u32::try_from(raw).map_err(|_| format!("negative capacity {raw}"))?;
                GroupCapacity::new(raw).map_err(|err| err.to_string())
            })
            .transpose()?;
        Ok(GroupSet::create(
            GroupSetId::from_uuid(self.id),
            UnitId::from_uuid(self.unit_id),
            NewGroupSet {
                name,
                policy: GroupSetPolicy {
                    allow_students_to_create_groups: self.allow_students_to_create_groups,
                    allow_students_to_manage_groups: self.allow_students_to_manage_groups,
                    keep_groups_in_same_class: self.keep_groups_in_same_class,
                },
                capacity,
            },
        ))
    }
}

fn capacity_for_db(capacity: Option<GroupCapacity>) -> Result<Option<i32>, String> {
    capacity
        .map(|cap| i32::try_from(cap.get()).map_err(|_| format!("capacity {} too large", cap.get())))
        .transpose()
}

/// Insertable struct for new group sets.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = group_sets)]
pub(crate) struct NewGroupSetRow<'a> {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: &'a str,
    pub name_key: String,
    pub allow_students_to_create_groups: bool,
    pub allow_students_to_manage_groups: bool,
    pub keep_groups_in_same_class: bool,
    pub capacity: Option<i32>,
}

impl<'a> NewGroupSetRow<'a> {
    pub fn from_domain(set: &'a GroupSet) -> Result<Self, String> {
        let policy = set.policy();
        Ok(Self {
            id: *set.id().as_uuid(),
            unit_id: *set.unit_id().as_uuid(),
            name: set.name().as_ref(),
            name_key: set.name().uniqueness_key(),
            allow_students_to_create_groups: policy.allow_students_to_create_groups,
            allow_students_to_manage_groups: policy.allow_students_to_manage_groups,
            keep_groups_in_same_class: policy.keep_groups_in_same_class,
            capacity: capacity_for_db(set.capacity())?,
        })
    }
}

/// Changeset for group set updates. `capacity` is written even when `None`
/// so clearing the cap persists.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = group_sets)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct GroupSetUpdateRow<'a> {
    pub name: &'a str,
    pub name_key: String,
    pub allow_students_to_create_groups: bool,
    pub allow_students_to_manage_groups: bool,
    pub keep_groups_in_same_class: bool,
    pub capacity: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> GroupSetUpdateRow<'a> {
    pub fn from_domain(set: &'a GroupSet) -> Result<Self, String> {
        let policy = set.policy();
        Ok(Self {
            name: set.name().as_ref(),
            name_key: set.name().uniqueness_key(),
            allow_students_to_create_groups: policy.allow_students_to_create_groups,
            allow_students_to_manage_groups: policy.allow_students_to_manage_groups,
            keep_groups_in_same_class: policy.keep_groups_in_same_class,
            capacity: capacity_for_db(set.capacity())?,
            updated_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Groups and memberships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupRow {
    pub id: Uuid,
    pub group_set_id: Uuid,
    pub tutorial_id: Uuid,
    pub name: String,
    pub number: i32,
    pub locked: bool,
    pub capacity_adjustment: i32,
}

impl GroupRow {
    pub fn into_domain(self) -> Result<Group, String> {
        let name = GroupName::new(&self.name).map_err(|err| err.to_string())?;
        let number = u32::try_from(self.number)
            .map_err(|_| format!("negative group number {}", self.number))?;
        Ok(Group::from_parts(GroupParts {
            id: GroupId::from_uuid(self.id),
            group_set_id: GroupSetId::from_uuid(self.group_set_id),
            tutorial_id: TutorialId::from_uuid(self.tutorial_id),
            name,
            number,
            locked: self.locked,
            capacity_adjustment: self.capacity_adjustment,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = groups)]
pub(crate) struct NewGroupRow<'a> {
    pub id: Uuid,
    pub group_set_id: Uuid,
    pub tutorial_id: Uuid,
    pub name: &'a str,
    pub name_key: String,
    pub number: i32,
    pub locked: bool,
    pub capacity_adjustment: i32,
}

impl<'a> NewGroupRow<'a> {
    pub fn from_domain(group: &'a Group) -> Result<Self, String> {
        Ok(Self {
            id: *group.id().as_uuid(),
            group_set_id: *group.group_set_id().as_uuid(),
            tutorial_id: *group.tutorial_id().as_uuid(),
            name: group.name().as_ref(),
            name_key: group.name().uniqueness_key(),
            number: number_for_db(group.number())?,
            locked: group.is_locked(),
            capacity_adjustment: group.capacity_adjustment(),
        })
    }
}

/// Changeset for the mutable columns of a group.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = groups)]
pub(crate) struct GroupUpdateRow<'a> {
    pub tutorial_id: Uuid,
    pub name: &'a str,
    pub name_key: String,
    pub locked: bool,
    pub capacity_adjustment: i32,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Group> for GroupUpdateRow<'a> {
    fn from(group: &'a Group) -> Self {
        Self {
            tutorial_id: *group.tutorial_id().as_uuid(),
            name: group.name().as_ref(),
            name_key: group.name().uniqueness_key(),
            locked: group.is_locked(),
            capacity_adjustment: group.capacity_adjustment(),
            updated_at: Utc::now(),
        }
    }
}

pub(crate) fn number_for_db(number: u32) -> Result<i32, String> {
    i32::try_from(number).map_err(|_| format!("group number {number} out of range"))
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = group_memberships)]
pub(crate) struct NewMembershipRow {
    pub group_set_id: Uuid,
    pub project_id: Uuid,
    pub group_id: Uuid,
}
