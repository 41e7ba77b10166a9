//! Role derivation and authorization rules for group sets and groups.
//!
//! Roles are never stored. [`Actor::resolve`] derives one from the unit's
//! staff roster and the caller's enrollment, and every rule below is a pure
//! function of that actor and the resources it touches. Handlers and services
//! call a rule, then [`authorize`] to turn a denial into a `Forbidden` error
//! before any validation or persistence happens.

use serde::Serialize;
use serde_json::json;

use super::error::Error;
use super::group::Group;
use super::group_set::GroupSet;
use super::ids::{ProjectId, UnitId, UserId};
use super::unit::{Project, StaffRole, Unit};

/// Relationship between a user and a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Convenor,
    Tutor,
    Student,
    Outsider,
}

impl UnitRole {
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Convenor | Self::Tutor)
    }
}

/// The authenticated user as seen from one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    unit_id: UnitId,
    role: UnitRole,
    project: Option<Project>,
}

impl Actor {
    /// Derive the actor's role on `unit`.
    ///
    /// Staff roles win over enrollment. `project` only counts when it is an
    /// enrolled project of this unit owned by `user_id`.
    ///
    /// # Examples
    /// ```
    /// use groups_backend::domain::{Actor, Unit, UnitDraft, UnitId, UnitRole, UserId};
    ///
    /// let convenor = UserId::random();
    /// let unit = Unit::new(UnitDraft {
    ///     id: UnitId::random(),
    ///     code: "FIT1045".into(),
    ///     name: "Algorithms".into(),
    ///     main_convenor: convenor,
    ///     staff: Vec::new(),
    /// })
    /// .expect("valid unit");
    ///
    /// assert_eq!(Actor::resolve(convenor, &unit, None).role(), UnitRole::Convenor);
    /// assert_eq!(Actor::resolve(UserId::random(), &unit, None).role(), UnitRole::Outsider);
    /// ```
    pub fn resolve(user_id: UserId, unit: &Unit, project: Option<Project>) -> Self {
        let project =
            project.filter(|p| p.student == user_id && p.is_active_in(unit.id()));
        let role = match unit.staff_role_of(user_id) {
            Some(StaffRole::Convenor) => UnitRole::Convenor,
            Some(StaffRole::Tutor) => UnitRole::Tutor,
            None if project.is_some() => UnitRole::Student,
            None => UnitRole::Outsider,
        };
        Self {
            user_id,
            unit_id: unit.id(),
            role,
            project,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn role(&self) -> UnitRole {
        self.role
    }

    /// Enrollment backing a student actor.
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_convenor(&self) -> bool {
        self.role == UnitRole::Convenor
    }

    pub fn is_student(&self) -> bool {
        self.role == UnitRole::Student
    }

    fn owns_project(&self, project_id: ProjectId) -> bool {
        self.project.as_ref().is_some_and(|p| p.id == project_id)
    }
}

/// Actions reported in `Forbidden` errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    ViewGroupSets,
    CreateGroupSet,
    UpdateGroupSet,
    DeleteGroupSet,
    ListGroups,
    ViewGroup,
    CreateGroup,
    RenameGroup,
    ChangeGroupTutorial,
    AdjustGroupCapacity,
    UpdateGroupLock,
    DeleteGroup,
    ManageMembers,
}

impl GroupAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewGroupSets => "view_group_sets",
            Self::CreateGroupSet => "create_group_set",
            Self::UpdateGroupSet => "update_group_set",
            Self::DeleteGroupSet => "delete_group_set",
            Self::ListGroups => "list_groups",
            Self::ViewGroup => "view_group",
            Self::CreateGroup => "create_group",
            Self::RenameGroup => "rename_group",
            Self::ChangeGroupTutorial => "change_group_tutorial",
            Self::AdjustGroupCapacity => "adjust_group_capacity",
            Self::UpdateGroupLock => "update_group_lock",
            Self::DeleteGroup => "delete_group",
            Self::ManageMembers => "manage_members",
        }
    }
}

/// Turn a rule outcome into a domain result.
pub fn authorize(allowed: bool, actor: &Actor, action: GroupAction) -> Result<(), Error> {
    if allowed {
        return Ok(());
    }
    tracing::debug!(
        user_id = %actor.user_id(),
        unit_id = %actor.unit_id(),
        role = ?actor.role(),
        action = action.as_str(),
        "authorization denied"
    );
    Err(Error::forbidden("not authorised to perform this action")
        .with_details(json!({ "action": action.as_str() })))
}

/// Convenors only.
pub fn can_create_group_set(actor: &Actor) -> bool {
    actor.is_convenor()
}

/// Staff, or students when the set allows self-service creation.
pub fn can_create_group(actor: &Actor, group_set: &GroupSet) -> bool {
    actor.is_staff() || (actor.is_student() && group_set.allows_students_to_create_groups())
}

/// Staff only. Students are denied even when they belong to a group.
pub fn can_list_groups(actor: &Actor) -> bool {
    actor.is_staff()
}

/// Staff only, whatever `allow_students_to_manage_groups` says.
pub fn can_update_group_lock(actor: &Actor) -> bool {
    actor.is_staff()
}

pub fn can_view_group_sets(actor: &Actor) -> bool {
    actor.is_staff() || actor.is_student()
}

pub fn can_update_group_set(actor: &Actor) -> bool {
    actor.is_convenor()
}

pub fn can_delete_group_set(actor: &Actor) -> bool {
    actor.is_convenor()
}

/// Staff, or a student member of the group.
pub fn can_view_group(actor: &Actor, is_member: bool) -> bool {
    actor.is_staff() || (actor.is_student() && is_member)
}

/// Staff; or a student member of an unlocked group in a set that allows
/// students to manage their groups.
pub fn can_manage_group(
    actor: &Actor,
    group_set: &GroupSet,
    group: &Group,
    is_member: bool,
) -> bool {
    actor.is_staff() || (is_member && student_self_service(actor, group_set, group))
}

/// Staff may move any project. Students may only move their own, and only
/// under the same conditions as [`can_manage_group`] minus membership.
pub fn can_change_membership(
    actor: &Actor,
    group_set: &GroupSet,
    group: &Group,
    project_id: ProjectId,
) -> bool {
    actor.is_staff()
        || (actor.owns_project(project_id) && student_self_service(actor, group_set, group))
}

pub fn can_change_group_tutorial(actor: &Actor) -> bool {
    actor.is_staff()
}

pub fn can_adjust_capacity(actor: &Actor) -> bool {
    actor.is_staff()
}

pub fn can_delete_group(actor: &Actor) -> bool {
    actor.is_staff()
}

fn student_self_service(actor: &Actor, group_set: &GroupSet, group: &Group) -> bool {
    actor.is_student() && group_set.allows_students_to_manage_groups() && !group.is_locked()
}
