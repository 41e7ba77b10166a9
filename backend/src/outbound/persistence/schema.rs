//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Login accounts.
    users (id) {
        id -> Uuid,
        /// Lowercased login handle; unique.
        username -> Varchar,
        display_name -> Varchar,
        /// Hex SHA-256 digest of username and password.
        password_digest -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    units (id) {
        id -> Uuid,
        code -> Varchar,
        name -> Text,
        main_convenor_id -> Uuid,
    }
}

diesel::table! {
    /// Convenor and tutor assignments per unit.
    unit_staff (unit_id, user_id, role) {
        unit_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
    }
}

diesel::table! {
    tutorials (id) {
        id -> Uuid,
        unit_id -> Uuid,
        abbreviation -> Varchar,
        tutor_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    /// Student enrollments.
    projects (id) {
        id -> Uuid,
        unit_id -> Uuid,
        student_id -> Uuid,
        tutorial_id -> Nullable<Uuid>,
        enrolled -> Bool,
    }
}

diesel::table! {
    group_sets (id) {
        id -> Uuid,
        unit_id -> Uuid,
        name -> Varchar,
        /// Lowercased name backing the per-unit uniqueness constraint.
        name_key -> Text,
        allow_students_to_create_groups -> Bool,
        allow_students_to_manage_groups -> Bool,
        keep_groups_in_same_class -> Bool,
        capacity -> Nullable<Int4>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    groups (id) {
        id -> Uuid,
        group_set_id -> Uuid,
        tutorial_id -> Uuid,
        name -> Varchar,
        name_key -> Text,
        /// Sequential within the group set, starting at 1.
        number -> Int4,
        locked -> Bool,
        capacity_adjustment -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Keyed by (group set, project) so a project joins at most one group
    /// per set.
    group_memberships (group_set_id, project_id) {
        group_set_id -> Uuid,
        project_id -> Uuid,
        group_id -> Uuid,
        joined_at -> Timestamptz,
    }
}

diesel::joinable!(groups -> group_sets (group_set_id));
diesel::joinable!(group_memberships -> groups (group_id));
diesel::joinable!(unit_staff -> units (unit_id));
diesel::joinable!(tutorials -> units (unit_id));
diesel::joinable!(projects -> units (unit_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    units,
    unit_staff,
    tutorials,
    projects,
    group_sets,
    groups,
    group_memberships,
);
