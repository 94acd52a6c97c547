use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::access::errors::AccessError;

pub type UserId = String;
pub type CourseId = String;
pub type GroupId = String;

/// Role attribute carried on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(AccessError::UnknownRole(other.to_string())),
        }
    }
}

/// The rule that justified an effective grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    AdminScope,
    TeacherAssigned,
    GroupMember,
}

impl Reason {
    pub const ALL: [Reason; 3] = [
        Reason::AdminScope,
        Reason::TeacherAssigned,
        Reason::GroupMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::AdminScope => "admin_scope",
            Reason::TeacherAssigned => "teacher_assigned",
            Reason::GroupMember => "group_member",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin_scope" => Ok(Reason::AdminScope),
            "teacher_assigned" => Ok(Reason::TeacherAssigned),
            "group_member" => Ok(Reason::GroupMember),
            other => Err(AccessError::UnknownReason(other.to_string())),
        }
    }
}

// ---------- Relation records ----------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub is_active: bool,
}

/// Many-to-many edge between a group and a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub user_id: UserId,
}

/// A stored authorization linking a course to either one group or one teacher.
///
/// Records arrive exactly as the record store holds them, so both targets
/// are optional here. Use [`AccessGrant::target`] to classify a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub course_id: CourseId,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub teacher_id: Option<UserId>,
}

/// Classification of an [`AccessGrant`] by which target it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantTarget<'a> {
    Group(&'a str),
    Teacher(&'a str),
    /// Neither target is set.
    Missing,
    /// Both targets are set.
    Ambiguous,
}

impl AccessGrant {
    pub fn for_group(course_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            group_id: Some(group_id.into()),
            teacher_id: None,
        }
    }

    pub fn for_teacher(course_id: impl Into<String>, teacher_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            group_id: None,
            teacher_id: Some(teacher_id.into()),
        }
    }

    pub fn target(&self) -> GrantTarget<'_> {
        match (self.group_id.as_deref(), self.teacher_id.as_deref()) {
            (Some(g), None) => GrantTarget::Group(g),
            (None, Some(t)) => GrantTarget::Teacher(t),
            (None, None) => GrantTarget::Missing,
            (Some(_), Some(_)) => GrantTarget::Ambiguous,
        }
    }
}

// ---------- Derived output ----------

/// One independent justification for a user seeing a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveGrant {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub user_role: Role,
    pub course_id: CourseId,
    pub course_title: String,
    pub reason: Reason,
    /// Only set for [`Reason::GroupMember`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_group_name: Option<String>,
}

impl EffectiveGrant {
    pub(crate) fn new(user: &User, course: &Course, reason: Reason) -> Self {
        Self {
            user_id: user.id.clone(),
            user_name: user.full_name.clone(),
            user_email: user.email.clone(),
            user_role: user.role,
            course_id: course.id.clone(),
            course_title: course.title.clone(),
            reason,
            via_group_name: None,
        }
    }

    pub(crate) fn via_group(mut self, group: &Group) -> Self {
        self.via_group_name = Some(group.name.clone());
        self
    }
}

/// Counters for rows dropped because of data-integrity problems.
///
/// Inactive users or groups are not anomalies; they are ordinary omissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Grants with neither a group nor a teacher.
    pub grants_without_target: usize,
    /// Grants with both a group and a teacher.
    pub grants_with_both_targets: usize,
    /// Grant pairs whose course is not in the snapshot.
    pub unknown_courses: usize,
    /// Teacher grants whose user is not in the snapshot.
    pub unknown_teachers: usize,
    /// Group grants whose group is not in the snapshot.
    pub unknown_groups: usize,
    /// Memberships of a granted group whose user is not in the snapshot.
    pub unknown_members: usize,
}

impl AnomalyReport {
    pub fn total(&self) -> usize {
        self.grants_without_target
            + self.grants_with_both_targets
            + self.unknown_courses
            + self.unknown_teachers
            + self.unknown_groups
            + self.unknown_members
    }

    pub fn merge(&mut self, other: &AnomalyReport) {
        self.grants_without_target += other.grants_without_target;
        self.grants_with_both_targets += other.grants_with_both_targets;
        self.unknown_courses += other.unknown_courses;
        self.unknown_teachers += other.unknown_teachers;
        self.unknown_groups += other.unknown_groups;
        self.unknown_members += other.unknown_members;
    }
}
