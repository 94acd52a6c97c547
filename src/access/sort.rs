use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::access::errors::AccessError;
use crate::access::types::EffectiveGrant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    UserName,
    UserEmail,
    UserRole,
    CourseTitle,
    Reason,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::UserName => "user_name",
            SortField::UserEmail => "user_email",
            SortField::UserRole => "user_role",
            SortField::CourseTitle => "course_title",
            SortField::Reason => "reason",
        }
    }

    /// Compare two rows on this field only.
    ///
    /// Free-text fields fold case; role and reason compare their raw value.
    pub fn compare(&self, a: &EffectiveGrant, b: &EffectiveGrant) -> Ordering {
        match self {
            SortField::UserName => cmp_ignore_case(&a.user_name, &b.user_name),
            SortField::UserEmail => cmp_ignore_case(&a.user_email, &b.user_email),
            SortField::CourseTitle => cmp_ignore_case(&a.course_title, &b.course_title),
            SortField::UserRole => a.user_role.as_str().cmp(b.user_role.as_str()),
            SortField::Reason => a.reason.as_str().cmp(b.reason.as_str()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_name" | "userName" => Ok(SortField::UserName),
            "user_email" | "userEmail" => Ok(SortField::UserEmail),
            "user_role" | "userRole" => Ok(SortField::UserRole),
            "course_title" | "courseTitle" => Ok(SortField::CourseTitle),
            "reason" => Ok(SortField::Reason),
            other => Err(AccessError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AccessError::UnknownSortDirection(other.to_string())),
        }
    }
}

/// The `(field, direction)` pair a presentation layer keeps between renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Next spec after the user asks to sort by `field`: the same field flips
    /// direction, a different field starts ascending.
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }

    pub fn compare(&self, a: &EffectiveGrant, b: &EffectiveGrant) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Stable sort in place. Rows equal on the sort field keep their input order
/// in both directions.
pub fn sort_grants(rows: &mut [&EffectiveGrant], spec: SortSpec) {
    rows.sort_by(|a, b| spec.compare(a, b));
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
