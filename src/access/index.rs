use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::access::snapshot::Snapshot;
use crate::access::types::*;

/// Records that can be looked up by primary id.
pub trait Record {
    fn id(&self) -> &str;
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Course {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Group {
    fn id(&self) -> &str {
        &self.id
    }
}

/// id -> record lookup over a shared relation slice.
#[derive(Debug, Clone)]
pub struct RecordIndex<T> {
    records: Arc<[T]>,
    by_id: HashMap<String, usize>,
}

impl<T: Record> RecordIndex<T> {
    pub fn build(records: &Arc<[T]>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            // Last occurrence wins, matching SnapshotBuilder semantics.
            by_id.insert(record.id().to_string(), pos);
        }
        Self {
            records: records.clone(),
            by_id,
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    /// Records unique by id, in slice order. A repeated id yields only the
    /// occurrence `get` would return.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records
            .iter()
            .enumerate()
            .filter(|(pos, record)| self.by_id.get(record.id()) == Some(pos))
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// group -> set of member user ids. Inactive users are not filtered here.
#[derive(Debug, Clone, Default)]
pub struct MemberIndex {
    group_members: BTreeMap<GroupId, BTreeSet<UserId>>,
}

impl MemberIndex {
    pub fn build(memberships: &[GroupMembership]) -> Self {
        let mut group_members: BTreeMap<GroupId, BTreeSet<UserId>> = BTreeMap::new();
        for m in memberships {
            group_members
                .entry(m.group_id.clone())
                .or_default()
                .insert(m.user_id.clone());
        }
        Self { group_members }
    }

    /// Members of `group_id`, empty if the group has no memberships.
    pub fn members_of(&self, group_id: &str) -> impl Iterator<Item = &str> {
        self.group_members
            .get(group_id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

/// Per-course teacher sets and group lists derived from access grants.
#[derive(Debug, Clone, Default)]
pub struct GrantIndex {
    /// course -> teachers assigned through grants (a set, so duplicates collapse)
    teachers_by_course: BTreeMap<CourseId, BTreeSet<UserId>>,
    /// course -> groups granted, in grant order (a list, duplicates preserved)
    groups_by_course: BTreeMap<CourseId, Vec<GroupId>>,
    /// Malformed grants skipped while building.
    ignored: AnomalyReport,
}

impl GrantIndex {
    pub fn build(grants: &[AccessGrant]) -> Self {
        let mut index = Self::default();
        for grant in grants {
            match grant.target() {
                GrantTarget::Teacher(teacher_id) => {
                    index
                        .teachers_by_course
                        .entry(grant.course_id.clone())
                        .or_default()
                        .insert(teacher_id.to_string());
                }
                GrantTarget::Group(group_id) => {
                    index
                        .groups_by_course
                        .entry(grant.course_id.clone())
                        .or_default()
                        .push(group_id.to_string());
                }
                GrantTarget::Missing => {
                    index.ignored.grants_without_target += 1;
                }
                GrantTarget::Ambiguous => {
                    tracing::warn!(
                        course_id = %grant.course_id,
                        group_id = ?grant.group_id,
                        teacher_id = ?grant.teacher_id,
                        "ignoring access grant with both a group and a teacher"
                    );
                    index.ignored.grants_with_both_targets += 1;
                }
            }
        }
        index
    }

    /// All `(course_id, teacher_id)` pairs.
    pub fn teacher_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.teachers_by_course.iter().flat_map(|(course, teachers)| {
            teachers.iter().map(move |t| (course.as_str(), t.as_str()))
        })
    }

    /// All `(course_id, group_id)` pairs, one per group grant.
    pub fn group_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups_by_course.iter().flat_map(|(course, groups)| {
            groups.iter().map(move |g| (course.as_str(), g.as_str()))
        })
    }

    pub fn ignored(&self) -> &AnomalyReport {
        &self.ignored
    }
}

/// All lookup structures the resolver needs for one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotIndexes {
    pub users: Arc<RecordIndex<User>>,
    pub courses: Arc<RecordIndex<Course>>,
    pub groups: Arc<RecordIndex<Group>>,
    pub members: Arc<MemberIndex>,
    pub grants: Arc<GrantIndex>,
}

impl SnapshotIndexes {
    /// Build every index from scratch. The engine uses the per-relation
    /// builders directly so it can reuse unchanged ones.
    pub fn build(snapshot: &Snapshot) -> Self {
        Self {
            users: Arc::new(RecordIndex::build(&snapshot.users)),
            courses: Arc::new(RecordIndex::build(&snapshot.courses)),
            groups: Arc::new(RecordIndex::build(&snapshot.groups)),
            members: Arc::new(MemberIndex::build(&snapshot.memberships)),
            grants: Arc::new(GrantIndex::build(&snapshot.grants)),
        }
    }
}
