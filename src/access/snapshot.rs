use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::access::types::*;

/// One consistent set of input relations for a resolution pass.
///
/// Each relation is an `Arc` slice. Cloning a snapshot is cheap and keeps the
/// identity of every relation, which is what the engine memoizes on.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub users: Arc<[User]>,
    pub courses: Arc<[Course]>,
    pub groups: Arc<[Group]>,
    pub memberships: Arc<[GroupMembership]>,
    pub grants: Arc<[AccessGrant]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            users: Arc::from(Vec::new()),
            courses: Arc::from(Vec::new()),
            groups: Arc::from(Vec::new()),
            memberships: Arc::from(Vec::new()),
            grants: Arc::from(Vec::new()),
        }
    }
}

impl Snapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Replace one relation as supplied, with no id de-duplication. The other
    /// relations keep their identity, so the engine only reindexes this one.
    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = Arc::from(users);
        self
    }

    pub fn with_courses(mut self, courses: Vec<Course>) -> Self {
        self.courses = Arc::from(courses);
        self
    }

    pub fn with_memberships(mut self, memberships: Vec<GroupMembership>) -> Self {
        self.memberships = Arc::from(memberships);
        self
    }

    pub fn with_grants(mut self, grants: Vec<AccessGrant>) -> Self {
        self.grants = Arc::from(grants);
        self
    }
}

/// Accumulates records, possibly from several independently fetched pages.
///
/// Users, courses and groups are keyed by id with the last write winning but
/// keeping the position of the first occurrence. Memberships are de-duplicated
/// on `(group_id, user_id)`. Grants are kept exactly as supplied so that
/// malformed rows still reach the resolver's anomaly accounting.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    users: Keyed<User>,
    courses: Keyed<Course>,
    groups: Keyed<Group>,
    memberships: Vec<GroupMembership>,
    seen_memberships: HashSet<(GroupId, UserId)>,
    grants: Vec<AccessGrant>,
}

impl SnapshotBuilder {
    pub fn user(mut self, user: User) -> Self {
        self.push_user(user);
        self
    }

    pub fn course(mut self, course: Course) -> Self {
        self.push_course(course);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.push_group(group);
        self
    }

    pub fn membership(mut self, group_id: &str, user_id: &str) -> Self {
        self.push_membership(GroupMembership {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
        });
        self
    }

    pub fn grant(mut self, grant: AccessGrant) -> Self {
        self.push_grant(grant);
        self
    }

    pub fn push_user(&mut self, user: User) {
        self.users.upsert(user.id.clone(), user);
    }

    pub fn push_course(&mut self, course: Course) {
        self.courses.upsert(course.id.clone(), course);
    }

    pub fn push_group(&mut self, group: Group) {
        self.groups.upsert(group.id.clone(), group);
    }

    pub fn push_membership(&mut self, membership: GroupMembership) {
        let key = (membership.group_id.clone(), membership.user_id.clone());
        if self.seen_memberships.insert(key) {
            self.memberships.push(membership);
        }
    }

    pub fn push_grant(&mut self, grant: AccessGrant) {
        self.grants.push(grant);
    }

    /// Merge another page of records into this builder.
    pub fn merge(mut self, page: SnapshotBuilder) -> Self {
        for user in page.users.items {
            self.push_user(user);
        }
        for course in page.courses.items {
            self.push_course(course);
        }
        for group in page.groups.items {
            self.push_group(group);
        }
        for membership in page.memberships {
            self.push_membership(membership);
        }
        self.grants.extend(page.grants);
        self
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            users: Arc::from(self.users.items),
            courses: Arc::from(self.courses.items),
            groups: Arc::from(self.groups.items),
            memberships: Arc::from(self.memberships),
            grants: Arc::from(self.grants),
        }
    }
}

#[derive(Debug, Clone)]
struct Keyed<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> Keyed<T> {
    fn upsert(&mut self, id: String, item: T) {
        match self.positions.get(&id) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.positions.insert(id, self.items.len());
                self.items.push(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            full_name: name.into(),
            email: format!("{id}@example.com"),
            role: Role::Student,
            is_active: true,
        }
    }

    #[test]
    fn test_merge_pages_last_writer_wins() {
        let page1 = Snapshot::builder()
            .user(user("u1", "Carol"))
            .user(user("u2", "Dave"))
            .membership("g1", "u1");
        let page2 = Snapshot::builder()
            .user(user("u1", "Carol Smith"))
            .user(user("u3", "Erin"))
            .membership("g1", "u1")
            .membership("g1", "u3");

        let snapshot = page1.merge(page2).build();
        let names: Vec<_> = snapshot.users.iter().map(|u| u.full_name.as_str()).collect();
        assert_eq!(names, vec!["Carol Smith", "Dave", "Erin"]);
        assert_eq!(snapshot.memberships.len(), 2);
    }

    #[test]
    fn test_grants_are_kept_verbatim() {
        let snapshot = Snapshot::builder()
            .grant(AccessGrant::for_teacher("c1", "u1"))
            .grant(AccessGrant::for_teacher("c1", "u1"))
            .grant(AccessGrant {
                course_id: "c1".into(),
                group_id: None,
                teacher_id: None,
            })
            .build();
        assert_eq!(snapshot.grants.len(), 3);
    }

    #[test]
    fn test_with_relation_keeps_other_identities() {
        let snapshot = Snapshot::builder().user(user("u1", "Carol")).build();
        let courses = snapshot.courses.clone();
        let users = snapshot.users.clone();

        let next = snapshot.with_users(vec![user("u2", "Dave")]);
        assert!(Arc::ptr_eq(&courses, &next.courses));
        assert!(!Arc::ptr_eq(&users, &next.users));
    }
}
