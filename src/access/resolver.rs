//! The three grant rules.
//!
//! Each rule is a pure function of the snapshot indexes and returns its own
//! rows. Rules do not interact, so [`resolve`] simply concatenates them.
//! Dangling references never fail a rule; the offending pair or member is
//! dropped and counted in the rule's [`AnomalyReport`].

use serde::Serialize;

use crate::access::index::SnapshotIndexes;
use crate::access::types::*;

/// Rows produced by one rule plus what it had to drop.
#[derive(Debug, Clone, Default)]
pub struct RuleOutput {
    pub grants: Vec<EffectiveGrant>,
    pub anomalies: AnomalyReport,
}

/// Output of a full resolution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub grants: Vec<EffectiveGrant>,
    pub anomalies: AnomalyReport,
}

/// Row counts per [`Reason`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReasonCounts {
    pub admin_scope: usize,
    pub teacher_assigned: usize,
    pub group_member: usize,
}

impl Resolution {
    pub fn count_by_reason(&self) -> ReasonCounts {
        let mut counts = ReasonCounts::default();
        for g in &self.grants {
            match g.reason {
                Reason::AdminScope => counts.admin_scope += 1,
                Reason::TeacherAssigned => counts.teacher_assigned += 1,
                Reason::GroupMember => counts.group_member += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Every active admin sees every course in the snapshot.
///
/// Users and courses come from the id indexes, so a repeated id counts once
/// and resolves to the same record the other rules see. Narrowing courses by
/// organization is the snapshot producer's job.
pub fn resolve_admin_scope(indexes: &SnapshotIndexes) -> Vec<EffectiveGrant> {
    indexes
        .users
        .iter()
        .filter(|u| u.role == Role::Admin && u.is_active)
        .flat_map(|admin| {
            indexes
                .courses
                .iter()
                .map(move |course| EffectiveGrant::new(admin, course, Reason::AdminScope))
        })
        .collect()
}

/// Active users assigned as a course's teacher, whatever their role attribute.
pub fn resolve_teacher_assigned(indexes: &SnapshotIndexes) -> RuleOutput {
    let mut out = RuleOutput::default();

    for (course_id, teacher_id) in indexes.grants.teacher_pairs() {
        let Some(course) = indexes.courses.get(course_id) else {
            out.anomalies.unknown_courses += 1;
            continue;
        };
        let Some(teacher) = indexes.users.get(teacher_id) else {
            out.anomalies.unknown_teachers += 1;
            continue;
        };
        if !teacher.is_active {
            continue;
        }
        out.grants
            .push(EffectiveGrant::new(teacher, course, Reason::TeacherAssigned));
    }

    out
}

/// Active members of active groups granted to a course. Roles are not
/// filtered, so teachers or admins in a group get a row here too.
pub fn resolve_group_member(indexes: &SnapshotIndexes) -> RuleOutput {
    let mut out = RuleOutput::default();

    for (course_id, group_id) in indexes.grants.group_pairs() {
        let Some(course) = indexes.courses.get(course_id) else {
            out.anomalies.unknown_courses += 1;
            continue;
        };
        let Some(group) = indexes.groups.get(group_id) else {
            out.anomalies.unknown_groups += 1;
            continue;
        };
        if !group.is_active {
            continue;
        }

        for member_id in indexes.members.members_of(group_id) {
            let Some(member) = indexes.users.get(member_id) else {
                out.anomalies.unknown_members += 1;
                continue;
            };
            if !member.is_active {
                continue;
            }
            out.grants
                .push(EffectiveGrant::new(member, course, Reason::GroupMember).via_group(group));
        }
    }

    out
}

/// Run all three rules and concatenate their rows.
pub fn resolve(indexes: &SnapshotIndexes) -> Resolution {
    let admin = resolve_admin_scope(indexes);
    let teacher = resolve_teacher_assigned(indexes);
    let group = resolve_group_member(indexes);

    let mut anomalies = *indexes.grants.ignored();
    anomalies.merge(&teacher.anomalies);
    anomalies.merge(&group.anomalies);

    let mut grants = Vec::with_capacity(admin.len() + teacher.grants.len() + group.grants.len());
    grants.extend(admin);
    grants.extend(teacher.grants);
    grants.extend(group.grants);

    let resolution = Resolution { grants, anomalies };
    let counts = resolution.count_by_reason();
    tracing::info!(
        rows = resolution.len(),
        admin_scope = counts.admin_scope,
        teacher_assigned = counts.teacher_assigned,
        group_member = counts.group_member,
        anomalies = resolution.anomalies.total(),
        "Resolved effective course access"
    );

    resolution
}
