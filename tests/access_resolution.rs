mod helpers;

use std::collections::HashSet;

use course_access::access::{
    filter_grants, sort_grants, AccessEngine, AccessGrant, EffectiveGrant, GrantFilter, Reason,
    ReasonFilter, Role, RoleFilter, Snapshot, SortDirection, SortField, SortSpec, User,
};
use helpers::{course, GroupBuilder, UserBuilder};

fn resolve(snapshot: &Snapshot) -> Vec<EffectiveGrant> {
    AccessEngine::new().resolve(snapshot).grants.clone()
}

fn triples(rows: &[EffectiveGrant]) -> Vec<(String, String, Reason)> {
    let mut out: Vec<_> = rows
        .iter()
        .map(|g| (g.user_name.clone(), g.course_title.clone(), g.reason))
        .collect();
    out.sort_by(|a, b| (&a.0, &a.1, a.2.as_str()).cmp(&(&b.0, &b.1, b.2.as_str())));
    out
}

fn row(name: &str, course: &str, reason: Reason) -> (String, String, Reason) {
    (name.to_string(), course.to_string(), reason)
}

/// Alice (admin), Bob (teacher of Math), Carol and Dave in 5A (granted Science).
fn school() -> Snapshot {
    Snapshot::builder()
        .user(UserBuilder::new("alice").admin().build())
        .user(UserBuilder::new("bob").teacher().build())
        .user(UserBuilder::new("carol").build())
        .user(UserBuilder::new("dave").build())
        .course(course("1", "Math"))
        .course(course("2", "Science"))
        .group(GroupBuilder::new("5a", "5A").build())
        .membership("5a", "carol")
        .membership("5a", "dave")
        .grant(AccessGrant::for_teacher("1", "bob"))
        .grant(AccessGrant::for_group("2", "5a"))
        .build()
}

#[test]
fn test_admin_sees_every_course() {
    let snapshot = Snapshot::builder()
        .user(UserBuilder::new("alice").admin().build())
        .course(course("1", "Math"))
        .course(course("2", "Science"))
        .build();

    assert_eq!(
        triples(&resolve(&snapshot)),
        vec![
            row("Alice", "Math", Reason::AdminScope),
            row("Alice", "Science", Reason::AdminScope),
        ]
    );
}

#[test]
fn test_repeated_admin_id_yields_one_row_per_course() {
    let base = Snapshot::builder().course(course("1", "Math")).build();

    let twice = base.clone().with_users(vec![
        UserBuilder::new("alice").admin().build(),
        UserBuilder::new("alice").admin().build(),
    ]);
    assert_eq!(
        triples(&resolve(&twice)),
        vec![row("Alice", "Math", Reason::AdminScope)]
    );

    let deactivated = base.with_users(vec![
        UserBuilder::new("alice").admin().build(),
        UserBuilder::new("alice").admin().inactive().build(),
    ]);
    assert!(resolve(&deactivated).is_empty());
}

#[test]
fn test_deactivating_teacher_removes_row() {
    let snapshot = school();
    let rows = resolve(&snapshot);
    assert!(triples(&rows).contains(&row("Bob", "Math", Reason::TeacherAssigned)));

    let users: Vec<User> = snapshot
        .users
        .iter()
        .cloned()
        .map(|mut u| {
            if u.id == "bob" {
                u.is_active = false;
            }
            u
        })
        .collect();
    let rows = resolve(&snapshot.clone().with_users(users));
    assert!(rows.iter().all(|g| g.user_id != "bob"));
}

#[test]
fn test_group_members_and_removal() {
    let snapshot = school();
    let rows = resolve(&snapshot);
    let science: Vec<_> = rows
        .iter()
        .filter(|g| g.reason == Reason::GroupMember)
        .map(|g| (g.user_name.as_str(), g.course_title.as_str(), g.via_group_name.as_deref()))
        .collect();
    assert_eq!(
        science,
        vec![
            ("Carol", "Science", Some("5A")),
            ("Dave", "Science", Some("5A")),
        ]
    );

    let memberships = snapshot
        .memberships
        .iter()
        .filter(|m| m.user_id != "dave")
        .cloned()
        .collect();
    let rows = resolve(&snapshot.clone().with_memberships(memberships));
    let members: Vec<_> = rows
        .iter()
        .filter(|g| g.reason == Reason::GroupMember)
        .map(|g| g.user_id.as_str())
        .collect();
    assert_eq!(members, vec!["carol"]);
}

#[test]
fn test_query_and_role_filter_intersect() {
    let snapshot = Snapshot::builder()
        .user(UserBuilder::new("alice").admin().build())
        .user(UserBuilder::new("bob").teacher().build())
        .user(
            UserBuilder::new("mathilda")
                .teacher()
                .named("Mathilda")
                .build(),
        )
        .course(course("1", "Math"))
        .course(course("2", "Science"))
        .grant(AccessGrant::for_teacher("1", "bob"))
        .grant(AccessGrant::for_teacher("2", "bob"))
        .grant(AccessGrant::for_teacher("2", "mathilda"))
        .build();
    let rows = resolve(&snapshot);

    let filter = GrantFilter::new()
        .query("math")
        .role(RoleFilter::Only(Role::Teacher));
    let mut hits = filter_grants(&rows, &filter);
    sort_grants(&mut hits, SortSpec::default());

    let hits: Vec<_> = hits
        .iter()
        .map(|g| (g.user_name.as_str(), g.course_title.as_str()))
        .collect();
    // Bob via the course title, Mathilda via her name on Science.
    assert_eq!(hits, vec![("Bob", "Math"), ("Mathilda", "Science")]);
}

#[test]
fn test_multiple_justifications_are_all_surfaced() {
    let snapshot = Snapshot::builder()
        .user(UserBuilder::new("alice").admin().build())
        .course(course("1", "Math"))
        .group(GroupBuilder::new("staff", "Staff").build())
        .membership("staff", "alice")
        .grant(AccessGrant::for_teacher("1", "alice"))
        .grant(AccessGrant::for_group("1", "staff"))
        .build();

    let rows = resolve(&snapshot);
    assert_eq!(rows.len(), 3);
    let reasons: HashSet<_> = rows.iter().map(|g| g.reason).collect();
    assert_eq!(reasons.len(), 3);
    assert!(rows.iter().all(|g| g.user_id == "alice" && g.course_id == "1"));
}

#[test]
fn test_malformed_grants_never_appear() {
    let snapshot = Snapshot::builder()
        .user(UserBuilder::new("bob").teacher().build())
        .user(UserBuilder::new("carol").build())
        .course(course("1", "Math"))
        .group(GroupBuilder::new("5a", "5A").build())
        .membership("5a", "carol")
        .grant(AccessGrant {
            course_id: "1".into(),
            group_id: Some("5a".into()),
            teacher_id: Some("bob".into()),
        })
        .grant(AccessGrant {
            course_id: "1".into(),
            group_id: None,
            teacher_id: None,
        })
        .build();

    let resolution = AccessEngine::new().resolve(&snapshot);
    assert!(resolution.grants.is_empty());
    assert_eq!(resolution.anomalies.grants_with_both_targets, 1);
    assert_eq!(resolution.anomalies.grants_without_target, 1);
}

#[test]
fn test_empty_snapshot_yields_nothing() {
    let resolution = AccessEngine::new().resolve(&Snapshot::default());
    assert!(resolution.grants.is_empty());
    assert_eq!(resolution.anomalies.total(), 0);
}

/// A larger, deterministic snapshot with a mix of active and inactive
/// records, dangling references and malformed grants.
fn campus() -> Snapshot {
    let mut b = Snapshot::builder();

    for i in 0..40 {
        let id = format!("u{i}");
        let mut user = UserBuilder::new(&id).named(&format!("User {i:02}"));
        user = match i % 10 {
            0 => user.admin(),
            1 | 2 => user.teacher(),
            _ => user,
        };
        if i % 7 == 3 {
            user = user.inactive();
        }
        b.push_user(user.build());
    }
    for c in 0..6 {
        b.push_course(course(&format!("c{c}"), &format!("Course {c}")));
    }
    for g in 0..5 {
        let mut group = GroupBuilder::new(&format!("g{g}"), &format!("Group {g}"));
        if g == 4 {
            group = group.inactive();
        }
        b.push_group(group.build());
    }
    for i in 0..40 {
        b = b.membership(&format!("g{}", i % 5), &format!("u{i}"));
        if i % 3 == 0 {
            b = b.membership(&format!("g{}", (i + 1) % 5), &format!("u{i}"));
        }
    }
    b = b.membership("g0", "ghost");

    for c in 0..6 {
        let course_id = format!("c{c}");
        b = b
            .grant(AccessGrant::for_teacher(&course_id, format!("u{}", c * 3 + 1)))
            .grant(AccessGrant::for_group(&course_id, format!("g{}", c % 5)));
        if c % 2 == 0 {
            b = b.grant(AccessGrant::for_group(&course_id, format!("g{}", (c + 2) % 5)));
        }
    }
    b = b
        .grant(AccessGrant::for_teacher("c0", "nobody"))
        .grant(AccessGrant::for_group("c1", "g-missing"))
        .grant(AccessGrant::for_teacher("c-missing", "u1"))
        .grant(AccessGrant {
            course_id: "c2".into(),
            group_id: Some("g1".into()),
            teacher_id: Some("u2".into()),
        });

    b.build()
}

#[test]
fn test_admin_scope_property() {
    let snapshot = campus();
    let rows = resolve(&snapshot);

    let mut seen = HashSet::new();
    for g in rows.iter().filter(|g| g.reason == Reason::AdminScope) {
        assert!(seen.insert((g.user_id.clone(), g.course_id.clone())));
    }

    let active_admins: Vec<_> = snapshot
        .users
        .iter()
        .filter(|u| u.role == Role::Admin && u.is_active)
        .collect();
    assert_eq!(seen.len(), active_admins.len() * snapshot.courses.len());
    for admin in snapshot.users.iter().filter(|u| u.role == Role::Admin) {
        let has_rows = seen.iter().any(|(u, _)| *u == admin.id);
        assert_eq!(has_rows, admin.is_active);
    }
}

#[test]
fn test_teacher_assigned_property() {
    let snapshot = campus();
    let rows = resolve(&snapshot);
    let course_ids: HashSet<_> = snapshot.courses.iter().map(|c| c.id.as_str()).collect();

    for grant in snapshot.grants.iter() {
        let (Some(teacher_id), None) = (&grant.teacher_id, &grant.group_id) else {
            continue;
        };
        let count = rows
            .iter()
            .filter(|g| {
                g.reason == Reason::TeacherAssigned
                    && g.user_id == *teacher_id
                    && g.course_id == grant.course_id
            })
            .count();
        let active = snapshot
            .users
            .iter()
            .any(|u| u.id == *teacher_id && u.is_active);
        let expected = usize::from(active && course_ids.contains(grant.course_id.as_str()));
        assert_eq!(count, expected, "teacher {teacher_id} on {}", grant.course_id);
    }
}

#[test]
fn test_group_member_count_property() {
    let snapshot = campus();
    let rows = resolve(&snapshot);
    let course_ids: HashSet<_> = snapshot.courses.iter().map(|c| c.id.as_str()).collect();

    let active_members = |group_id: &str| {
        snapshot
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .filter(|m| {
                snapshot
                    .users
                    .iter()
                    .any(|u| u.id == m.user_id && u.is_active)
            })
            .count()
    };

    let mut expected = 0;
    for grant in snapshot.grants.iter() {
        let (Some(group_id), None) = (&grant.group_id, &grant.teacher_id) else {
            continue;
        };
        if !course_ids.contains(grant.course_id.as_str()) {
            continue;
        }
        let active_group = snapshot
            .groups
            .iter()
            .any(|g| g.id == *group_id && g.is_active);
        if active_group {
            expected += active_members(group_id);
        }
    }

    let actual = rows
        .iter()
        .filter(|g| g.reason == Reason::GroupMember)
        .count();
    assert!(expected > 0);
    assert_eq!(actual, expected);
    assert!(rows
        .iter()
        .filter(|g| g.reason == Reason::GroupMember)
        .all(|g| g.via_group_name.as_deref() != Some("Group 4")));
}

#[test]
fn test_campus_anomalies_are_counted() {
    let resolution = AccessEngine::new().resolve(&campus());
    assert_eq!(resolution.anomalies.unknown_teachers, 1);
    assert_eq!(resolution.anomalies.unknown_groups, 1);
    assert_eq!(resolution.anomalies.unknown_courses, 1);
    assert_eq!(resolution.anomalies.grants_with_both_targets, 1);
    // "ghost" in g0, counted once per grant of g0 to an existing course
    let g0_grants = campus()
        .grants
        .iter()
        .filter(|g| g.group_id.as_deref() == Some("g0") && g.teacher_id.is_none())
        .count();
    assert_eq!(resolution.anomalies.unknown_members, g0_grants);
}

#[test]
fn test_filter_idempotent_on_campus() {
    let rows = resolve(&campus());
    let filters = [
        GrantFilter::new().query("course 1"),
        GrantFilter::new().query("GROUP").reason(ReasonFilter::Only(Reason::GroupMember)),
        GrantFilter::new()
            .role(RoleFilter::Only(Role::Teacher))
            .query("u1"),
        GrantFilter::new(),
    ];
    for filter in &filters {
        let once = filter_grants(&rows, filter);
        let twice = filter_grants(once.iter().copied(), filter);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_sort_stability_and_toggle_on_campus() {
    let rows = resolve(&campus());
    for field in [
        SortField::UserName,
        SortField::UserEmail,
        SortField::UserRole,
        SortField::CourseTitle,
        SortField::Reason,
    ] {
        let spec = SortSpec::new(field, SortDirection::Asc);
        let mut once: Vec<_> = rows.iter().collect();
        sort_grants(&mut once, spec);
        let mut twice = once.clone();
        sort_grants(&mut twice, spec);
        assert_eq!(once, twice, "sorting by {field} twice must be a no-op");

        let mut desc = once.clone();
        sort_grants(&mut desc, spec.toggle(field));
        for pair in desc.windows(2) {
            assert_ne!(field.compare(pair[0], pair[1]), std::cmp::Ordering::Less);
        }
    }
}

#[test]
fn test_toggle_reverses_distinct_keys() {
    let snapshot = Snapshot::builder()
        .user(UserBuilder::new("alice").admin().build())
        .course(course("1", "Algebra"))
        .course(course("2", "biology"))
        .course(course("3", "Chemistry"))
        .build();
    let rows = resolve(&snapshot);

    let spec = SortSpec::new(SortField::CourseTitle, SortDirection::Asc);
    let mut asc: Vec<_> = rows.iter().collect();
    sort_grants(&mut asc, spec);
    let mut desc = asc.clone();
    sort_grants(&mut desc, spec.toggle(SortField::CourseTitle));

    let asc: Vec<_> = asc.iter().map(|g| g.course_title.as_str()).collect();
    let mut desc: Vec<_> = desc.iter().map(|g| g.course_title.as_str()).collect();
    assert_eq!(asc, vec!["Algebra", "biology", "Chemistry"]);
    desc.reverse();
    assert_eq!(asc, desc);
}

#[test]
fn test_unknown_sort_field_fails_fast() {
    let err = "enrolled_at".parse::<SortField>().unwrap_err();
    assert!(err.to_string().contains("enrolled_at"));
}

#[test]
fn test_bundled_demo_snapshot() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/snapshot");
    let snapshot = course_access::access::loader::load_snapshot(&dir).unwrap();
    let resolution = AccessEngine::new().resolve(&snapshot);

    let counts = resolution.count_by_reason();
    assert_eq!(counts.admin_scope, 3);
    assert_eq!(counts.teacher_assigned, 1);
    assert_eq!(counts.group_member, 2);
    assert_eq!(resolution.anomalies.total(), 0);
}
