use crate::access::errors::AccessError;
use crate::access::snapshot::SnapshotBuilder;
use crate::access::types::*;
use kdl::{KdlDocument, KdlNode};

/// Parse a KDL snapshot export into a builder page.
///
/// ```kdl
/// user "u1" name="Alice" email="alice@example.com" role="admin" active=#true
/// course "c1" title="Math" published=#true
/// group "g5a" name="5A"
/// member group="g5a" user="u3"
/// grant course="c1" teacher="u2"
/// grant course="c2" group="g5a"
/// ```
pub fn parse_kdl_document(source: &str) -> Result<SnapshotBuilder, AccessError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| AccessError::KdlParse(e.to_string()))?;

    let mut page = SnapshotBuilder::default();

    for node in doc.nodes() {
        match node.name().value() {
            "user" => {
                let id = first_string_arg(node).ok_or_else(|| {
                    AccessError::InvalidSnapshot(
                        "user node requires an id argument (e.g. user \"u1\" name=\"Alice\")"
                            .into(),
                    )
                })?;
                let full_name = required_string(node, "name", "user", &id)?;
                let email = required_string(node, "email", "user", &id)?;
                let role = required_string(node, "role", "user", &id)?.parse::<Role>()?;
                page.push_user(User {
                    id,
                    full_name,
                    email,
                    role,
                    is_active: bool_prop(node, "active").unwrap_or(true),
                });
            }
            "course" => {
                let id = first_string_arg(node).ok_or_else(|| {
                    AccessError::InvalidSnapshot(
                        "course node requires an id argument (e.g. course \"c1\" title=\"Math\")"
                            .into(),
                    )
                })?;
                let title = required_string(node, "title", "course", &id)?;
                page.push_course(Course {
                    id,
                    title,
                    is_published: bool_prop(node, "published").unwrap_or(true),
                });
            }
            "group" => {
                let id = first_string_arg(node).ok_or_else(|| {
                    AccessError::InvalidSnapshot(
                        "group node requires an id argument (e.g. group \"g5a\" name=\"5A\")"
                            .into(),
                    )
                })?;
                let name = required_string(node, "name", "group", &id)?;
                page.push_group(Group {
                    id,
                    name,
                    is_active: bool_prop(node, "active").unwrap_or(true),
                });
            }
            "member" => {
                let group_id = string_prop(node, "group");
                let user_id = string_prop(node, "user");
                let (Some(group_id), Some(user_id)) = (group_id, user_id) else {
                    return Err(AccessError::InvalidSnapshot(
                        "member node requires `group` and `user` properties (e.g. member group=\"g5a\" user=\"u3\")"
                            .into(),
                    ));
                };
                page.push_membership(GroupMembership { group_id, user_id });
            }
            "grant" => {
                let course_id = string_prop(node, "course").ok_or_else(|| {
                    AccessError::InvalidSnapshot(
                        "grant node requires a `course` property (e.g. grant course=\"c1\" teacher=\"u2\")"
                            .into(),
                    )
                })?;
                // Target validity is the resolver's concern, keep the row as exported.
                page.push_grant(AccessGrant {
                    course_id,
                    group_id: string_prop(node, "group"),
                    teacher_id: string_prop(node, "teacher"),
                });
            }
            other => {
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(page)
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn string_prop(node: &KdlNode, key: &str) -> Option<String> {
    node.get(key)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn bool_prop(node: &KdlNode, key: &str) -> Option<bool> {
    node.get(key).and_then(|v| v.as_bool())
}

fn required_string(
    node: &KdlNode,
    key: &str,
    kind: &str,
    id: &str,
) -> Result<String, AccessError> {
    string_prop(node, key).ok_or_else(|| {
        AccessError::InvalidSnapshot(format!("{kind} `{id}` missing `{key}` property"))
    })
}
