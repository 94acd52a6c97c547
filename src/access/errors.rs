use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AccessError {
    #[error("Unknown sort field `{0}`")]
    #[diagnostic(
        code(course_access::unknown_sort_field),
        help("Supported sort fields: user_name, user_email, user_role, course_title, reason")
    )]
    UnknownSortField(String),

    #[error("Unknown sort direction `{0}`")]
    #[diagnostic(
        code(course_access::unknown_sort_direction),
        help("Sort direction must be `asc` or `desc`")
    )]
    UnknownSortDirection(String),

    #[error("Unknown role `{0}`")]
    #[diagnostic(
        code(course_access::unknown_role),
        help("Roles are `student`, `teacher` or `admin` (use `all` to disable the role filter)")
    )]
    UnknownRole(String),

    #[error("Unknown reason `{0}`")]
    #[diagnostic(
        code(course_access::unknown_reason),
        help("Reasons are `admin_scope`, `teacher_assigned` or `group_member` (use `all` to disable the reason filter)")
    )]
    UnknownReason(String),

    #[error("Failed to load snapshot file `{path}`")]
    #[diagnostic(
        code(course_access::snapshot_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    SnapshotLoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot record: {0}")]
    #[diagnostic(
        code(course_access::invalid_snapshot),
        help("Snapshot files contain `user`, `course`, `group`, `member` and `grant` KDL nodes")
    )]
    InvalidSnapshot(String),

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(course_access::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev for the specification")
    )]
    KdlParse(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(course_access::io))]
    Io(#[from] std::io::Error),
}
