use std::path::PathBuf;

use clap::Parser;
use course_access::access::{
    loader, AccessEngine, GrantFilter, ReasonFilter, RoleFilter, SortDirection, SortField,
};
use course_access::report;
use course_access::settings::{ReportFormat, Settings};
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "course-access",
    version,
    about = "Report who can see which course and why"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Directory of `.kdl` snapshot files (overrides snapshot.dir)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Case-insensitive search over user name, email, course title and group
    #[arg(short, long, default_value = "")]
    query: String,

    /// student, teacher, admin or all
    #[arg(long, default_value = "all")]
    role: String,

    /// admin_scope, teacher_assigned, group_member or all
    #[arg(long, default_value = "all")]
    reason: String,

    /// Sort field (overrides report.sort_field)
    #[arg(long)]
    sort: Option<String>,

    /// asc or desc (overrides report.direction)
    #[arg(long)]
    direction: Option<String>,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;

    // logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
    tracing::debug!(?settings, "Loaded configuration");

    // filter and sort parameters are validated before touching any data
    let filter = GrantFilter::new()
        .query(cli.query.trim())
        .role(cli.role.parse::<RoleFilter>()?)
        .reason(cli.reason.parse::<ReasonFilter>()?);

    let mut sort = settings.sort_spec()?;
    if let Some(field) = &cli.sort {
        sort.field = field.parse::<SortField>()?;
    }
    if let Some(direction) = &cli.direction {
        sort.direction = direction.parse::<SortDirection>()?;
    }

    let dir = cli.snapshot_dir.unwrap_or(settings.snapshot.dir);
    let snapshot = loader::load_snapshot(&dir)?;

    let mut engine = AccessEngine::new();
    let rows = engine.view(&snapshot, &filter, sort);
    let resolution = engine.resolve(&snapshot);

    let format = if cli.json {
        ReportFormat::Json
    } else {
        settings.report.format
    };

    let stdout = std::io::stdout();
    report::write_report(&mut stdout.lock(), &rows, &resolution, format)?;
    Ok(())
}
