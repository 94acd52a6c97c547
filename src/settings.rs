use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::access::{SortDirection, SortField, SortSpec};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub snapshot: SnapshotSource,
    pub report: Report,
    pub logging: Logging,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSource {
    /// Directory of `.kdl` snapshot exports. Default: data/snapshot
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Default sort field, e.g. `user_name` or `course_title`
    pub sort_field: String,
    /// `asc` or `desc`
    pub direction: String,
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    /// Fallback filter when RUST_LOG is unset
    pub level: String,
}

impl Default for SnapshotSource {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/snapshot"),
        }
    }
}

impl Default for Report {
    fn default() -> Self {
        Self {
            sort_field: SortField::default().to_string(),
            direction: SortDirection::default().to_string(),
            format: ReportFormat::Table,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut s = Self::layered(path)?;

        if s.snapshot.dir.is_relative() {
            s.snapshot.dir = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.snapshot.dir);
        }

        Ok(s)
    }

    /// Defaults, then the optional TOML file, then the environment.
    fn layered(path: &str) -> std::result::Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .set_default(
                "snapshot.dir",
                SnapshotSource::default().dir.to_string_lossy().to_string(),
            )?
            .set_default("report.sort_field", Report::default().sort_field)?
            .set_default("report.direction", Report::default().direction)?
            .set_default("report.format", "table")?
            .set_default("logging.level", Logging::default().level)?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: COURSE_ACCESS__REPORT__FORMAT=json, etc.
        builder =
            builder.add_source(config::Environment::with_prefix("COURSE_ACCESS").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Default sort spec from the `report` section.
    pub fn sort_spec(&self) -> Result<SortSpec> {
        let field: SortField = self.report.sort_field.parse()?;
        let direction: SortDirection = self.report.direction.parse()?;
        Ok(SortSpec::new(field, direction))
    }
}
