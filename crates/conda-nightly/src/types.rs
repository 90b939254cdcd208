use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conda platform identifier, i.e. the subdirectory of the build root that
/// `conda build` writes archives into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linux-64")]
    Linux64,
    #[serde(rename = "osx-64")]
    Osx64,
}

impl Platform {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux64 => "linux-64",
            Platform::Osx64 => "osx-64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build profile selected from the OS report. Exactly one profile is active
/// per run and it is used consistently through to the upload path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsProfile {
    pub platform: Platform,
    /// Channel that carries the ESMF builds the package links against. The
    /// Linux profile points at the dev-build label, the Mac profile at the
    /// plain channel.
    pub esmf_channel: String,
    /// The original automation self-updates conda on the Linux branch only.
    /// Preserved as-is; whether the Mac side pins conda deliberately is not
    /// recorded anywhere.
    pub update_conda: bool,
}

/// One pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    DetectOs,
    PrepareBuildRoot,
    FetchRecipes,
    Build,
    Upload,
}

impl StepKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepKind::DetectOs => "detect-os",
            StepKind::PrepareBuildRoot => "prepare-build-root",
            StepKind::FetchRecipes => "fetch-recipes",
            StepKind::Build => "build",
            StepKind::Upload => "upload",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence for a single completed step: what ran and how long it took.
/// Command lines are rendered with credentials redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReceipt {
    pub step: StepKind,
    pub commands: Vec<String>,
    pub duration_ms: u128,
}

/// Audit receipt for a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReceipt {
    pub receipt_version: String,
    pub package: String,
    pub platform: Platform,
    /// The date-derived version the archives were built and uploaded as.
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReceipt>,
}

pub const RECEIPT_VERSION: &str = "1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_strings_match_conda_subdirs() {
        assert_eq!(Platform::Linux64.as_str(), "linux-64");
        assert_eq!(Platform::Osx64.as_str(), "osx-64");
        assert_eq!(Platform::Linux64.to_string(), "linux-64");
    }

    #[test]
    fn step_kinds_render_in_pipeline_order() {
        let order = [
            StepKind::DetectOs,
            StepKind::PrepareBuildRoot,
            StepKind::FetchRecipes,
            StepKind::Build,
            StepKind::Upload,
        ];
        let names: Vec<&str> = order.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            [
                "detect-os",
                "prepare-build-root",
                "fetch-recipes",
                "build",
                "upload"
            ]
        );
    }

    #[test]
    fn run_receipt_roundtrips_through_json() {
        let receipt = RunReceipt {
            receipt_version: RECEIPT_VERSION.to_string(),
            package: "cdutil".to_string(),
            platform: Platform::Linux64,
            version: "2018.01.15".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            steps: vec![StepReceipt {
                step: StepKind::Build,
                commands: vec!["conda build cdutil".to_string()],
                duration_ms: 12,
            }],
        };

        let json = serde_json::to_string(&receipt).expect("serialize");
        let parsed: RunReceipt = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(parsed.package, receipt.package);
        assert_eq!(parsed.platform, receipt.platform);
        assert_eq!(parsed.version, receipt.version);
        assert_eq!(parsed.steps.len(), 1);
        assert_eq!(parsed.steps[0].step, StepKind::Build);
    }

    #[test]
    fn platform_serializes_as_kebab_case() {
        let json = serde_json::to_string(&Platform::Osx64).expect("serialize");
        assert_eq!(json, "\"osx-64\"");
    }
}
