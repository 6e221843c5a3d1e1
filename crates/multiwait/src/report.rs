//! Sub-test results and the closing report.
//!
//! Console format is one summary line per sub-test:
//! `<facility> test successful`, `<facility> test failed` or
//! `<facility> test skipped (facility unsupported)`.

use mw_harness::AlternationReport;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubTestOutcome {
    Passed {
        #[serde(skip_serializing_if = "Option::is_none")]
        alternation: Option<AlternationReport>,
    },
    Failed {
        reason: String,
    },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubTestResult {
    pub facility: &'static str,
    #[serde(flatten)]
    pub outcome: SubTestOutcome,
}

impl SubTestResult {
    pub fn pass(facility: &'static str, alternation: Option<AlternationReport>) -> Self {
        Self {
            facility,
            outcome: SubTestOutcome::Passed { alternation },
        }
    }

    pub fn fail(facility: &'static str, reason: impl Into<String>) -> Self {
        Self {
            facility,
            outcome: SubTestOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn skip(facility: &'static str) -> Self {
        Self {
            facility,
            outcome: SubTestOutcome::Skipped,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, SubTestOutcome::Failed { .. })
    }

    pub fn summary_line(&self) -> String {
        match self.outcome {
            SubTestOutcome::Passed { .. } => format!("{} test successful", self.facility),
            SubTestOutcome::Failed { .. } => format!("{} test failed", self.facility),
            SubTestOutcome::Skipped => {
                format!("{} test skipped (facility unsupported)", self.facility)
            }
        }
    }

    pub fn print(&self) {
        libsyscall::println!("{}", self.summary_line());
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Kernel release as reported by uname, when available.
    pub kernel: Option<String>,
    pub results: Vec<SubTestResult>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.failed()).count()
    }

    /// Process exit code: 1 if any sub-test failed. Skips are not failures.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.failures() > 0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
