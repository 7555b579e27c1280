//! Per-case outcomes of a suite run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};

/// Outcome of one provisioning case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub success: bool,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CaseResult {
    pub fn passed(name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            success: true,
            message: None,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(name: impl Into<String>, started_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            message: Some(message.into()),
            started_at,
            completed_at: Utc::now(),
        }
    }
}

/// Results of a suite run, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub cases: Vec<CaseResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            cases: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record(&mut self, result: CaseResult) {
        self.cases.push(result);
    }

    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.success).count()
    }

    pub fn failed(&self) -> Vec<&CaseResult> {
        self.cases.iter().filter(|c| !c.success).collect()
    }

    pub fn is_success(&self) -> bool {
        self.cases.iter().all(|c| c.success)
    }

    /// `Err(CasesFailed)` when any case failed.
    pub fn into_result(self) -> SuiteResult<Self> {
        let failed = self.failed().len();
        if failed > 0 {
            return Err(SuiteError::CasesFailed {
                failed,
                total: self.cases.len(),
            });
        }
        Ok(self)
    }

    pub fn to_json(&self) -> SuiteResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SuiteError::Setup(format!("Failed to serialize report: {}", e)))
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}/{} passed", self.suite, self.passed(), self.cases.len())?;
        for case in &self.cases {
            let mark = if case.success { "PASS" } else { "FAIL" };
            match &case.message {
                Some(message) => writeln!(f, "  [{}] {}: {}", mark, case.name, message)?,
                None => writeln!(f, "  [{}] {}", mark, case.name)?,
            }
        }
        Ok(())
    }
}
