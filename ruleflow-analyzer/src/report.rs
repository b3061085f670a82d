//! Validation report model

/// The six analysis categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Syntax,
    Naming,
    Dependencies,
    Logic,
    Performance,
    BestPractices,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Syntax => "syntax",
            RuleCategory::Naming => "naming",
            RuleCategory::Dependencies => "dependencies",
            RuleCategory::Logic => "logic",
            RuleCategory::Performance => "performance",
            RuleCategory::BestPractices => "best_practices",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Info => "info",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
            IssueSeverity::Critical => "critical",
        }
    }
}

/// One finding: a stable code, a severity, the explanation, a concrete
/// suggestion and a section-path location such as `when[2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub category: RuleCategory,
    pub code: String,
    pub severity: IssueSeverity,
    pub message: String,
    pub suggestion: Option<String>,
    pub location: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        category: RuleCategory,
        code: impl Into<String>,
        severity: IssueSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            severity,
            message: message.into(),
            suggestion: None,
            location: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Overall verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Warning,
    Error,
    CriticalError,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Error => "error",
            ValidationStatus::CriticalError => "critical_error",
        }
    }
}

/// All findings of one validation run plus the derived status and score.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn in_category(&self, category: RuleCategory) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.category == category).collect()
    }

    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn is_valid(&self) -> bool {
        !matches!(
            self.status(),
            ValidationStatus::Error | ValidationStatus::CriticalError
        )
    }

    pub fn status(&self) -> ValidationStatus {
        let highest = self.issues.iter().map(|i| i.severity).max();
        match highest {
            None | Some(IssueSeverity::Info) => ValidationStatus::Valid,
            Some(IssueSeverity::Warning) => ValidationStatus::Warning,
            Some(IssueSeverity::Error) => ValidationStatus::Error,
            Some(IssueSeverity::Critical) => ValidationStatus::CriticalError,
        }
    }

    /// `max(0, 100 − 25·critical − 10·error − 3·warning − 1·info)`
    pub fn quality_score(&self) -> u32 {
        let penalty = 25 * self.count(IssueSeverity::Critical)
            + 10 * self.count(IssueSeverity::Error)
            + 3 * self.count(IssueSeverity::Warning)
            + self.count(IssueSeverity::Info);
        100u32.saturating_sub(penalty as u32)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let issues: Vec<serde_json::Value> = self
            .issues
            .iter()
            .map(|issue| {
                serde_json::json!({
                    "category": issue.category.as_str(),
                    "code": issue.code,
                    "severity": issue.severity.as_str(),
                    "message": issue.message,
                    "suggestion": issue.suggestion,
                    "location": issue.location,
                })
            })
            .collect();
        serde_json::json!({
            "status": self.status().as_str(),
            "qualityScore": self.quality_score(),
            "issues": issues,
        })
    }
}
