use std::fmt;

/// The outcome of a plausibility check.
///
/// `valid` is cleared only by fatal findings, while `warnings` collects every human readable
/// finding, fatal or advisory. Callers decide whether advisory warnings should stop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether no fatal finding was reported.
    pub valid: bool,
    /// Human readable findings in the order they were detected.
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Create an empty, valid report.
    pub fn new() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
        }
    }

    /// Record an advisory finding.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a fatal finding and mark the report invalid.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.warnings.push(message.into());
    }

    /// Append the findings of another report, keeping its fatal status.
    pub fn merge(&mut self, other: ValidationReport) {
        self.valid &= other.valid;
        self.warnings.extend(other.warnings);
    }

    /// Whether the report has no findings at all.
    pub fn is_clean(&self) -> bool {
        self.valid && self.warnings.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.valid { "valid" } else { "invalid" })?;
        for warning in &self.warnings {
            write!(f, "\n  - {warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());
        report.warn("low resolution");

        let mut other = ValidationReport::new();
        other.fail("missing output directory");

        report.merge(other);
        assert!(!report.valid);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[1], "missing output directory");
        assert!(report.to_string().starts_with("invalid"));
    }
}
