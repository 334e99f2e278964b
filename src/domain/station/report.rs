//! Validation report accumulated across the pipeline stages.

use serde::{Deserialize, Serialize};

/// Outcome of validating one station document.
///
/// Field names are part of the wire contract: downstream consumers (the
/// review UI among them) inspect the serialized report by these exact names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_required_fields: Vec<String>,
    pub invalid_field_types: Vec<String>,
    pub structural_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub corrections_applied: Vec<String>,
}

impl ValidationReport {
    /// Creates an empty report in the valid state.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            missing_required_fields: Vec::new(),
            invalid_field_types: Vec::new(),
            structural_issues: Vec::new(),
            warnings: Vec::new(),
            corrections_applied: Vec::new(),
        }
    }

    /// Records a missing required field. Marks the report invalid.
    pub fn missing_field(&mut self, field: impl Into<String>) {
        self.missing_required_fields.push(field.into());
        self.is_valid = false;
    }

    /// Records a field with the wrong type. Marks the report invalid.
    pub fn invalid_type(&mut self, description: impl Into<String>) {
        self.invalid_field_types.push(description.into());
        self.is_valid = false;
    }

    /// Records a structural defect. Marks the report invalid.
    pub fn structural_issue(&mut self, description: impl Into<String>) {
        self.structural_issues.push(description.into());
        self.is_valid = false;
    }

    /// Records a non-blocking warning.
    pub fn warn(&mut self, description: impl Into<String>) {
        self.warnings.push(description.into());
    }

    /// Records an auto-correction that was applied to the document.
    pub fn correction(&mut self, description: impl Into<String>) {
        self.corrections_applied.push(description.into());
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.is_valid = self.is_valid && other.is_valid;
        self.missing_required_fields.extend(other.missing_required_fields);
        self.invalid_field_types.extend(other.invalid_field_types);
        self.structural_issues.extend(other.structural_issues);
        self.warnings.extend(other.warnings);
        self.corrections_applied.extend(other.corrections_applied);
    }

    /// True when any blocking issue was recorded.
    pub fn has_issues(&self) -> bool {
        !self.missing_required_fields.is_empty()
            || !self.invalid_field_types.is_empty()
            || !self.structural_issues.is_empty()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_report_is_valid() {
        let report = ValidationReport::new();
        assert!(report.is_valid);
        assert!(!report.has_issues());
    }

    #[test]
    fn blocking_entries_invalidate() {
        let mut report = ValidationReport::new();
        report.warn("minor");
        assert!(report.is_valid);

        report.missing_field("tituloEstacao");
        assert!(!report.is_valid);
        assert!(report.has_issues());
    }

    #[test]
    fn corrections_do_not_invalidate() {
        let mut report = ValidationReport::new();
        report.correction("synthesized inadequado tier");
        assert!(report.is_valid);
    }

    #[test]
    fn merge_combines_entries_and_validity() {
        let mut a = ValidationReport::new();
        a.warn("w1");

        let mut b = ValidationReport::new();
        b.structural_issue("bad nesting");

        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.warnings, vec!["w1"]);
        assert_eq!(a.structural_issues, vec!["bad nesting"]);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let report = ValidationReport::new();
        let value = serde_json::to_value(&report).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "is_valid",
            "missing_required_fields",
            "invalid_field_types",
            "structural_issues",
            "warnings",
            "corrections_applied",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }
}
