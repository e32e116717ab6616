//! Diagnostic assertion helpers.

use chtl::semantic::{Diagnostic, SemanticModel, Severity};

/// Codes of every diagnostic recorded so far, in order.
pub fn codes_of(model: &SemanticModel) -> Vec<String> {
    model
        .diagnostics()
        .iter()
        .filter_map(|d| d.code.as_deref().map(str::to_string))
        .collect()
}

fn describe(diagnostics: &[&Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assert the model recorded no error-level diagnostics.
pub fn assert_no_errors(model: &SemanticModel) {
    let errors: Vec<&Diagnostic> = model.errors().collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, got {}:\n{}",
        errors.len(),
        describe(&errors)
    );
}

/// Assert a diagnostic with `code` and `severity` was recorded.
pub fn assert_reported(model: &SemanticModel, code: &str, severity: Severity) {
    let all: Vec<&Diagnostic> = model.diagnostics().iter().collect();
    assert!(
        all.iter()
            .any(|d| d.code.as_deref() == Some(code) && d.severity == severity),
        "Expected a {} {}, got:\n{}",
        severity.as_str(),
        code,
        describe(&all)
    );
}
