//! Step-by-step trail of a multi-step verification flow.
//!
//! Each step records whether it succeeded and a message key that operators
//! can localize. Arguments are plain values such as user names; credentials
//! and ticket ids must never be recorded.

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticStep {
    pub id: &'static str,
    pub success: bool,
    pub args: Vec<String>,
}

impl DiagnosticStep {
    /// Localizable message key: `authentication.step.<id>.<ok|failed>`.
    #[must_use]
    pub fn message_key(&self) -> String {
        let outcome = if self.success { "ok" } else { "failed" };
        format!("authentication.step.{}.{outcome}", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationDiagnostic {
    steps: Vec<DiagnosticStep>,
}

impl AuthenticationDiagnostic {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step<I, S>(&mut self, id: &'static str, success: bool, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(DiagnosticStep {
            id,
            success,
            args: args.into_iter().map(Into::into).collect(),
        });
    }

    #[must_use]
    pub fn steps(&self) -> &[DiagnosticStep] {
        &self.steps
    }

    /// First step that failed, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&DiagnosticStep> {
        self.steps.iter().find(|s| !s.success)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_step().is_none()
    }
}
