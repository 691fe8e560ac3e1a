//! Step definitions and computed step statuses.
//!
//! A web proof flow is an ordered list of [`WebProofStep`]s, usually shipped
//! as JSON next to the application that requests the proof:
//!
//! ```json
//! [
//!   {"step": "startPage", "url": "https://bank.example/login", "label": "Log in"},
//!   {"step": "expectUrl", "url": "https://bank.example/dashboard", "label": "Dashboard"},
//!   {"step": "notarize", "url": "https://api.bank.example/v1/accounts*",
//!    "method": "GET", "label": "Prove balance"}
//! ]
//! ```
//!
//! The `label` is the stable identity of a step; assertion results are stored
//! under it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use webproof_core::redaction::RedactionConfig;

use crate::errors::{StepError, StepResult};
use crate::url_pattern::UrlPattern;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationStep {
    pub url: String,
    pub label: String,
}

/// A named value extracted from the notarized response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    pub name: String,
    /// Dotted JSON path into the response body.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizeStep {
    pub url: String,
    pub method: String,
    pub label: String,
    #[serde(default)]
    pub redaction: RedactionConfig,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Require {
    Exist,
    NotExist,
}

impl Require {
    /// Whether observing an element (or its absence) satisfies the requirement.
    pub fn is_satisfied_by(self, present: bool) -> bool {
        match self {
            Require::Exist => present,
            Require::NotExist => !present,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomAssertion {
    /// CSS selector evaluated in the active tab.
    pub dom_element: String,
    pub require: Require,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionStep {
    pub url: String,
    pub label: String,
    pub instruction: String,
    pub assertion: DomAssertion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractVariablesStep {
    pub url: String,
    pub label: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickButtonStep {
    pub url: String,
    pub label: String,
    pub selector: String,
}

/// One step of a guided flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum WebProofStep {
    StartPage(NavigationStep),
    Redirect(NavigationStep),
    ExpectUrl(NavigationStep),
    Notarize(NotarizeStep),
    UserAction(UserActionStep),
    ExtractVariables(ExtractVariablesStep),
    ClickButton(ClickButtonStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    StartPage,
    Redirect,
    ExpectUrl,
    Notarize,
    UserAction,
    ExtractVariables,
    ClickButton,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::StartPage => "startPage",
            StepKind::Redirect => "redirect",
            StepKind::ExpectUrl => "expectUrl",
            StepKind::Notarize => "notarize",
            StepKind::UserAction => "userAction",
            StepKind::ExtractVariables => "extractVariables",
            StepKind::ClickButton => "clickButton",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WebProofStep {
    pub fn kind(&self) -> StepKind {
        match self {
            WebProofStep::StartPage(_) => StepKind::StartPage,
            WebProofStep::Redirect(_) => StepKind::Redirect,
            WebProofStep::ExpectUrl(_) => StepKind::ExpectUrl,
            WebProofStep::Notarize(_) => StepKind::Notarize,
            WebProofStep::UserAction(_) => StepKind::UserAction,
            WebProofStep::ExtractVariables(_) => StepKind::ExtractVariables,
            WebProofStep::ClickButton(_) => StepKind::ClickButton,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            WebProofStep::StartPage(s) | WebProofStep::Redirect(s) | WebProofStep::ExpectUrl(s) => &s.label,
            WebProofStep::Notarize(s) => &s.label,
            WebProofStep::UserAction(s) => &s.label,
            WebProofStep::ExtractVariables(s) => &s.label,
            WebProofStep::ClickButton(s) => &s.label,
        }
    }

    /// URL pattern of the step.
    pub fn url(&self) -> &str {
        match self {
            WebProofStep::StartPage(s) | WebProofStep::Redirect(s) | WebProofStep::ExpectUrl(s) => &s.url,
            WebProofStep::Notarize(s) => &s.url,
            WebProofStep::UserAction(s) => &s.url,
            WebProofStep::ExtractVariables(s) => &s.url,
            WebProofStep::ClickButton(s) => &s.url,
        }
    }

    pub fn pattern(&self) -> StepResult<UrlPattern> {
        UrlPattern::new(self.url())
    }

    /// Check a single step in isolation.
    pub fn validate(&self) -> StepResult<()> {
        if self.label().trim().is_empty() {
            return Err(StepError::invalid_step(format!("{} step has an empty label", self.kind())));
        }
        self.pattern()?;

        match self {
            WebProofStep::Notarize(s) => {
                if s.method.trim().is_empty() {
                    return Err(StepError::invalid_step(format!("notarize step {:?} has no method", s.label)));
                }
                s.redaction.validate()?;
            }
            WebProofStep::UserAction(s) => {
                if s.assertion.dom_element.trim().is_empty() {
                    return Err(StepError::invalid_step(format!(
                        "userAction step {:?} has an empty domElement",
                        s.label
                    )));
                }
            }
            WebProofStep::ClickButton(s) => {
                if s.selector.trim().is_empty() {
                    return Err(StepError::invalid_step(format!("clickButton step {:?} has an empty selector", s.label)));
                }
            }
            WebProofStep::StartPage(_)
            | WebProofStep::Redirect(_)
            | WebProofStep::ExpectUrl(_)
            | WebProofStep::ExtractVariables(_) => {}
        }
        Ok(())
    }
}

/// Validate a whole flow: every step individually, plus unique labels.
pub fn validate_steps(steps: &[WebProofStep]) -> StepResult<()> {
    let mut seen = HashSet::new();
    for step in steps {
        step.validate()?;
        if !seen.insert(step.label()) {
            return Err(StepError::invalid_step(format!("duplicate step label {:?}", step.label())));
        }
    }
    Ok(())
}

/// Parse a flow from JSON and validate it.
pub fn steps_from_json_str(s: &str) -> StepResult<Vec<WebProofStep>> {
    let steps: Vec<WebProofStep> =
        serde_json::from_str(s).map_err(|e| StepError::Serialization(format!("failed to parse steps: {e}")))?;
    validate_steps(&steps)?;
    Ok(steps)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Completed,
    Current,
    Further,
}

/// A step as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub label: String,
    /// Page to open; only set for `startPage` steps.
    pub link: Option<String>,
    pub kind: StepKind,
    pub status: StepStatus,
}

impl Step {
    pub fn from_definition(def: &WebProofStep, status: StepStatus) -> Self {
        let link = match def {
            WebProofStep::StartPage(s) => Some(s.url.clone()),
            _ => None,
        };
        Self {
            label: def.label().to_string(),
            link,
            kind: def.kind(),
            status,
        }
    }
}
