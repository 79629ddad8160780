use crate::codegen::literal::quote;
use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};

/// Assertion kinds understood by the command builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    ToBeVisible,
    ToHaveText,
    ToHaveValue,
    ToBeEnabled,
    ToBeDisabled,
    ToHaveCount,
}

impl AssertionKind {
    /// Playwright matcher name for this kind
    pub fn matcher(self) -> &'static str {
        match self {
            AssertionKind::ToBeVisible => "toBeVisible",
            AssertionKind::ToHaveText => "toHaveText",
            AssertionKind::ToHaveValue => "toHaveValue",
            AssertionKind::ToBeEnabled => "toBeEnabled",
            AssertionKind::ToBeDisabled => "toBeDisabled",
            AssertionKind::ToHaveCount => "toHaveCount",
        }
    }
}

/// An assertion with its expected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Visible,
    HaveText(String),
    HaveValue(String),
    Enabled,
    Disabled,
    HaveCount(usize),
}

impl Assertion {
    /// Validate a kind plus expected value into an assertion
    pub fn from_kind(kind: AssertionKind, expected: Option<&str>) -> Result<Self> {
        let invalid = |reason: &str| RecorderError::InvalidActionValue {
            action: kind.matcher().to_string(),
            reason: reason.to_string(),
        };

        Ok(match kind {
            AssertionKind::ToBeVisible => Assertion::Visible,
            AssertionKind::ToBeEnabled => Assertion::Enabled,
            AssertionKind::ToBeDisabled => Assertion::Disabled,
            AssertionKind::ToHaveText => {
                Assertion::HaveText(expected.ok_or_else(|| invalid("an expected text is required"))?.to_string())
            }
            AssertionKind::ToHaveValue => {
                Assertion::HaveValue(expected.ok_or_else(|| invalid("an expected value is required"))?.to_string())
            }
            AssertionKind::ToHaveCount => {
                let count = expected
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .ok_or_else(|| invalid("a non-negative integer count is required"))?;
                Assertion::HaveCount(count)
            }
        })
    }

    /// The payload-free kind of this assertion
    pub fn kind(&self) -> AssertionKind {
        match self {
            Assertion::Visible => AssertionKind::ToBeVisible,
            Assertion::HaveText(_) => AssertionKind::ToHaveText,
            Assertion::HaveValue(_) => AssertionKind::ToHaveValue,
            Assertion::Enabled => AssertionKind::ToBeEnabled,
            Assertion::Disabled => AssertionKind::ToBeDisabled,
            Assertion::HaveCount(_) => AssertionKind::ToHaveCount,
        }
    }

    /// Whether locators for this assertion must skip the visible-text strategy
    pub fn excludes_text(&self) -> bool {
        matches!(self, Assertion::HaveText(_))
    }

    /// Render the assertion statement for `locator`
    pub fn statement(&self, locator: &str) -> String {
        let argument = match self {
            Assertion::HaveText(text) | Assertion::HaveValue(text) => quote(text),
            Assertion::HaveCount(count) => count.to_string(),
            Assertion::Visible | Assertion::Enabled | Assertion::Disabled => String::new(),
        };
        format!("await expect({}).{}({});", locator, self.kind().matcher(), argument)
    }
}
