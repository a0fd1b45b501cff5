//! Element locator strategies and the DOM operations applied to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One way of finding an element on the page.
///
/// Serialized externally tagged so selector files read naturally:
///
/// ```yaml
/// - css: "input[type=submit]"
/// - text: { tag: a, contains: "Next" }
/// - attribute: { tag: input, name: value, value: "Next" }
/// - label: "09:00"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector, first match wins.
    Css(String),
    /// Element of `tag` whose normalized text contains `contains`.
    Text { tag: String, contains: String },
    /// Element (optionally restricted to `tag`) whose attribute `name` equals `value`.
    Attribute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        name: String,
        value: String,
    },
    /// Form control associated with a `<label>` whose text contains the string.
    Label(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(tag: impl Into<String>, contains: impl Into<String>) -> Self {
        Locator::Text {
            tag: tag.into(),
            contains: contains.into(),
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label(text.into())
    }

    /// Strategy name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css",
            Locator::Text { .. } => "text",
            Locator::Attribute { .. } => "attribute",
            Locator::Label(_) => "label",
        }
    }

    /// Apply `f` to every string carried by the locator.
    ///
    /// Used for placeholder substitution in derived selectors.
    pub fn map_strings(&self, f: impl Fn(&str) -> String) -> Locator {
        match self {
            Locator::Css(s) => Locator::Css(f(s)),
            Locator::Text { tag, contains } => Locator::Text {
                tag: f(tag),
                contains: f(contains),
            },
            Locator::Attribute { tag, name, value } => Locator::Attribute {
                tag: tag.as_deref().map(&f),
                name: f(name),
                value: f(value),
            },
            Locator::Label(s) => Locator::Label(f(s)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css({})", s),
            Locator::Text { tag, contains } => write!(f, "text({} ~ '{}')", tag, contains),
            Locator::Attribute { tag, name, value } => match tag {
                Some(tag) => write!(f, "attr({}[{}='{}'])", tag, name, value),
                None => write!(f, "attr([{}='{}'])", name, value),
            },
            Locator::Label(s) => write!(f, "label('{}')", s),
        }
    }
}

/// Operation applied to a located element through direct DOM access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum DomOp {
    /// Presence only.
    Probe,
    /// Present and rendered with a non-empty box.
    Visible,
    /// `el.click()` without pointer simulation.
    Click,
    /// Set `checked` and dispatch `input` + `change`.
    Check,
    /// Set `value` and dispatch `input` + `change`.
    SetValue(String),
}

impl DomOp {
    pub fn name(&self) -> &'static str {
        match self {
            DomOp::Probe => "probe",
            DomOp::Visible => "visible",
            DomOp::Click => "click",
            DomOp::Check => "check",
            DomOp::SetValue(_) => "set_value",
        }
    }
}

/// What the page reported for one `DomOp` attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomReply {
    /// The locator matched an element.
    pub found: bool,
    /// The operation's effect was observed (visible, clicked, checked, value set).
    pub done: bool,
}

impl DomReply {
    pub const MISSING: DomReply = DomReply {
        found: false,
        done: false,
    };

    pub fn done() -> Self {
        DomReply {
            found: true,
            done: true,
        }
    }

    pub fn found_only() -> Self {
        DomReply {
            found: true,
            done: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.found && self.done
    }
}
