use super::keys;
use super::template::TemplateVars;
use crate::config::loader::ConfigError;
use crate::error::StepError;
use reserva_common::locator::Locator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// A selector file entry: either a bare CSS string or a primary plus fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorEntry {
    Plain(String),
    Full {
        primary: String,
        #[serde(default)]
        fallbacks: Vec<Locator>,
    },
}

impl SelectorEntry {
    fn with_fallbacks(primary: &str, fallbacks: Vec<Locator>) -> Self {
        SelectorEntry::Full {
            primary: primary.to_string(),
            fallbacks,
        }
    }
}

/// Query parameter names the navigation step injects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParams {
    pub year: String,
    pub month: String,
}

impl Default for UrlParams {
    fn default() -> Self {
        Self {
            year: "sYear".into(),
            month: "sMonth".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelectorFile {
    #[serde(default)]
    url_params: Option<UrlParams>,
    #[serde(flatten)]
    groups: BTreeMap<String, BTreeMap<String, SelectorEntry>>,
}

/// A resolved element locator: primary CSS first, then fallbacks in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    pub key: String,
    pub primary: String,
    pub fallbacks: Vec<Locator>,
}

impl SelectorSpec {
    pub fn new(key: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            primary: primary.into(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, locator: Locator) -> Self {
        self.fallbacks.push(locator);
        self
    }

    /// All strategies in the order they must be tried.
    pub fn strategies(&self) -> Vec<Locator> {
        std::iter::once(Locator::Css(self.primary.clone()))
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

/// Read-only table of logical element keys (`group.name`) to locators.
#[derive(Debug, Clone)]
pub struct SelectorRegistry {
    entries: BTreeMap<String, SelectorEntry>,
    url_params: UrlParams,
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SelectorRegistry {
    /// An empty registry; every lookup misses.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            url_params: UrlParams::default(),
        }
    }

    /// Locators observed on the reservation site the tool was built for.
    pub fn builtin() -> Self {
        let next_label = "다음단계";
        let entries = [
            (
                keys::LOGIN_ID,
                SelectorEntry::with_fallbacks(
                    "#userId",
                    vec![Locator::css("input[name='userId']"), Locator::css("input[name='id']")],
                ),
            ),
            (
                keys::LOGIN_PASSWORD,
                SelectorEntry::with_fallbacks(
                    "#userPw",
                    vec![Locator::css("input[type='password']")],
                ),
            ),
            (
                keys::LOGIN_SUBMIT,
                SelectorEntry::with_fallbacks(
                    "button[type='submit']",
                    vec![
                        Locator::css("input[type='submit']"),
                        Locator::text("button", "로그인"),
                    ],
                ),
            ),
            (keys::DAY_CELL, SelectorEntry::Plain("#day{N}".into())),
            (keys::TIMETABLE, SelectorEntry::Plain("ul.timetable_list".into())),
            (
                keys::TIME_SLOT,
                SelectorEntry::with_fallbacks(
                    "#erntTime_{HH}",
                    vec![
                        Locator::css(r#"input[name="erntYmdh"][value="{YYYYMMDD}{HH}"]"#),
                        Locator::label("{HH}:00"),
                    ],
                ),
            ),
            (
                keys::NEXT_BUTTON,
                SelectorEntry::with_fallbacks(
                    &format!(r#"input.p-button.write[type="submit"][value="{}"]"#, next_label),
                    vec![
                        Locator::css(format!(r#"input[type="submit"][value="{}"]"#, next_label)),
                        Locator::Attribute {
                            tag: Some("input".into()),
                            name: "value".into(),
                            value: next_label.into(),
                        },
                        Locator::css("button, a"),
                    ],
                ),
            ),
            (keys::AGREE_CHECKBOX, SelectorEntry::Plain("#checkAgress".into())),
            (keys::ATTENDEE_COUNT, SelectorEntry::Plain("#expectNmpr".into())),
            (keys::PURPOSE, SelectorEntry::Plain("#usePurps".into())),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            url_params: UrlParams::default(),
        }
    }

    /// Parse a selector file. `.json` files use JSON, anything else YAML.
    pub fn parse(content: &str, json: bool) -> Result<Self, ConfigError> {
        let file: SelectorFile = if json {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };

        let mut registry = Self::empty();
        if let Some(params) = file.url_params {
            registry.url_params = params;
        }
        for (group, names) in file.groups {
            for (name, entry) in names {
                registry.entries.insert(format!("{}.{}", group, name), entry);
            }
        }
        Ok(registry)
    }

    /// Load a selector file and layer it over the built-in table.
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let overrides = Self::parse(&content, json)?;
        info!(
            "Loaded {} selector entries from {}",
            overrides.entries.len(),
            path.display()
        );
        Ok(Self::builtin().merged(overrides))
    }

    /// Load from an explicit path, or from default locations:
    /// 1. ./selectors.yaml
    /// 2. ./config_selectors.json
    /// 3. Built-in table
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path).await;
        }
        for candidate in ["./selectors.yaml", "./config_selectors.json"] {
            let candidate = PathBuf::from(candidate);
            if candidate.exists() {
                return Self::from_file(&candidate).await;
            }
        }
        Ok(Self::builtin())
    }

    /// Entries (and url params) from `other` replace ours key by key.
    pub fn merged(mut self, other: SelectorRegistry) -> Self {
        self.entries.extend(other.entries);
        if other.url_params != UrlParams::default() {
            self.url_params = other.url_params;
        }
        self
    }

    pub fn url_params(&self) -> &UrlParams {
        &self.url_params
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Required keys with no entry.
    pub fn missing_required(&self) -> Vec<&'static str> {
        keys::REQUIRED
            .iter()
            .copied()
            .filter(|k| !self.contains(k))
            .collect()
    }

    /// Resolve `key`, substituting template placeholders with `vars`.
    pub fn resolve(&self, key: &str, vars: &TemplateVars) -> Option<SelectorSpec> {
        let entry = self.entries.get(key)?;
        let spec = match entry {
            SelectorEntry::Plain(primary) => SelectorSpec::new(key, vars.render(primary)),
            SelectorEntry::Full { primary, fallbacks } => SelectorSpec {
                key: key.to_string(),
                primary: vars.render(primary),
                fallbacks: fallbacks
                    .iter()
                    .map(|loc| loc.map_strings(|s| vars.render(s)))
                    .collect(),
            },
        };
        Some(spec)
    }

    pub fn spec(&self, key: &str) -> Option<SelectorSpec> {
        self.resolve(key, &TemplateVars::none())
    }

    /// Like `resolve`, but a missing key is a fatal locator failure.
    pub fn require(&self, key: &str, vars: &TemplateVars) -> Result<SelectorSpec, StepError> {
        self.resolve(key, vars)
            .ok_or_else(|| StepError::exhausted(key, "no selector configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_builtin_covers_required_keys() {
        assert!(SelectorRegistry::builtin().missing_required().is_empty());
    }

    #[test]
    fn test_json_file_shape() {
        let json = r##"{
            "login": { "id_input": "#id", "pw_input": "#pw", "submit_button": "#go" },
            "reservation": { "page_ready_marker": "#calendar" }
        }"##;
        let registry = SelectorRegistry::builtin()
            .merged(SelectorRegistry::parse(json, true).unwrap());
        assert_eq!(registry.spec(keys::LOGIN_ID).unwrap().primary, "#id");
        assert!(registry.spec(keys::LOGIN_ID).unwrap().fallbacks.is_empty());
        assert_eq!(
            registry.spec(keys::PAGE_READY_MARKER).unwrap().primary,
            "#calendar"
        );
        // untouched builtin entries survive the merge
        assert_eq!(registry.spec(keys::PURPOSE).unwrap().primary, "#usePurps");
    }

    #[test]
    fn test_yaml_with_fallbacks_and_params() {
        let yaml = r##"
url_params:
  year: y
  month: m
reservation:
  next_button:
    primary: "#next"
    fallbacks:
      - css: "input[type=submit]"
      - text: { tag: a, contains: "Next" }
"##;
        let registry = SelectorRegistry::parse(yaml, false).unwrap();
        let spec = registry.spec(keys::NEXT_BUTTON).unwrap();
        assert_eq!(
            spec.strategies(),
            vec![
                Locator::css("#next"),
                Locator::css("input[type=submit]"),
                Locator::text("a", "Next"),
            ]
        );
        assert_eq!(registry.url_params().year, "y");
    }

    #[tokio::test]
    async fn test_load_yaml_file_over_builtin() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "login:\n  id_input: \"#member-id\"").unwrap();

        let registry = SelectorRegistry::load(Some(file.path())).await.unwrap();
        assert_eq!(registry.spec(keys::LOGIN_ID).unwrap().primary, "#member-id");
        assert_eq!(registry.spec(keys::PURPOSE).unwrap().primary, "#usePurps");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SelectorRegistry::from_file(&dir.path().join("absent.yaml")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_time_slot_template_order() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let spec = SelectorRegistry::builtin()
            .resolve(keys::TIME_SLOT, &TemplateVars::for_slot(date, 9))
            .unwrap();
        assert_eq!(
            spec.strategies(),
            vec![
                Locator::css("#erntTime_09"),
                Locator::css(r#"input[name="erntYmdh"][value="2025120109"]"#),
                Locator::label("09:00"),
            ]
        );
    }

    #[test]
    fn test_require_missing_key() {
        let err = SelectorRegistry::empty()
            .require(keys::DAY_CELL, &TemplateVars::none())
            .unwrap_err();
        assert_eq!(err.kind(), "locator_exhausted");
    }
}
