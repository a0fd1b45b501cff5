//! Per-user settings from the environment (optionally loaded from `.env`).

use anyhow::{Context, Result, bail};
use reserva_engine::request::Credentials;
use std::io::{self, BufRead, Write};

pub const DEFAULT_PEOPLE: u32 = 2;
pub const DEFAULT_PURPOSE: &str = "테니스";

#[derive(Debug, Clone)]
pub struct Settings {
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub login_url: Option<String>,
    pub reservation_url: Option<String>,
    pub people: u32,
    pub purpose: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let people = match get("PEOPLE") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PEOPLE must be a positive number, got '{}'", raw))?,
            None => DEFAULT_PEOPLE,
        };

        Ok(Self {
            user_id: get("USER_ID"),
            password: get("USER_PW"),
            login_url: get("LOGIN_URL"),
            reservation_url: get("RESERVATION_URL"),
            people,
            purpose: get("PURPOSE").unwrap_or_else(|| DEFAULT_PURPOSE.to_string()),
        })
    }

    /// Credentials from the environment, prompting on stdin for what is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        let id = match &self.user_id {
            Some(id) => id.clone(),
            None => prompt("User ID: ")?,
        };
        let password = match &self.password {
            Some(pw) => pw.clone(),
            None => prompt("Password: ")?,
        };
        Ok(Credentials { id, password })
    }
}

fn prompt(label: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", label)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("{} is required", label.trim_end_matches([':', ' ']));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.people, 2);
        assert_eq!(settings.purpose, "테니스");
        assert!(settings.user_id.is_none());
    }

    #[test]
    fn test_values_from_lookup() {
        let settings = Settings::from_lookup(lookup(&[
            ("USER_ID", "alice"),
            ("USER_PW", "pw"),
            ("PEOPLE", " 4 "),
            ("PURPOSE", "배드민턴"),
            ("LOGIN_URL", ""),
        ]))
        .unwrap();
        assert_eq!(settings.people, 4);
        assert_eq!(settings.purpose, "배드민턴");
        assert!(settings.login_url.is_none());

        let credentials = settings.credentials().unwrap();
        assert_eq!(credentials.id, "alice");
        assert_eq!(credentials.password, "pw");
    }

    #[test]
    fn test_bad_people() {
        assert!(Settings::from_lookup(lookup(&[("PEOPLE", "two")])).is_err());
    }
}
