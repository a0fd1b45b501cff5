//! The immutable description of one reservation attempt.

use crate::error::RequestError;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use url::Url;

/// When the pipeline should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenAt {
    /// Start right away.
    Immediate,
    /// Start at the next occurrence of this local time of day.
    At(NaiveTime),
}

impl FromStr for OpenAt {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("now") || trimmed.eq_ignore_ascii_case("immediate") {
            return Ok(OpenAt::Immediate);
        }
        NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map(OpenAt::At)
            .map_err(|_| RequestError::OpenTime(s.to_string()))
    }
}

impl fmt::Display for OpenAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenAt::Immediate => write!(f, "immediate"),
            OpenAt::At(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// Login identity. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"***")
            .finish()
    }
}

/// Raw, unvalidated request values as produced by an input collector.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub date: String,
    pub open_at: OpenAt,
    pub start_hour: u32,
    pub duration_hours: u32,
    pub attendee_count: u32,
    pub purpose: String,
    pub credentials: Credentials,
    pub login_url: String,
    pub reservation_base_url: String,
}

impl RequestDraft {
    pub fn validate(self) -> Result<ReservationRequest, RequestError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| RequestError::Date(self.date.clone()))?;
        if self.start_hour > 23 {
            return Err(RequestError::StartHour(self.start_hour));
        }
        if self.duration_hours == 0 {
            return Err(RequestError::ZeroDuration);
        }
        match self.start_hour.checked_add(self.duration_hours) {
            Some(end) if end <= 24 => {}
            _ => {
                return Err(RequestError::HourRange {
                    start: self.start_hour,
                    duration: self.duration_hours,
                });
            }
        }
        if self.attendee_count == 0 {
            return Err(RequestError::ZeroAttendees);
        }
        if self.credentials.id.is_empty() {
            return Err(RequestError::Missing("user id"));
        }
        if self.credentials.password.is_empty() {
            return Err(RequestError::Missing("password"));
        }
        let login_url = parse_url("login", &self.login_url)?;
        let reservation_base_url = parse_url("reservation", &self.reservation_base_url)?;

        Ok(ReservationRequest {
            date,
            open_at: self.open_at,
            start_hour: self.start_hour,
            duration_hours: self.duration_hours,
            attendee_count: self.attendee_count,
            purpose: self.purpose,
            credentials: self.credentials,
            login_url,
            reservation_base_url,
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::Missing(field));
    }
    Url::parse(value.trim()).map_err(|e| RequestError::Url {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// A validated reservation request. Read-only once built.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    date: NaiveDate,
    open_at: OpenAt,
    start_hour: u32,
    duration_hours: u32,
    attendee_count: u32,
    purpose: String,
    credentials: Credentials,
    login_url: Url,
    reservation_base_url: Url,
}

impl ReservationRequest {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn open_at(&self) -> OpenAt {
        self.open_at
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn duration_hours(&self) -> u32 {
        self.duration_hours
    }

    /// Requested hours in ascending order: `[start, start + duration)`.
    pub fn hours(&self) -> Range<u32> {
        self.start_hour..self.start_hour + self.duration_hours
    }

    pub fn attendee_count(&self) -> u32 {
        self.attendee_count
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn reservation_base_url(&self) -> &Url {
        &self.reservation_base_url
    }
}
