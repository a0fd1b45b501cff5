use thiserror::Error;

/// Errors raised by a page driver while talking to the browser.
#[derive(Debug, Error)]
pub enum DriverError {
    // ============================================================
    // Session Errors
    // ============================================================
    #[error("Driver not ready")]
    NotReady,

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    // ============================================================
    // Page Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    /// A native alert/confirm dialog blocked the command.
    #[error("Unexpected alert open: {0}")]
    UnexpectedAlert(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    // ============================================================
    // Plumbing
    // ============================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other: {0}")]
    Other(String),
}

/// A reservation request that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("start hour {0} is outside 0..=23")]
    StartHour(u32),

    #[error("duration must be at least one hour")]
    ZeroDuration,

    #[error("start hour {start} plus {duration} hour(s) runs past midnight")]
    HourRange { start: u32, duration: u32 },

    #[error("attendee count must be at least one")]
    ZeroAttendees,

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    Date(String),

    #[error("invalid open time '{0}' (expected HH:MM:SS, HH:MM or 'now')")]
    OpenTime(String),

    #[error("invalid {field} URL '{value}': {reason}")]
    Url {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("missing {0}")]
    Missing(&'static str),
}
