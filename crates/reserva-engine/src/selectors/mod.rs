//! Selector registry: the "plan A" locators for every logical element, plus the
//! templates that derive day and time-slot locators from the request.

pub mod registry;
pub mod template;

pub use registry::{SelectorEntry, SelectorRegistry, SelectorSpec, UrlParams};
pub use template::TemplateVars;

pub mod keys {
    pub const LOGIN_ID: &str = "login.id_input";
    pub const LOGIN_PASSWORD: &str = "login.pw_input";
    pub const LOGIN_SUBMIT: &str = "login.submit_button";
    pub const PAGE_READY_MARKER: &str = "reservation.page_ready_marker";
    pub const DAY_CELL: &str = "reservation.day_cell";
    pub const TIMETABLE: &str = "reservation.timetable";
    pub const TIME_SLOT: &str = "reservation.time_slot";
    pub const NEXT_BUTTON: &str = "reservation.next_button";
    pub const AGREE_CHECKBOX: &str = "agree.checkbox";
    pub const ATTENDEE_COUNT: &str = "agree.attendee_count";
    pub const PURPOSE: &str = "agree.purpose";

    pub const REQUIRED: &[&str] = &[
        LOGIN_ID,
        LOGIN_PASSWORD,
        LOGIN_SUBMIT,
        DAY_CELL,
        TIMETABLE,
        TIME_SLOT,
        NEXT_BUTTON,
        AGREE_CHECKBOX,
        ATTENDEE_COUNT,
        PURPOSE,
    ];
}
