use chrono::{Datelike, NaiveDate};

/// Values substituted into derived selector templates.
///
/// | placeholder  | value                        |
/// |--------------|------------------------------|
/// | `{YYYYMMDD}` | date, compact                |
/// | `{YYYY}`     | year                         |
/// | `{MM}`       | month, zero-padded           |
/// | `{DD}`       | day of month, zero-padded    |
/// | `{N}`        | day of month, no padding     |
/// | `{HH}`       | hour, zero-padded            |
/// | `{H}`        | hour, no padding             |
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars {
    pub date: Option<NaiveDate>,
    pub hour: Option<u32>,
}

impl TemplateVars {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            hour: None,
        }
    }

    pub fn for_slot(date: NaiveDate, hour: u32) -> Self {
        Self {
            date: Some(date),
            hour: Some(hour),
        }
    }

    pub fn render(&self, template: &str) -> String {
        if !template.contains('{') {
            return template.to_string();
        }
        let mut out = template.to_string();
        if let Some(date) = self.date {
            out = out
                .replace("{YYYYMMDD}", &date.format("%Y%m%d").to_string())
                .replace("{YYYY}", &format!("{:04}", date.year()))
                .replace("{MM}", &format!("{:02}", date.month()))
                .replace("{DD}", &format!("{:02}", date.day()))
                .replace("{N}", &date.day().to_string());
        }
        if let Some(hour) = self.hour {
            out = out
                .replace("{HH}", &format!("{:02}", hour))
                .replace("{H}", &hour.to_string());
        }
        out
    }
}
