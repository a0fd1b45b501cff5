use crate::selectors::UrlParams;
use chrono::{Datelike, NaiveDate};
use url::Url;

/// Inject the year and month of `date` into `base`'s query string.
///
/// Existing year/month parameters are dropped; every other pair keeps its order, and
/// scheme, host, path and fragment are untouched.
pub fn build_reservation_url(base: &Url, date: NaiveDate, params: &UrlParams) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != params.year.as_str() && k != params.month.as_str())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(&params.year, &format!("{:04}", date.year()))
        .append_pair(&params.month, &format!("{:02}", date.month()));
    url
}
