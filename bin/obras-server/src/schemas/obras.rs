//! Request shapes for the catalog endpoints that are not records themselves.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::ServerError;

/// Query string of `GET /file-obras`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Only export works created at or after this ISO-8601 instant.
    /// Timestamps without an offset are taken as UTC.
    pub data_inicial: Option<String>,
}

impl ExportQuery {
    pub fn since(&self) -> Result<Option<DateTime<Utc>>, ServerError> {
        self.data_inicial.as_deref().map(parse_filter_date).transpose()
    }
}

/// Multipart body of `POST /upload-obras` (documentation only).
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadObras {
    /// CSV document with `titulo`, `editora`, `foto` and `autores` columns.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse `data_inicial`: RFC 3339 with offset, a naive date-time (UTC), or a bare date.
pub fn parse_filter_date(raw: &str) -> Result<DateTime<Utc>, ServerError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(at.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(ServerError::Validation(format!(
        "data_inicial: `{raw}` is not a valid ISO-8601 datetime"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(parse_filter_date("2024-03-01T12:00:00Z").unwrap(), utc(12, 0, 0));
        assert_eq!(parse_filter_date("2024-03-01T14:00:00+02:00").unwrap(), utc(12, 0, 0));
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(parse_filter_date("2024-03-01T12:30:15").unwrap(), utc(12, 30, 15));
        assert_eq!(
            parse_filter_date("2024-03-01 12:30:15.5").unwrap(),
            utc(12, 30, 15) + chrono::Duration::milliseconds(500)
        );
        assert_eq!(parse_filter_date("2024-03-01T12:30").unwrap(), utc(12, 30, 0));
        assert_eq!(parse_filter_date("2024-03-01").unwrap(), utc(0, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_filter_date("ontem"), Err(ServerError::Validation(_))));
        assert!(matches!(parse_filter_date(""), Err(ServerError::Validation(_))));
    }

    #[test]
    fn absent_query_means_no_filter() {
        assert_eq!(ExportQuery::default().since().unwrap(), None);
    }
}
