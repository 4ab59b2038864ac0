use std::collections::BTreeMap;

use time::{format_description::FormatItem, macros::format_description, Date};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Format a date as its `YYYY-MM-DD` cache key.
pub fn iso_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

pub fn parse_iso_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), ISO_DATE).ok()
}

#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid date key '{0}'")]
    InvalidDate(String),
    #[error("negative reading {value} on {date}")]
    NegativeReading { date: String, value: f64 },
}

/// Validated `date -> cumulative kWh` readings for one customer-month.
///
/// The wire format is a JSON object keyed by `YYYY-MM-DD`. Days whose reading
/// column was empty arrive as `null` and are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReadings {
    readings: BTreeMap<Date, f64>,
}

impl DailyReadings {
    pub fn from_payload(raw: BTreeMap<String, Option<f64>>) -> Result<Self, PayloadError> {
        let mut readings = BTreeMap::new();
        let mut skipped = 0usize;

        for (key, value) in raw {
            let date = parse_iso_date(&key).ok_or_else(|| PayloadError::InvalidDate(key.clone()))?;
            let Some(kwh) = value else {
                skipped += 1;
                continue;
            };
            if kwh < 0.0 || !kwh.is_finite() {
                return Err(PayloadError::NegativeReading { date: key, value: kwh });
            }
            readings.insert(date, kwh);
        }

        if skipped > 0 {
            tracing::debug!(skipped, "dropped days without a reading");
        }

        Ok(Self { readings })
    }

    pub fn from_json(body: &str) -> Result<Self, PayloadError> {
        let raw: BTreeMap<String, Option<f64>> = serde_json::from_str(body)?;
        Self::from_payload(raw)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn get(&self, date: Date) -> Option<f64> {
        self.readings.get(&date).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.readings.iter().map(|(d, v)| (*d, *v))
    }
}

impl FromIterator<(Date, f64)> for DailyReadings {
    fn from_iter<I: IntoIterator<Item = (Date, f64)>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_reading_object() {
        let r = DailyReadings::from_json(r#"{"2024-03-01": 1000, "2024-03-31": 1200.5}"#).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.get(date!(2024 - 03 - 01)), Some(1000.0));
        assert_eq!(r.get(date!(2024 - 03 - 31)), Some(1200.5));
    }

    #[test]
    fn null_readings_are_dropped() {
        let r = DailyReadings::from_json(r#"{"2024-03-01": null, "2024-03-02": 10}"#).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(date!(2024 - 03 - 01)), None);
    }

    #[test]
    fn rejects_bad_keys_and_values() {
        assert!(matches!(
            DailyReadings::from_json(r#"{"03/01/2024": 1}"#),
            Err(PayloadError::InvalidDate(key)) if key == "03/01/2024"
        ));
        assert!(matches!(
            DailyReadings::from_json(r#"{"2024-03-01": -1}"#),
            Err(PayloadError::NegativeReading { value, .. }) if value == -1.0
        ));
        assert!(matches!(
            DailyReadings::from_json(r#"{"2024-03-01": "1000"}"#),
            Err(PayloadError::Json(_))
        ));
        assert!(matches!(DailyReadings::from_json(r#"[1, 2]"#), Err(PayloadError::Json(_))));
    }

    #[test]
    fn iso_date_roundtrips_cache_key() {
        assert_eq!(iso_date(date!(2024 - 03 - 01)), "2024-03-01");
        assert_eq!(parse_iso_date("2024-03-01"), Some(date!(2024 - 03 - 01)));
        assert_eq!(parse_iso_date("2024-02-30"), None);
    }
}
