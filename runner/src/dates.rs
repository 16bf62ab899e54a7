//! `YYYYMMDD` dates, as used in every file name and CSV column.

use chrono::NaiveDate;

use crate::error::{Error, Result};

const FORMAT: &str = "%Y%m%d";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.len() != 8 {
        return Err(Error::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(FORMAT).to_string()
}

/// clap value parser for `--date` style arguments.
pub fn parse_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

/// `#[serde(with = "crate::dates::yyyymmdd")]`
pub mod yyyymmdd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        // CSV cells holding 20250307 may arrive as integers
        let raw = RawDate::deserialize(d)?;
        let text = match raw {
            RawDate::Int(n) => n.to_string(),
            RawDate::Text(s) => s,
        };
        super::parse_date(&text).map_err(serde::de::Error::custom)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Int(u64),
        Text(String),
    }
}
