use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::{Error, Result};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Inclusive range of calendar days in Japan Standard Time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| Error::InvalidDate(raw.to_string()))
}

fn jst() -> Result<FixedOffset> {
    FixedOffset::east_opt(JST_OFFSET_SECS)
        .ok_or_else(|| Error::InvalidConfig("invalid JST offset".to_string()))
}

impl DateRange {
    /// Parses `YYYYMMDD` bounds; `start` must not be after `end`.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_day = parse_day(start)?;
        let end_day = parse_day(end)?;
        if start_day > end_day {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start: start_day,
            end: end_day,
        })
    }

    /// 00:00:00 JST on the first day through 23:59:59 JST on the last, in UTC.
    pub fn to_utc(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let tz = jst()?;
        let at = |day: NaiveDate, h, m, s| -> Result<DateTime<Utc>> {
            let time = NaiveTime::from_hms_opt(h, m, s)
                .ok_or_else(|| Error::InvalidDate(day.format("%Y%m%d").to_string()))?;
            tz.from_local_datetime(&day.and_time(time))
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| Error::InvalidDate(day.format("%Y%m%d").to_string()))
        };
        Ok((at(self.start, 0, 0, 0)?, at(self.end, 23, 59, 59)?))
    }

    /// `YYYY-MM-DDTHH:MM:SSZ` bounds.
    pub fn to_utc_iso(&self) -> Result<(String, String)> {
        let (from, to) = self.to_utc()?;
        let fmt = "%Y-%m-%dT%H:%M:%SZ";
        Ok((from.format(fmt).to_string(), to.format(fmt).to_string()))
    }

    /// `YYYYMMDD` for a single day, `YYYYMMDD-YYYYMMDD` otherwise.
    pub fn file_label(&self) -> String {
        let start = self.start.format("%Y%m%d");
        if self.start == self.end {
            start.to_string()
        } else {
            format!("{start}-{}", self.end.format("%Y%m%d"))
        }
    }
}
