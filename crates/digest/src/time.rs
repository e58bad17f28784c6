//! リクエストの日付指定から、JST の対象日を決定する。

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone as _, Utc};
use chrono_tz::{Asia::Tokyo, Tz};
use serde::Deserialize;

use crate::error::{DigestError, Result};

/// 日付の境界計算に使う基準タイムゾーン。
pub const REFERENCE_TZ: Tz = Tokyo;

/// `now` を JST に変換した日付を返す。
///
/// プロセス自体のタイムゾーンには依存しない。
pub fn today_jst(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&REFERENCE_TZ).date_naive()
}

/// `day` パラメータで指定できる相対日付。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Yesterday,
    DayBeforeYesterday,
}

impl RelativeDay {
    /// 今日から遡る日数。
    pub fn days_back(self) -> u64 {
        match self {
            RelativeDay::Today => 0,
            RelativeDay::Yesterday => 1,
            RelativeDay::DayBeforeYesterday => 2,
        }
    }
}

impl FromStr for RelativeDay {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "today" => Ok(RelativeDay::Today),
            "yesterday" => Ok(RelativeDay::Yesterday),
            "day_before_yesterday" => Ok(RelativeDay::DayBeforeYesterday),
            other => Err(DigestError::InvalidDay(other.to_string())),
        }
    }
}

/// リクエストの日付指定。HTTP のクエリパラメータと CLI 引数の両方から作られる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DaySelector {
    /// YYYY-MM-DD 形式の日付
    pub date: Option<String>,
    /// `today` / `yesterday` / `day_before_yesterday`
    pub day: Option<String>,
}

/// JST の 1 日分の範囲 `[start, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDay {
    /// JST の暦日
    pub date: NaiveDate,
    /// JST 0:00 の時刻
    pub start: DateTime<Utc>,
    /// `start` のちょうど 24 時間後
    pub end: DateTime<Utc>,
}

impl TargetDay {
    /// JST の暦日から範囲を作る。
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        let start = REFERENCE_TZ
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()?
            .with_timezone(&Utc);
        Some(Self {
            date,
            start,
            end: start + TimeDelta::days(1),
        })
    }

    /// 時刻がこの日の範囲に含まれるかどうか。
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl fmt::Display for TargetDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

/// 日付指定と現在時刻から対象日を決定する。
///
/// 優先順位は `date` > `day` > 今日。空文字列のパラメータは未指定として扱う。
pub fn resolve(selector: &DaySelector, now: DateTime<Utc>) -> Result<TargetDay> {
    let today = today_jst(now);

    let date = if let Some(raw) = non_empty(&selector.date) {
        let date = parse_date(raw)?;
        if date > today {
            return Err(DigestError::FutureDate(date));
        }
        date
    } else if let Some(raw) = non_empty(&selector.day) {
        let relative: RelativeDay = raw.parse()?;
        today
            .checked_sub_days(chrono::Days::new(relative.days_back()))
            .ok_or_else(|| DigestError::InvalidDay(raw.to_string()))?
    } else {
        today
    };

    TargetDay::from_date(date).ok_or_else(|| DigestError::InvalidDate(date.to_string()))
}

/// `YYYY-MM-DD` 形式の日付だけを受け付ける。
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DigestError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DigestError::InvalidDate(raw.to_string()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
