//! 行動ログを JST の時間帯ごとに振り分ける。

use std::fmt;

use chrono::{DateTime, Timelike as _, Utc};

use crate::time::REFERENCE_TZ;

/// 3 時間枠の数。
pub const THREE_HOURLY_BUCKETS: usize = 8;

/// 行動ログ 1 件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// ログ本文（空ではない）
    pub content: String,
    /// 作成時刻
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            created_at,
        }
    }

    /// JST での時 (0-23)。
    pub fn local_hour(&self) -> u32 {
        self.created_at.with_timezone(&REFERENCE_TZ).hour()
    }
}

/// 要約の単位となる区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Today,
    Am,
    Pm,
    /// `[3i, 3i+3)` 時の枠
    ThreeHourly(usize),
}

impl Section {
    /// 全 11 区分をページ上の表示順で返す。
    pub fn all() -> impl Iterator<Item = Section> {
        [Section::Today, Section::Am, Section::Pm]
            .into_iter()
            .chain((0..THREE_HOURLY_BUCKETS).map(Section::ThreeHourly))
    }

    /// SummarySet のキー (`today`, `am`, `pm`, `threeHourly0`..`threeHourly7`)。
    pub fn key(self) -> String {
        match self {
            Section::Today => "today".to_string(),
            Section::Am => "am".to_string(),
            Section::Pm => "pm".to_string(),
            Section::ThreeHourly(i) => format!("threeHourly{i}"),
        }
    }

    /// ページ上の見出し。
    pub fn heading(self) -> String {
        match self {
            Section::Today => "TODAY".to_string(),
            Section::Am => "AM".to_string(),
            Section::Pm => "PM".to_string(),
            Section::ThreeHourly(i) => {
                let start = i * 3;
                let end = (start + 3) % 24;
                format!("{start:02}:00–{end:02}:00")
            }
        }
    }

    /// 半日以上の広い区分かどうか。広い区分は抽象度の高い要約を使う。
    pub fn is_broad(self) -> bool {
        !matches!(self, Section::ThreeHourly(_))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// 時間帯ごとに振り分けたログ本文。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLogs {
    pub today: Vec<String>,
    pub am: Vec<String>,
    pub pm: Vec<String>,
    pub three_hourly: [Vec<String>; THREE_HOURLY_BUCKETS],
}

impl CategorizedLogs {
    /// 区分に対応するログ本文を返す。範囲外の 3 時間枠は空。
    pub fn section(&self, section: Section) -> &[String] {
        match section {
            Section::Today => &self.today,
            Section::Am => &self.am,
            Section::Pm => &self.pm,
            Section::ThreeHourly(i) => self.three_hourly.get(i).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

/// ログを JST の時で振り分ける。入力順は各区分内で保たれる。
pub fn categorize(entries: &[LogEntry]) -> CategorizedLogs {
    let mut logs = CategorizedLogs::default();

    for entry in entries {
        let hour = entry.local_hour() as usize;
        let content = entry.content.clone();

        if hour < 12 {
            logs.am.push(content.clone());
        } else {
            logs.pm.push(content.clone());
        }
        logs.three_hourly[hour / 3].push(content.clone());
        logs.today.push(content);
    }

    logs
}
