//! Notion データベースとの連携機能を提供する。
//!
//! 行動ログの読み出しとサマリーページの作成・アーカイブを扱う。

pub mod blocks;
mod client;
pub mod objects;

pub use client::NotionClient;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::logs::LogEntry;
use objects::{Block, PageProperty};

/// データベースプロパティの型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    CreatedTime,
    Date,
    Other(String),
}

impl PropertyKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "title" => PropertyKind::Title,
            "created_time" => PropertyKind::CreatedTime,
            "date" => PropertyKind::Date,
            other => PropertyKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyKind::Title => "title",
            PropertyKind::CreatedTime => "created_time",
            PropertyKind::Date => "date",
            PropertyKind::Other(kind) => kind,
        }
    }
}

/// データベースのプロパティ名 → 型。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub properties: BTreeMap<String, PropertyKind>,
}

impl DatabaseSchema {
    pub fn new<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyKind)>,
        K: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        }
    }

    /// 指定した型を持つ最初のプロパティ名を返す。
    pub fn find(&self, kind: &PropertyKind) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(name, _)| name.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.find(&PropertyKind::Title)
    }

    pub fn created_time(&self) -> Option<&str> {
        self.find(&PropertyKind::CreatedTime)
    }

    pub fn date(&self) -> Option<&str> {
        self.find(&PropertyKind::Date)
    }
}

/// 行動ログの検索条件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// 本文を持つ title プロパティ名
    pub title_property: String,
    /// 作成日時の created_time プロパティ名
    pub created_time_property: String,
    /// この時刻以降に作成されたもの
    pub start: DateTime<Utc>,
    /// この時刻より前に作成されたもの
    pub end: DateTime<Utc>,
}

/// 作成するページ。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPage {
    /// プロパティ名 → プロパティ値
    pub properties: BTreeMap<String, PageProperty>,
    pub children: Vec<Block>,
}

/// 作成されたページ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub url: String,
}

/// ログとサマリーを保存している Notion ワークスペース。
#[async_trait]
pub trait PageStore: Send + Sync {
    /// データベースのプロパティ定義を取得する。
    async fn schema(&self, database_id: &str) -> Result<DatabaseSchema>;

    /// 作成日時が範囲内のログを作成日時の昇順で取得する。
    async fn query_logs(&self, database_id: &str, query: &LogQuery) -> Result<Vec<LogEntry>>;

    /// タイトルが完全一致するアーカイブされていないページの ID を返す。
    async fn find_live_by_title(
        &self,
        database_id: &str,
        title_property: &str,
        title: &str,
    ) -> Result<Vec<String>>;

    /// ページをアーカイブする（削除はしない）。
    async fn archive(&self, page_id: &str) -> Result<()>;

    async fn create(&self, database_id: &str, page: &NewPage) -> Result<PageRef>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lookup_by_kind() {
        let schema = DatabaseSchema::new([
            ("Name", PropertyKind::Title),
            ("Created time", PropertyKind::CreatedTime),
            ("Tags", PropertyKind::Other("multi_select".into())),
        ]);
        assert_eq!(schema.title(), Some("Name"));
        assert_eq!(schema.created_time(), Some("Created time"));
        assert_eq!(schema.date(), None);
    }

    #[test]
    fn property_kind_round_trip() {
        for kind in ["title", "created_time", "date", "rich_text"] {
            assert_eq!(PropertyKind::from_type(kind).as_str(), kind);
        }
    }
}
