//! Notion REST API クライアント。

use std::collections::BTreeMap;

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::objects::{Block, Database, Page, PageProperty, Parent};
use super::{DatabaseSchema, LogQuery, NewPage, PageRef, PageStore, PropertyKind};
use crate::logs::LogEntry;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
/// データベースクエリ 1 回あたりの最大件数。
const PAGE_SIZE: u32 = 100;

/// データベースクエリの絞り込み条件。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum Filter {
    And {
        and: Vec<Filter>,
    },
    Property {
        property: String,
        #[serde(flatten)]
        condition: PropertyCondition,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum PropertyCondition {
    Title(TextCondition),
    CreatedTime(DateCondition),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum TextCondition {
    Equals(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum DateCondition {
    OnOrAfter(DateTime<Utc>),
    Before(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Timestamp {
    CreatedTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Direction {
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Sort {
    timestamp: Timestamp,
    direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct QueryDatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sorts: Option<Vec<Sort>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct QueryDatabaseResponse {
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    parent: Parent,
    properties: &'a BTreeMap<String, PageProperty>,
    children: &'a [Block],
}

#[derive(Debug, Default, Serialize)]
struct UpdatePageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
}

/// Notion API クライアント。
pub struct NotionClient {
    http_client: reqwest::Client,
    token: String,
}

impl NotionClient {
    /// 新しい NotionClient を作成する。
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client for Notion")?;
        Ok(Self {
            http_client,
            token: token.into(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{NOTION_API_BASE}{path}"))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// リクエストを送信し、成功レスポンスを返す。
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to {action}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Failed to {action}: status = {status}, body = {body}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response to {action}"))
    }

    /// データベースをクエリし、全ページを取得する。
    async fn query_all(&self, database_id: &str, filter: Filter) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut request = query_request(filter);

        loop {
            let http = self
                .request(reqwest::Method::POST, &format!("/databases/{database_id}/query"))
                .json(&request);
            let response: QueryDatabaseResponse = self.send(http, "query Notion database").await?;

            pages.extend(response.results);
            match response.next_cursor {
                Some(next) if response.has_more => request.start_cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }
}

fn parse_schema(database: Database) -> DatabaseSchema {
    DatabaseSchema::new(
        database
            .properties
            .into_iter()
            .map(|(name, property)| (name, PropertyKind::from_type(&property.kind))),
    )
}

/// 作成日時の昇順で並べるクエリ。
fn query_request(filter: Filter) -> QueryDatabaseRequest {
    QueryDatabaseRequest {
        filter: Some(filter),
        sorts: Some(vec![Sort {
            timestamp: Timestamp::CreatedTime,
            direction: Direction::Ascending,
        }]),
        page_size: Some(PAGE_SIZE),
        ..Default::default()
    }
}

/// 作成日時の範囲でログを絞り込む条件。
fn log_filter(query: &LogQuery) -> Filter {
    let created_time = |condition| Filter::Property {
        property: query.created_time_property.clone(),
        condition: PropertyCondition::CreatedTime(condition),
    };
    Filter::And {
        and: vec![
            created_time(DateCondition::OnOrAfter(query.start)),
            created_time(DateCondition::Before(query.end)),
        ],
    }
}

fn title_filter(title_property: &str, title: &str) -> Filter {
    Filter::Property {
        property: title_property.to_string(),
        condition: PropertyCondition::Title(TextCondition::Equals(title.to_string())),
    }
}

/// ログとして読める場合は LogEntry に変換する。本文が空のページは無視する。
fn into_log_entry(page: &Page, title_property: &str) -> Option<LogEntry> {
    let created_at = page.created_time?;
    let content = page.title_text(title_property);
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    Some(LogEntry::new(content, created_at))
}

#[async_trait]
impl PageStore for NotionClient {
    async fn schema(&self, database_id: &str) -> Result<DatabaseSchema> {
        let request = self.request(reqwest::Method::GET, &format!("/databases/{database_id}"));
        let database: Database = self.send(request, "retrieve Notion database").await?;
        Ok(parse_schema(database))
    }

    async fn query_logs(&self, database_id: &str, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let pages = self.query_all(database_id, log_filter(query)).await?;
        let mut logs: Vec<LogEntry> = pages
            .iter()
            .filter_map(|page| into_log_entry(page, &query.title_property))
            .collect();
        logs.sort_by_key(|log| log.created_at);

        debug!(total = pages.len(), usable = logs.len(), "Queried log pages");
        Ok(logs)
    }

    async fn find_live_by_title(
        &self,
        database_id: &str,
        title_property: &str,
        title: &str,
    ) -> Result<Vec<String>> {
        let pages = self
            .query_all(database_id, title_filter(title_property, title))
            .await?;
        Ok(pages
            .into_iter()
            .filter(|page| page.is_live() && page.title_text(title_property) == title)
            .map(|page| page.id)
            .collect())
    }

    async fn archive(&self, page_id: &str) -> Result<()> {
        let body = UpdatePageRequest {
            archived: Some(true),
        };
        let request = self
            .request(reqwest::Method::PATCH, &format!("/pages/{page_id}"))
            .json(&body);
        let _: serde::de::IgnoredAny = self.send(request, "archive Notion page").await?;
        Ok(())
    }

    async fn create(&self, database_id: &str, page: &NewPage) -> Result<PageRef> {
        let body = CreatePageRequest {
            parent: Parent::DatabaseId {
                database_id: database_id.to_string(),
            },
            properties: &page.properties,
            children: &page.children,
        };
        let request = self.request(reqwest::Method::POST, "/pages").json(&body);
        let created: Page = self.send(request, "create Notion page").await?;
        Ok(PageRef {
            id: created.id,
            url: created.url,
        })
    }
}
