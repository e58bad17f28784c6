//! 1 回の実行で、対象日のログを要約してサマリーページを作成する。

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::logs::{LogEntry, categorize};
use crate::notion::{LogQuery, NotionClient, PageRef, PageStore};
use crate::summary::{GeminiClient, Summarizer, TextGenerator};
use crate::time::{DaySelector, TargetDay, resolve};
use crate::upsert::SummaryUpserter;

/// 実行結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub day: TargetDay,
    pub page: PageRef,
    /// 要約したログの件数
    pub entries: usize,
}

impl Outcome {
    /// 呼び出し元に返す完了メッセージ。
    pub fn message(&self) -> String {
        format!("Successfully created AI-powered summary page for {}", self.day)
    }
}

/// ログの取得・要約・保存を順に行う。
pub struct Digest<S, G> {
    store: S,
    summarizer: Summarizer<G>,
    log_database_id: String,
    summary_database_id: String,
    title_suffix: String,
}

impl Digest<NotionClient, GeminiClient> {
    /// 検証済みの設定から Notion / Gemini クライアントを作る。
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = NotionClient::new(&config.notion.token)?;
        let generator = GeminiClient::new(
            &config.gemini.api_key,
            &config.gemini.model,
            config.gemini.timeout,
        )?;
        Ok(Self::new(
            store,
            Summarizer::new(generator, config.gemini.retry.clone()),
            config,
        ))
    }
}

impl<S: PageStore, G: TextGenerator> Digest<S, G> {
    pub fn new(store: S, summarizer: Summarizer<G>, config: &Config) -> Self {
        Self {
            store,
            summarizer,
            log_database_id: config.notion.log_database_id.clone(),
            summary_database_id: config.notion.summary_database_id.clone(),
            title_suffix: config.notion.title_suffix.clone(),
        }
    }

    /// 対象日のログを取得する。
    pub async fn fetch_logs(&self, day: &TargetDay) -> Result<Vec<LogEntry>> {
        let schema = self
            .store
            .schema(&self.log_database_id)
            .await
            .context("Failed to read log database schema")
            .map_err(DigestError::LogFetch)?;

        let (Some(title), Some(created_time)) = (schema.title(), schema.created_time()) else {
            return Err(DigestError::StoreSchema(format!(
                "log database {} must have one 'title' and one 'created_time' property",
                self.log_database_id
            )));
        };

        let query = LogQuery {
            title_property: title.to_string(),
            created_time_property: created_time.to_string(),
            start: day.start,
            end: day.end,
        };
        let mut entries = self
            .store
            .query_logs(&self.log_database_id, &query)
            .await
            .map_err(DigestError::LogFetch)?;
        entries.retain(|entry| day.contains(entry.created_at));
        Ok(entries)
    }

    /// 日付指定を解決し、その日のサマリーページを作成する。
    pub async fn run(&self, selector: &DaySelector, now: DateTime<Utc>) -> Result<Outcome> {
        let day = resolve(selector, now)?;
        info!(date = %day, start = %day.start, end = %day.end, "Resolved target day");

        let entries = self.fetch_logs(&day).await?;
        info!(date = %day, entries = entries.len(), "Fetched activity logs");

        let logs = categorize(&entries);
        let summaries = self.summarizer.summarize_all(&logs).await;
        info!(date = %day, sections = summaries.len(), "Generated summaries");

        let page = SummaryUpserter::new(&self.store, &self.summary_database_id, &self.title_suffix)
            .upsert(&day, &summaries)
            .await?;

        Ok(Outcome {
            day,
            page,
            entries: entries.len(),
        })
    }
}
