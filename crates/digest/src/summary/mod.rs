//! 生成 AI による区分ごとの要約。
//!
//! 11 区分の要約はすべて並行して生成する。生成に失敗した区分は
//! ログの箇条書きに置き換え、呼び出し元にはエラーを返さない。

mod gemini;
mod prompt;
mod retry;

pub use gemini::GeminiClient;
pub use prompt::{NONE, Scope};
pub use retry::RetryPolicy;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::logs::{CategorizedLogs, Section};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation API returned no text")]
    EmptyResponse,
}

impl GenerateError {
    /// 過負荷 (503) とレート制限 (429) は時間をおけば成功しうる。
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerateError::Api { status: 429 | 503, .. })
    }
}

/// プロンプトからテキストを生成する外部サービス。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

impl Section {
    /// 区分に使う要約の抽象度。
    pub fn scope(self) -> Scope {
        if self.is_broad() {
            Scope::Broad
        } else {
            Scope::Detailed
        }
    }
}

/// 区分キー → 要約テキスト。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummarySet(BTreeMap<String, String>);

impl SummarySet {
    pub fn insert(&mut self, section: Section, text: impl Into<String>) {
        self.0.insert(section.key(), text.into());
    }

    /// 要約テキストを返す。キーがなければ空文字列。
    pub fn get(&self, section: Section) -> &str {
        self.0.get(&section.key()).map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(Section, String)> for SummarySet {
    fn from_iter<I: IntoIterator<Item = (Section, String)>>(iter: I) -> Self {
        let mut set = SummarySet::default();
        for (section, text) in iter {
            set.insert(section, text);
        }
        set
    }
}

/// 再試行と代替表示を備えた要約器。
pub struct Summarizer<G> {
    generator: G,
    retry: RetryPolicy,
}

impl<G: TextGenerator> Summarizer<G> {
    pub fn new(generator: G, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// ログを要約する。
    ///
    /// ログが空なら API を呼ばずに `none` を返す。
    /// 再試行しても失敗した場合はログをそのまま箇条書きにして返す。
    pub async fn summarize(&self, logs: &[String], scope: Scope) -> String {
        if logs.is_empty() {
            return NONE.to_string();
        }

        let prompt = prompt::build_prompt(logs, scope);
        let result = self
            .retry
            .run(|| self.generator.generate(&prompt), GenerateError::is_retryable)
            .await;

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, lines = logs.len(), "Summary generation failed, using raw logs");
                prompt::fallback(logs)
            }
        }
    }

    /// 全 11 区分の要約を並行して生成する。
    pub async fn summarize_all(&self, logs: &CategorizedLogs) -> SummarySet {
        let futures: Vec<_> = Section::all()
            .map(move |section| async move {
                let text = self.summarize(logs.section(section), section.scope()).await;
                debug!(%section, chars = text.chars().count(), "Summary generated");
                (section, text)
            })
            .collect();

        futures::future::join_all(futures).await.into_iter().collect()
    }
}
