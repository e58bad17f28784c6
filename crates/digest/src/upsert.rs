//! 日付ごとのサマリーページを作成し、古いページをアーカイブする。

use tracing::info;

use crate::error::{DigestError, Result};
use crate::notion::{NewPage, PageRef, PageStore, blocks};
use crate::summary::SummarySet;
use crate::time::TargetDay;

/// 対象日のページタイトル (`YYYY-MM-DD` + 接尾辞)。
pub fn page_title(day: &TargetDay, suffix: &str) -> String {
    format!("{day}{suffix}")
}

/// サマリーデータベースへの書き込み。
pub struct SummaryUpserter<'a, S> {
    store: &'a S,
    database_id: &'a str,
    title_suffix: &'a str,
}

impl<'a, S: PageStore> SummaryUpserter<'a, S> {
    pub fn new(store: &'a S, database_id: &'a str, title_suffix: &'a str) -> Self {
        Self {
            store,
            database_id,
            title_suffix,
        }
    }

    /// 対象日のサマリーページを作り直す。
    ///
    /// 新しいページを作成してから、同じタイトルの既存ページをすべてアーカイブする。
    /// 途中で失敗しても、その日の有効なページが 0 件になることはない。
    pub async fn upsert(&self, day: &TargetDay, summaries: &SummarySet) -> Result<PageRef> {
        let schema = self
            .store
            .schema(self.database_id)
            .await
            .map_err(DigestError::StoreWrite)?;
        let title_property = schema.title().ok_or_else(|| {
            DigestError::StoreSchema(format!(
                "summary database {} has no title property",
                self.database_id
            ))
        })?;

        let title = page_title(day, self.title_suffix);
        let previous = self
            .store
            .find_live_by_title(self.database_id, title_property, &title)
            .await
            .map_err(DigestError::StoreWrite)?;

        let mut page = NewPage {
            children: blocks::summary_page_blocks(summaries),
            ..Default::default()
        };
        page.properties
            .insert(title_property.to_string(), blocks::title_property(&title));
        if let Some(date_property) = schema.date() {
            page.properties
                .insert(date_property.to_string(), blocks::date_property(day.date));
        }

        let created = self
            .store
            .create(self.database_id, &page)
            .await
            .map_err(DigestError::StoreWrite)?;
        info!(page_id = %created.id, title = %title, "Created summary page");

        for page_id in previous.iter().filter(|id| **id != created.id) {
            self.store
                .archive(page_id)
                .await
                .map_err(DigestError::StoreWrite)?;
            info!(page_id = %page_id, title = %title, "Archived previous summary page");
        }

        Ok(created)
    }
}
