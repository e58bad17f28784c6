//! Notion API のオブジェクト（ページ、ブロック、プロパティ、リッチテキスト）。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// リッチテキストの 1 要素。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text {
        text: Text,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plain_text: Option<String>,
    },
    Mention {
        #[serde(default)]
        plain_text: Option<String>,
    },
    Equation {
        #[serde(default)]
        plain_text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

impl RichText {
    pub fn text(content: impl Into<String>) -> Self {
        RichText::Text {
            text: Text {
                content: content.into(),
            },
            plain_text: None,
        }
    }

    /// 表示上のテキスト。plain_text がなければ入力したテキストを使う。
    pub fn plain_text(&self) -> &str {
        match self {
            RichText::Text { text, plain_text } => plain_text.as_deref().unwrap_or(&text.content),
            RichText::Mention { plain_text } | RichText::Equation { plain_text } => {
                plain_text.as_deref().unwrap_or_default()
            }
        }
    }
}

/// 見出し・段落ブロックの中身。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlockValue {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum BlockType {
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: TextBlockValue },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: TextBlockValue },
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: TextBlockValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub block_type: BlockType,
}

#[cfg(test)]
impl Block {
    pub fn kind(&self) -> &'static str {
        match self.block_type {
            BlockType::Heading1 { .. } => "heading_1",
            BlockType::Heading2 { .. } => "heading_2",
            BlockType::Paragraph { .. } => "paragraph",
        }
    }

    pub fn rich_text(&self) -> &[RichText] {
        match &self.block_type {
            BlockType::Heading1 { heading_1: value }
            | BlockType::Heading2 { heading_2: value }
            | BlockType::Paragraph { paragraph: value } => &value.rich_text,
        }
    }

    pub fn plain_text(&self) -> String {
        self.rich_text().iter().map(RichText::plain_text).collect()
    }
}

/// date プロパティの値。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// ページプロパティの値。扱わない型は `Other` として読み飛ばす。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageProperty {
    Title {
        title: Vec<RichText>,
    },
    Date {
        date: Option<DateValue>,
    },
    CreatedTime {
        created_time: DateTime<Utc>,
    },
    #[serde(other)]
    Other,
}

impl PageProperty {
    /// title 型ならその plain_text を連結して返す。
    pub fn title_text(&self) -> Option<String> {
        match self {
            PageProperty::Title { title } => Some(title.iter().map(RichText::plain_text).collect()),
            _ => None,
        }
    }
}

/// ページの親。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: String },
}

/// API から返るページ。
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: String,
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub in_trash: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, PageProperty>,
}

impl Page {
    pub fn is_live(&self) -> bool {
        !self.archived && !self.in_trash
    }

    /// title プロパティのテキスト。プロパティがなければ空文字列。
    pub fn title_text(&self, title_property: &str) -> String {
        self.properties
            .get(title_property)
            .and_then(PageProperty::title_text)
            .unwrap_or_default()
    }
}

/// データベースのプロパティ定義。型名だけを使う。
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseProperty {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub properties: BTreeMap<String, DatabaseProperty>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn block_wire_format() {
        let block = Block {
            block_type: BlockType::Heading2 {
                heading_2: TextBlockValue {
                    rich_text: vec![RichText::text("AM")],
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "heading_2",
                "heading_2": { "rich_text": [{ "type": "text", "text": { "content": "AM" } }] }
            })
        );
    }

    #[test]
    fn page_properties_skip_unknown_types() {
        let page: Page = serde_json::from_value(json!({
            "id": "p1",
            "created_time": "2025-07-19T14:00:00.000Z",
            "properties": {
                "Name": {
                    "id": "title",
                    "type": "title",
                    "title": [
                        { "type": "text", "plain_text": "blog ", "text": { "content": "blog ", "link": null } },
                        { "type": "mention", "plain_text": "@someone", "mention": { "type": "user" } }
                    ]
                },
                "Tags": { "id": "a", "type": "multi_select", "multi_select": [] },
                "Date": { "id": "b", "type": "date", "date": null }
            }
        }))
        .unwrap();

        assert_eq!(page.title_text("Name"), "blog @someone");
        assert_eq!(page.properties["Tags"], PageProperty::Other);
        assert_eq!(page.properties["Date"], PageProperty::Date { date: None });
        assert!(page.is_live());
    }

    #[test]
    fn date_property_wire_format() {
        let property = PageProperty::Date {
            date: Some(DateValue {
                start: "2025-07-19".into(),
                end: None,
            }),
        };
        assert_eq!(
            serde_json::to_value(&property).unwrap(),
            json!({ "type": "date", "date": { "start": "2025-07-19" } })
        );
    }
}
