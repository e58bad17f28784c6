//! サマリーページのプロパティとブロックを組み立てる。

use chrono::NaiveDate;

use super::objects::{Block, BlockType, DateValue, PageProperty, RichText, TextBlockValue};
use crate::logs::Section;
use crate::summary::SummarySet;

/// Notion の rich_text 1 要素あたりの最大文字数。
pub const MAX_TEXT_LENGTH: usize = 2000;

/// 1 ブロックの rich_text 配列に入れられる最大要素数。
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

/// テキストを rich_text 配列に変換する。長いテキストは複数要素に分割する。
pub fn rich_text(content: &str) -> Vec<RichText> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![RichText::text("")];
    }
    chars
        .chunks(MAX_TEXT_LENGTH)
        .map(|chunk| RichText::text(chunk.iter().collect::<String>()))
        .collect()
}

fn heading_block(level: u8, text: &str) -> Block {
    let value = TextBlockValue {
        rich_text: rich_text(text),
    };
    let block_type = match level {
        1 => BlockType::Heading1 { heading_1: value },
        _ => BlockType::Heading2 { heading_2: value },
    };
    Block { block_type }
}

/// 段落ブロック。rich_text が上限を超える場合は複数の段落に分ける。
fn paragraph_blocks(text: &str) -> Vec<Block> {
    rich_text(text)
        .chunks(MAX_RICH_TEXT_ITEMS)
        .map(|items| Block {
            block_type: BlockType::Paragraph {
                paragraph: TextBlockValue {
                    rich_text: items.to_vec(),
                },
            },
        })
        .collect()
}

/// サマリーページの本文ブロックを作る。
///
/// TODAY / AM / PM の見出しと要約の後に、THREE HOURLY 見出しと
/// 3 時間枠ごとの小見出し・要約が続く。
pub fn summary_page_blocks(summaries: &SummarySet) -> Vec<Block> {
    let mut blocks = Vec::new();

    for section in Section::all().filter(|s| s.is_broad()) {
        blocks.push(heading_block(1, &section.heading()));
        blocks.extend(paragraph_blocks(summaries.get(section)));
    }

    blocks.push(heading_block(1, "THREE HOURLY"));
    for section in Section::all().filter(|s| !s.is_broad()) {
        blocks.push(heading_block(2, &section.heading()));
        blocks.extend(paragraph_blocks(summaries.get(section)));
    }

    blocks
}

/// title 型プロパティの値。
pub fn title_property(title: &str) -> PageProperty {
    PageProperty::Title {
        title: rich_text(title),
    }
}

/// date 型プロパティの値。
pub fn date_property(date: NaiveDate) -> PageProperty {
    PageProperty::Date {
        date: Some(DateValue {
            start: date.format("%Y-%m-%d").to_string(),
            end: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_item() {
        let items = rich_text("hello");
        assert_eq!(items, vec![RichText::text("hello")]);
    }

    #[test]
    fn long_text_is_split_on_char_boundaries() {
        let text = "あ".repeat(MAX_TEXT_LENGTH * 2 + 1);
        let items = rich_text(&text);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].plain_text().chars().count(), MAX_TEXT_LENGTH);
        assert_eq!(items[2].plain_text(), "あ");
        let joined: String = items.iter().map(RichText::plain_text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn oversized_summary_spans_several_paragraphs() {
        let text = "x".repeat(MAX_TEXT_LENGTH * MAX_RICH_TEXT_ITEMS * 2 + 5);
        let mut summaries = SummarySet::default();
        summaries.insert(Section::Today, text.clone());
        let blocks = summary_page_blocks(&summaries);

        // TODAY 見出しの後に段落が 3 つ続く
        assert_eq!(blocks.len(), 3 * 2 + 1 + 8 * 2 + 2);
        let paragraphs = &blocks[1..4];
        assert!(paragraphs.iter().all(|b| b.kind() == "paragraph"));
        assert!(paragraphs.iter().all(|b| b.rich_text().len() <= MAX_RICH_TEXT_ITEMS));
        assert_eq!(paragraphs[0].rich_text().len(), MAX_RICH_TEXT_ITEMS);
        assert_eq!(paragraphs[2].plain_text(), "xxxxx");
        let joined: String = paragraphs.iter().map(Block::plain_text).collect();
        assert_eq!(joined, text);
        assert_eq!(blocks[4].plain_text(), "AM");
    }

    #[test]
    fn page_layout() {
        let mut summaries = SummarySet::default();
        summaries.insert(Section::Today, "today text");
        summaries.insert(Section::ThreeHourly(7), "late text");
        let blocks = summary_page_blocks(&summaries);

        assert_eq!(blocks.len(), 3 * 2 + 1 + 8 * 2);
        let headings: Vec<String> = blocks
            .iter()
            .filter(|b| b.kind() != "paragraph")
            .map(Block::plain_text)
            .collect();
        assert_eq!(
            headings,
            vec![
                "TODAY",
                "AM",
                "PM",
                "THREE HOURLY",
                "00:00–03:00",
                "03:00–06:00",
                "06:00–09:00",
                "09:00–12:00",
                "12:00–15:00",
                "15:00–18:00",
                "18:00–21:00",
                "21:00–00:00",
            ]
        );

        assert_eq!(blocks[0].kind(), "heading_1");
        assert_eq!(blocks[1].plain_text(), "today text");
        // 欠けている区分は空文字列
        assert_eq!(blocks[3].plain_text(), "");
        assert_eq!(blocks[7].kind(), "heading_2");
        assert_eq!(blocks[22].plain_text(), "late text");
    }

    #[test]
    fn properties() {
        let title = title_property("2025-07-19");
        assert_eq!(title.title_text().as_deref(), Some("2025-07-19"));

        let date = date_property(NaiveDate::from_ymd_opt(2025, 7, 9).unwrap());
        assert_eq!(
            date,
            PageProperty::Date {
                date: Some(DateValue {
                    start: "2025-07-09".into(),
                    end: None
                })
            }
        );
    }
}
