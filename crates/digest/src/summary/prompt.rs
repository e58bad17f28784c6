//! 要約プロンプトの組み立てと、生成に失敗したときの代替表示。

/// 要約の抽象度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 主要なテーマと流れにまとめる（1 日・午前・午後）
    Broad,
    /// 関心ごとにグループ化して活動を列挙する（3 時間枠）
    Detailed,
}

/// 該当するログがないときの値。
pub const NONE: &str = "none";

/// ログ 1 行ごとの箇条書き記号。
const BULLET: &str = "◦";

fn log_lines(logs: &[String]) -> String {
    logs.iter()
        .map(|log| format!("- {log}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 要約生成用のプロンプトを作る。
pub fn build_prompt(logs: &[String], scope: Scope) -> String {
    let lines = log_lines(logs);

    match scope {
        Scope::Broad => format!(
            "以下の行動記録リストから、**高度に抽象化された**サマリーを生成してください。
個々の活動を羅列せずに統合し、その時間帯の**主要なテーマ、達成事項、全体的な流れ**を複数のポイントに分けて記述してください。

最重要ルール：
- **プロジェクト名・人名・ツール名などの重要な固有名詞は、意味が失われないよう要約にそのまま含めてください。**

出力形式のルール：
- 各ポイントは**必ず改行して**記述してください。
- 各ポイントの先頭に、内容を象徴する**絵文字**を一つ付けてください。
- 文章は簡潔にまとめてください。
- マークダウンの見出し（#, ##）や太字（**）は使用しないでください。
- 該当する行動がない場合は '{NONE}' とだけ返してください。

# 行動記録リスト：
{lines}

# 抽象化サマリー："
        ),
        Scope::Detailed => format!(
            "以下の行動記録リストから、**構造化された**サマリーを生成してください。
まず記録から共通の関心ごとを特定し、それぞれに関連する活動をグループ化してください。

出力形式のルール：
- 各関心ごとのトピックの先頭に適切な絵文字を付けてください。（例: ✨ 新機能開発）
- 各活動はインデントされた箇条書き（{BULLET} activity）で記述してください。
- マークダウンの見出し（#, ##）や太字（**）は使用しないでください。
- 該当する行動がない場合は '{NONE}' とだけ返してください。

# 行動記録リスト：
{lines}

# 構造化サマリー："
        ),
    }
}

/// 生成に失敗したときに、ログをそのまま箇条書きにする。
pub fn fallback(logs: &[String]) -> String {
    logs.iter()
        .map(|log| format!("{BULLET} {log}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs() -> Vec<String> {
        vec!["ブログ執筆".to_string(), "昼食".to_string()]
    }

    #[test]
    fn prompt_lists_every_log() {
        for scope in [Scope::Broad, Scope::Detailed] {
            let prompt = build_prompt(&logs(), scope);
            assert!(prompt.contains("- ブログ執筆\n- 昼食"), "{scope:?}");
            assert!(prompt.contains("'none'"), "{scope:?}");
        }
    }

    #[test]
    fn scopes_use_different_instructions() {
        let broad = build_prompt(&logs(), Scope::Broad);
        let detailed = build_prompt(&logs(), Scope::Detailed);
        assert!(broad.ends_with("# 抽象化サマリー："));
        assert!(detailed.ends_with("# 構造化サマリー："));
        assert!(detailed.contains("◦ activity"));
    }

    #[test]
    fn fallback_renders_bullets() {
        assert_eq!(fallback(&logs()), "◦ ブログ執筆\n◦ 昼食");
        assert_eq!(fallback(&[]), "");
    }
}
