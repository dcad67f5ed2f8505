//! Fenced code blocks in Markdown.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    /// Info-string language tag, lowercased. Empty for untagged fences.
    pub language: String,
    pub code: String,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*```[ \t]*([A-Za-z0-9_+.\-]*)[^\n]*\n((?s:.*?))^[ \t]*```")
            .expect("valid regex")
    })
}

/// All fenced blocks in document order.
pub fn fenced_blocks(markdown: &str) -> Vec<CodeSnippet> {
    fence_regex()
        .captures_iter(markdown)
        .map(|caps| CodeSnippet {
            language: caps[1].to_lowercase(),
            code: caps[2].to_string(),
        })
        .collect()
}

/// First non-empty block tagged with one of `languages` (case-insensitive).
pub fn first_snippet(markdown: &str, languages: &[String]) -> Option<CodeSnippet> {
    fenced_blocks(markdown).into_iter().find(|block| {
        !block.code.trim().is_empty()
            && languages
                .iter()
                .any(|lang| lang.eq_ignore_ascii_case(&block.language))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> Vec<String> {
        vec!["python".to_string(), "py".to_string()]
    }

    #[test]
    fn test_picks_first_block_in_accepted_language() {
        let readme = "# Model\n\n```bash\npip install foo\n```\n\n```Python\nimport foo\nprint(foo.run())\n```\n\n```py\nprint(2)\n```\n";
        let snippet = first_snippet(readme, &python()).unwrap();
        assert_eq!(snippet.language, "python");
        assert_eq!(snippet.code, "import foo\nprint(foo.run())\n");
    }

    #[test]
    fn test_untagged_and_empty_blocks_are_skipped() {
        let readme = "```\nprint(1)\n```\n```python\n\n```\n";
        assert_eq!(fenced_blocks(readme).len(), 2);
        assert_eq!(first_snippet(readme, &python()), None);
    }

    #[test]
    fn test_no_fences() {
        assert!(fenced_blocks("plain text only").is_empty());
        assert_eq!(first_snippet("", &python()), None);
    }
}
