use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{
    LowerCaser,
    SimpleTokenizer,
    TextAnalyzer,
    TokenStream,
};

/// ASCII punctuation stripped by [`Analyzer::clean`], applied in order.
pub const ASCII_PUNCTUATION: &[&str] = &[
    ",", ".", "?", "!", "<", ">", ":", ";", "\\", "/", "|", "[", "]", "{",
    "}", "-", "=", "+", "-", "_", "(", ")", "*", "&", "^", "%", "$", "#",
    "@", "`", "~",
];

/// Full-width / CJK punctuation stripped after [`ASCII_PUNCTUATION`].
///
/// `——` and `……` are two-character entries; a lone dash or ellipsis
/// survives.
pub const CJK_PUNCTUATION: &[&str] = &[
    "，", "。", "？", "《", "》", "：", "；", "“", "”", "‘", "’", "【", "】",
    "——", "！", "……", "￥", "（", "）", "、",
];

/// Non-ideograph tokens longer than this many bytes are dropped. Each
/// ideograph is its own token and is never dropped.
pub const MAX_TOKEN_LEN: usize = 40;

/// Text primitives consumed by the builder and the match engine.
pub trait TextProcessor: Send + Sync {
    /// Segment `text` into tokens. Whitespace and punctuation never appear
    /// in the output.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Strip punctuation from `text`, leaving everything else in place.
    fn clean(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOptions {
    /// Lowercase tokens. Clean text is never case-folded.
    pub lowercase: bool,
}

/// Default [`TextProcessor`] built on tantivy's simple tokenizer.
#[derive(Clone)]
pub struct Analyzer {
    analyzer: TextAnalyzer,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&TextOptions::default())
    }
}

impl Analyzer {
    pub fn new(options: &TextOptions) -> Self {
        // Length is checked after the ideograph split, so unspaced CJK
        // runs reach `split_ideographs` whole.
        let analyzer = if options.lowercase {
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(LowerCaser)
                .build()
        } else {
            TextAnalyzer::builder(SimpleTokenizer::default()).build()
        };
        Self { analyzer }
    }
}

impl TextProcessor for Analyzer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        // token_stream needs &mut; the clone only copies the boxed pipeline.
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            split_ideographs(&stream.token().text, &mut tokens);
        }
        tokens
    }

    fn clean(&self, text: &str) -> String {
        ASCII_PUNCTUATION
            .iter()
            .chain(CJK_PUNCTUATION)
            .fold(text.to_string(), |acc, p| acc.replace(p, ""))
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}

/// Push `token` onto `out`, giving every CJK ideograph its own token.
/// Runs of other characters longer than [`MAX_TOKEN_LEN`] are dropped.
fn split_ideographs(token: &str, out: &mut Vec<String>) {
    if !token.chars().any(is_ideograph) {
        push_run(token.to_string(), out);
        return;
    }

    let mut run = String::new();
    for c in token.chars() {
        if is_ideograph(c) {
            push_run(std::mem::take(&mut run), out);
            out.push(c.to_string());
        } else {
            run.push(c);
        }
    }
    push_run(run, out);
}

fn push_run(run: String, out: &mut Vec<String>) {
    if !run.is_empty() && run.len() <= MAX_TOKEN_LEN {
        out.push(run);
    }
}

fn is_ideograph(c: char) -> bool {
    matches!(
        c,
        '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
    )
}
