//! Tokenizer and language detection / 分词器与语言检测
//!
//! Supports / 支持：
//! - CJK text: word segmentation over the whole string (jieba by default) / 中文分词
//! - Other scripts: runs of letters, numbers and `_`, lowercased / 其他文字：字母数字串
//! - Keyword extraction with the NLTK English stop-word list / 关键词提取（英文停用词）

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use regex::Regex;
use stop_words::{get, LANGUAGE};

/// Global jieba instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Letters, numbers and underscore; marks, punctuation and symbols never match
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("word pattern is valid"));

static STOP_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    get(LANGUAGE::English)
        .iter()
        .map(|s| s.to_lowercase())
        .collect()
});

/// Default tokenizer shared by the free functions / 默认分词器
static DEFAULT_TOKENIZER: Lazy<Tokenizer> = Lazy::new(Tokenizer::new);

/// Script class of a piece of text / 文本语言类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Contains at least one CJK Unified Ideograph / 含中日韩统一表意文字
    Cjk,
    /// Everything else / 其他
    Other,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cjk => "cjk",
            Language::Other => "other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the script class of text / 检测文本语言
///
/// Any character in U+4E00..=U+9FFF makes the whole text CJK.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| matches!(c, '\u{4e00}'..='\u{9fff}')) {
        Language::Cjk
    } else {
        Language::Other
    }
}

/// Word segmentation for CJK text / 中文分词接口
///
/// Implementations return pieces of the input in order. Pieces may include
/// whitespace or punctuation; the tokenizer drops whitespace-only pieces.
pub trait Segmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// jieba-rs segmenter (accurate mode with HMM) / jieba 分词
#[derive(Debug, Default, Clone, Copy)]
pub struct JiebaSegmenter;

impl Segmenter for JiebaSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        JIEBA.cut(text, true)
    }
}

/// A token plus the byte range it came from / 词元及其在原文中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: Range<usize>,
}

/// Tokenizer with a pluggable CJK segmenter / 分词器
#[derive(Clone)]
pub struct Tokenizer {
    segmenter: Arc<dyn Segmenter>,
}

impl Tokenizer {
    /// Tokenizer backed by jieba / 使用 jieba 的分词器
    pub fn new() -> Self {
        Self::with_segmenter(JiebaSegmenter)
    }

    pub fn with_segmenter(segmenter: impl Segmenter + 'static) -> Self {
        Self {
            segmenter: Arc::new(segmenter),
        }
    }

    /// Tokenize text / 对文本进行分词
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_spans(text)
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    /// Tokenize and keep each token's byte range in `text` / 分词并保留位置
    pub fn tokenize_spans(&self, text: &str) -> Vec<Token> {
        match detect_language(text) {
            Language::Cjk => self.segment_spans(text),
            Language::Other => word_spans(text),
        }
    }

    /// Keywords for tagging: tokens minus English stop words; CJK is unfiltered / 提取关键词
    pub fn extract_keywords(&self, text: &str, lang: Language) -> Vec<String> {
        let tokens = self.tokenize(text);
        match lang {
            Language::Cjk => tokens,
            Language::Other => tokens
                .into_iter()
                .filter(|token| !STOP_WORDS.contains(token))
                .collect(),
        }
    }

    fn segment_spans(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for piece in self.segmenter.segment(text) {
            let span = match text[cursor..].find(piece) {
                Some(offset) => {
                    let start = cursor + offset;
                    cursor = start + piece.len();
                    start..cursor
                }
                // Segmenter produced something that is not a substring
                None => cursor..cursor,
            };

            if piece.trim().is_empty() {
                continue;
            }

            tokens.push(Token {
                text: piece.to_lowercase(),
                span,
            });
        }

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer").finish_non_exhaustive()
    }
}

fn word_spans(text: &str) -> Vec<Token> {
    WORD.find_iter(text)
        .map(|m| Token {
            text: m.as_str().to_lowercase(),
            span: m.range(),
        })
        .collect()
}

/// Tokenize with the default tokenizer / 使用默认分词器分词
pub fn tokenize(text: &str) -> Vec<String> {
    DEFAULT_TOKENIZER.tokenize(text)
}

/// Extract keywords with the default tokenizer / 使用默认分词器提取关键词
pub fn extract_keywords(text: &str, lang: Language) -> Vec<String> {
    DEFAULT_TOKENIZER.extract_keywords(text, lang)
}

/// Whether a word is on the built-in English stop-word list
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word.to_lowercase())
}
