//! Entry tags / 条目标签
//!
//! In memory tags are always an ordered list. On disk they are one
//! comma-joined field; files written by older producers may instead hold a
//! list literal such as `['a', 'b']`, which is resolved once at load time.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

/// Separator used in the joined representation / 标签分隔符
pub const TAG_SEPARATOR: char = ',';

/// Ordered tag list; the first tag is the primary one / 有序标签列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Split a comma-joined tag string; the empty string is no tags / 解析逗号分隔的标签
    pub fn parse_joined(joined: &str) -> Self {
        if joined.is_empty() {
            return Self::new();
        }
        Self(joined.split(TAG_SEPARATOR).map(str::to_string).collect())
    }

    /// Comma-joined form used for storage and scoring / 逗号连接形式
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn push(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl From<Vec<&str>> for Tags {
    fn from(tags: Vec<&str>) -> Self {
        Self(tags.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Tags {
    fn from(tags: [&str; N]) -> Self {
        Self(tags.into_iter().map(str::to_string).collect())
    }
}

/// A pre-joined string is split on commas
impl From<&str> for Tags {
    fn from(joined: &str) -> Self {
        Self::parse_joined(joined)
    }
}

impl From<String> for Tags {
    fn from(joined: String) -> Self {
        Self::parse_joined(&joined)
    }
}

/// Shape of a tag field as read from disk / 磁盘上标签字段的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTags<'a> {
    /// `a,b,c`
    Joined(&'a str),
    /// `['a', 'b']`, or anything else bracketed until parsed
    LegacyList(&'a str),
}

impl<'a> RawTags<'a> {
    pub fn classify(raw: &'a str) -> Self {
        if raw.starts_with('[') && raw.ends_with(']') {
            RawTags::LegacyList(raw)
        } else {
            RawTags::Joined(raw)
        }
    }

    /// Resolve into the canonical list / 解析为规范标签列表
    ///
    /// A bracketed field that is not a quoted list literal is split like any
    /// joined string, so bracketed tags written by `save` come back unchanged.
    pub fn resolve(self) -> Tags {
        match self {
            RawTags::Joined(raw) => Tags::parse_joined(raw),
            RawTags::LegacyList(raw) => match parse_list_literal(raw) {
                Some(items) => Tags(items),
                None => {
                    tracing::debug!("Bracketed tag field is not a list literal: {}", raw);
                    Tags::parse_joined(raw)
                }
            },
        }
    }
}

/// Parse `['item', "item"]`; items are trimmed / 解析列表字面量
///
/// Every item must be quoted and there must be at least one, so a tag that
/// merely looks bracketed (`[draft]`, `[]`) is not a list.
fn parse_list_literal(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        skip_whitespace(&mut chars);
        let quote = match chars.next() {
            None => break,
            Some(c @ ('\'' | '"')) => c,
            Some(_) => return None,
        };
        items.push(read_quoted(&mut chars, quote)?.trim().to_string());

        skip_whitespace(&mut chars);
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut item = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                'n' => item.push('\n'),
                't' => item.push('\t'),
                other => item.push(other),
            },
            c if c == quote => return Some(item),
            c => item.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_round_trip() {
        let tags = Tags::from(vec!["cat", "mat", ""]);
        assert_eq!(tags.joined(), "cat,mat,");
        assert_eq!(Tags::parse_joined(&tags.joined()), tags);
        assert!(Tags::parse_joined("").is_empty());
        assert_eq!(Tags::from("a,b").primary(), Some("a"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(RawTags::classify("a,b"), RawTags::Joined("a,b"));
        assert_eq!(RawTags::classify("[a, b]"), RawTags::LegacyList("[a, b]"));
        assert_eq!(RawTags::classify("[a"), RawTags::Joined("[a"));
    }

    #[test]
    fn test_legacy_quoted_list() {
        let tags = RawTags::classify("['cat', \"mat\", ' sat ']").resolve();
        assert_eq!(tags.into_vec(), vec!["cat", "mat", "sat"]);
    }

    #[test]
    fn test_legacy_trailing_comma() {
        assert_eq!(RawTags::classify("['x',]").resolve().joined(), "x");
    }

    #[test]
    fn test_bracketed_tags_are_not_lists() {
        assert_eq!(RawTags::classify("[draft]").resolve().into_vec(), vec!["[draft]"]);
        assert_eq!(RawTags::classify("[a,b]").resolve().into_vec(), vec!["[a", "b]"]);
        assert_eq!(RawTags::classify("[]").resolve().into_vec(), vec!["[]"]);
        assert_eq!(RawTags::classify("['a', b]").resolve().into_vec(), vec!["['a'", " b]"]);
    }

    #[test]
    fn test_legacy_escapes() {
        let tags = RawTags::classify(r"['it\'s', 'a\\b']").resolve();
        assert_eq!(tags.into_vec(), vec!["it's", "a\\b"]);
    }

    #[test]
    fn test_legacy_unparseable_keeps_raw() {
        let raw = "['unterminated]";
        assert_eq!(RawTags::classify(raw).resolve().joined(), raw);

        let raw = "[a,,b]";
        assert_eq!(RawTags::classify(raw).resolve().joined(), raw);

        let raw = "['a' 'b']";
        assert_eq!(RawTags::classify(raw).resolve().joined(), raw);
    }
}
