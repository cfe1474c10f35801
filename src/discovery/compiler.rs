//! Template compilation
//!
//! A pattern string such as `best {SLOT} for {SLOT2}` is split into literal
//! and slot segments and compiled into a small backtracking matcher. No
//! regex engine is involved.
//!
//! Matching rules:
//! - literals compare case-insensitively, and a space inside a literal
//!   matches any run of separators (whitespace or hyphen)
//! - with [`MatchBoundary::TokenEdges`] a match starts at the beginning of a
//!   token and ends at the end of one; with [`MatchBoundary::Anywhere`] it
//!   may start and end at any character, which is what unsegmented text
//!   (Chinese, Japanese) needs
//! - slots take the shortest text (at least one character) that lets the
//!   rest of the pattern match, except a slot that ends the pattern, which
//!   takes everything that is left
//! - the leftmost matching start wins

use super::ngram::{count_tokens, fold_char, is_separator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of slots in one template
pub const MAX_SLOTS: usize = 3;

/// Why a pattern string could not be compiled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("unbalanced brace at byte {position} in '{pattern}'")]
    UnbalancedBrace { pattern: String, position: usize },

    #[error("empty slot name in '{pattern}'")]
    EmptySlotName { pattern: String },

    #[error("invalid slot name '{name}' in '{pattern}'")]
    InvalidSlotName { pattern: String, name: String },

    #[error("duplicate slot '{name}' in '{pattern}'")]
    DuplicateSlot { pattern: String, name: String },

    #[error("adjacent slots without literal text in '{pattern}'")]
    AdjacentSlots { pattern: String },

    #[error("{count} slots in '{pattern}' (max {max})", max = MAX_SLOTS)]
    TooManySlots { pattern: String, count: usize },

    #[error("no slots in '{pattern}'")]
    NoSlots { pattern: String },
}

/// Tokens in a pattern string. A slot marker counts as one token even when
/// literal text touches it, so `闲鱼上卖{SLOT}` has two.
pub fn count_pattern_tokens(pattern: &str) -> usize {
    count_tokens(&pattern.replace('{', " {").replace('}', "} "))
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Count well-formed `{NAME}` markers in a pattern string
pub fn count_slot_markers(pattern: &str) -> usize {
    let mut count = 0;
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                if is_slot_name(&after[..close]) {
                    count += 1;
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    count
}

/// Lower-case a literal and collapse separator runs to one space
fn normalize_literal(raw: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(raw.len());
    for c in raw.chars() {
        if is_separator(c) {
            if out.last() != Some(&' ') {
                out.push(' ');
            }
        } else {
            out.push(fold_char(c));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(Vec<char>),
    Slot { index: usize, greedy: bool },
}

/// Where a match may start and end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBoundary {
    #[default]
    TokenEdges,
    Anywhere,
}

/// Byte spans of each slot capture, in slot order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMatch {
    pub spans: Vec<(usize, usize)>,
}

/// A pattern compiled into ordered literal and slot segments
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    pattern: String,
    segments: Vec<Segment>,
    slot_names: Vec<String>,
    boundary: MatchBoundary,
}

impl CompiledMatcher {
    /// Compile a pattern that matches on token edges
    pub fn compile(pattern: &str) -> Result<Self, CompileError> {
        Self::compile_with(pattern, MatchBoundary::TokenEdges)
    }

    pub fn compile_with(pattern: &str, boundary: MatchBoundary) -> Result<Self, CompileError> {
        let trimmed = pattern.trim();
        let mut segments: Vec<Segment> = Vec::new();
        let mut slot_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = trimmed.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(CompileError::UnbalancedBrace {
                                    pattern: pattern.to_string(),
                                    position: inner_pos,
                                })
                            }
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(CompileError::UnbalancedBrace {
                            pattern: pattern.to_string(),
                            position: pos,
                        });
                    }
                    if name.is_empty() {
                        return Err(CompileError::EmptySlotName {
                            pattern: pattern.to_string(),
                        });
                    }
                    if !is_slot_name(&name) {
                        return Err(CompileError::InvalidSlotName {
                            pattern: pattern.to_string(),
                            name,
                        });
                    }
                    if slot_names.contains(&name) {
                        return Err(CompileError::DuplicateSlot {
                            pattern: pattern.to_string(),
                            name,
                        });
                    }

                    if literal.is_empty() {
                        if matches!(segments.last(), Some(Segment::Slot { .. })) {
                            return Err(CompileError::AdjacentSlots {
                                pattern: pattern.to_string(),
                            });
                        }
                    } else {
                        segments.push(Segment::Literal(normalize_literal(&literal)));
                        literal.clear();
                    }

                    segments.push(Segment::Slot {
                        index: slot_names.len(),
                        greedy: false,
                    });
                    slot_names.push(name);
                }
                '}' => {
                    return Err(CompileError::UnbalancedBrace {
                        pattern: pattern.to_string(),
                        position: pos,
                    })
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(normalize_literal(&literal)));
        }

        match slot_names.len() {
            0 => {
                return Err(CompileError::NoSlots {
                    pattern: pattern.to_string(),
                })
            }
            n if n > MAX_SLOTS => {
                return Err(CompileError::TooManySlots {
                    pattern: pattern.to_string(),
                    count: n,
                })
            }
            _ => {}
        }

        if let Some(Segment::Slot { greedy, .. }) = segments.last_mut() {
            *greedy = true;
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            slot_names,
            boundary,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Slot names, left to right
    pub fn slot_names(&self) -> &[String] {
        &self.slot_names
    }

    pub fn boundary(&self) -> MatchBoundary {
        self.boundary
    }

    pub fn slot_count(&self) -> usize {
        self.slot_names.len()
    }

    /// Whether slot `index` takes the rest of the text
    pub fn is_greedy(&self, index: usize) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot { index: i, greedy: true } if *i == index))
    }

    /// Match against a phrase; spans are byte offsets into `text`
    pub fn find(&self, text: &str) -> Option<SlotMatch> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let folded: Vec<char> = chars.iter().map(|&(_, c)| fold_char(c)).collect();

        let mut caps: Vec<(usize, usize)> = Vec::with_capacity(self.slot_names.len());
        for start in 0..folded.len() {
            if self.boundary == MatchBoundary::TokenEdges {
                let at_token_start = !is_separator(folded[start])
                    && (start == 0 || is_separator(folded[start - 1]));
                if !at_token_start {
                    continue;
                }
            }
            caps.clear();
            if self.match_segment(0, start, &folded, &mut caps) {
                let byte_at = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);
                return Some(SlotMatch {
                    spans: caps.iter().map(|&(s, e)| (byte_at(s), byte_at(e))).collect(),
                });
            }
        }
        None
    }

    fn match_segment(
        &self,
        seg: usize,
        pos: usize,
        text: &[char],
        caps: &mut Vec<(usize, usize)>,
    ) -> bool {
        let Some(segment) = self.segments.get(seg) else {
            return match self.boundary {
                MatchBoundary::TokenEdges => pos == text.len() || is_separator(text[pos]),
                MatchBoundary::Anywhere => true,
            };
        };

        match segment {
            Segment::Literal(lit) => match match_literal(lit, pos, text) {
                Some(next) => self.match_segment(seg + 1, next, text, caps),
                None => false,
            },
            Segment::Slot { greedy: true, .. } => {
                if pos >= text.len() {
                    return false;
                }
                caps.push((pos, text.len()));
                true
            }
            Segment::Slot { greedy: false, .. } => {
                for end in pos + 1..=text.len() {
                    caps.push((pos, end));
                    if self.match_segment(seg + 1, end, text, caps) {
                        return true;
                    }
                    caps.pop();
                }
                false
            }
        }
    }
}

/// Match one literal at `pos`; a space consumes the whole separator run
fn match_literal(lit: &[char], mut pos: usize, text: &[char]) -> Option<usize> {
    for &lc in lit {
        if lc == ' ' {
            let run_start = pos;
            while pos < text.len() && is_separator(text[pos]) {
                pos += 1;
            }
            if pos == run_start {
                return None;
            }
        } else {
            if pos >= text.len() || text[pos] != lc {
                return None;
            }
            pos += 1;
        }
    }
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures<'a>(m: &CompiledMatcher, text: &'a str) -> Option<Vec<&'a str>> {
        m.find(text)
            .map(|found| found.spans.iter().map(|&(s, e)| &text[s..e]).collect())
    }

    #[test]
    fn test_count_slot_markers() {
        assert_eq!(count_slot_markers("best {SLOT} for {SLOT2}"), 2);
        assert_eq!(count_slot_markers("{X} vs {Y} {}"), 2);
        assert_eq!(count_slot_markers("no slots"), 0);
        assert_eq!(count_slot_markers("{bad name} {"), 0);
    }

    #[test]
    fn test_count_pattern_tokens() {
        assert_eq!(count_pattern_tokens("best {SLOT} app"), 3);
        assert_eq!(count_pattern_tokens("闲鱼上卖{SLOT}"), 2);
        assert_eq!(count_pattern_tokens("{SLOT}-phone"), 2);
        assert_eq!(count_pattern_tokens("{SLOT}"), 1);
    }

    #[test]
    fn test_slot_count_matches_markers() {
        for pattern in ["how to {SLOT}", "{SLOT} vs {SLOT2}", "{A} to {B} for {C}"] {
            let m = CompiledMatcher::compile(pattern).unwrap();
            assert_eq!(m.slot_count(), count_slot_markers(pattern));
        }
    }

    #[test]
    fn test_final_slot_is_greedy() {
        let m = CompiledMatcher::compile("{SLOT} for {SLOT2}").unwrap();
        assert!(!m.is_greedy(0));
        assert!(m.is_greedy(1));
        assert_eq!(
            captures(&m, "laptop for video editing"),
            Some(vec!["laptop", "video editing"])
        );
        assert_eq!(m.slot_names(), &["SLOT".to_string(), "SLOT2".to_string()]);
    }

    #[test]
    fn test_interior_slot_is_minimal() {
        let m = CompiledMatcher::compile("{SLOT} to {SLOT2}").unwrap();
        assert_eq!(
            captures(&m, "how to get to paris"),
            Some(vec!["how", "get to paris"])
        );
    }

    #[test]
    fn test_case_and_separator_tolerance() {
        let m = CompiledMatcher::compile("best {SLOT} app").unwrap();
        assert_eq!(captures(&m, "Best  Android-App"), Some(vec!["Android"]));
        assert_eq!(captures(&m, "the best android app store"), Some(vec!["android"]));
    }

    #[test]
    fn test_token_edges() {
        let m = CompiledMatcher::compile("best {SLOT} app").unwrap();
        assert!(m.find("best android apps").is_none());
        assert!(m.find("bestest android app").is_none());

        let m = CompiledMatcher::compile("{SLOT} recipe").unwrap();
        assert_eq!(captures(&m, "chocolate cake recipe"), Some(vec!["chocolate cake"]));
        assert!(m.find("recipe").is_none());
    }

    #[test]
    fn test_unsegmented_text_matches_anywhere() {
        let m = CompiledMatcher::compile_with("闲鱼上卖{SLOT}", MatchBoundary::Anywhere).unwrap();
        assert_eq!(captures(&m, "在闲鱼上卖电脑"), Some(vec!["电脑"]));
        assert_eq!(m.boundary(), MatchBoundary::Anywhere);

        let m = CompiledMatcher::compile_with("{SLOT}怎么卖", MatchBoundary::Anywhere).unwrap();
        assert_eq!(captures(&m, "手机怎么卖啊"), Some(vec!["手机"]));

        let edges = CompiledMatcher::compile("闲鱼上卖{SLOT}").unwrap();
        assert!(edges.find("在闲鱼上卖电脑").is_none());
    }

    #[test]
    fn test_dotted_capital_i_matches_folded_literal() {
        use crate::discovery::ngram::tokenize;
        let pattern = format!("{} {{SLOT}}", tokenize("İstanbul hotel").join(" "));
        let m = CompiledMatcher::compile(&pattern).unwrap();
        assert_eq!(captures(&m, "İstanbul hotel deals"), Some(vec!["deals"]));
    }

    #[test]
    fn test_unicode_offsets() {
        let m = CompiledMatcher::compile("café {SLOT}").unwrap();
        assert_eq!(captures(&m, "CAFÉ crème brûlée"), Some(vec!["crème brûlée"]));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            CompiledMatcher::compile("best {SLOT"),
            Err(CompileError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("best SLOT}"),
            Err(CompileError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("best {} app"),
            Err(CompileError::EmptySlotName { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("best {my slot}"),
            Err(CompileError::InvalidSlotName { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("{X} vs {X}"),
            Err(CompileError::DuplicateSlot { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("{X}{Y} app"),
            Err(CompileError::AdjacentSlots { .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("{A} {B} {C} {D}"),
            Err(CompileError::TooManySlots { count: 4, .. })
        ));
        assert!(matches!(
            CompiledMatcher::compile("just words"),
            Err(CompileError::NoSlots { .. })
        ));
    }
}
