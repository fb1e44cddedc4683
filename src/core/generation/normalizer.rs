//! Content Normalizer
//!
//! Deterministic clean-up of extracted field values before injection. Each
//! rule is an independent `&str -> String` pass guarded by the presence of its
//! own output pattern, so running the whole normalizer twice changes nothing.
//!
//! Rule order:
//! 1. collapse artifacts, then unwrap whole-value emphasis
//! 2. labels (`Aspect N:`, `Rationale:`) → `**Label:**`, rationale on its own line
//! 3. section titles opening a line (`Title:`, or a bare title alone on its
//!    line) → `**Title:**` + line break
//! 4. leading question → `**Question?**` + line break
//! 5. collapse artifacts left by the passes above
//!
//! Labels run before titles because a forced rationale break can leave a bare
//! title alone on its line.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::field_map::FieldMap;
use super::markup::{starts_emphasized, strip_outer_emphasis, EMPHASIS};

static SPACE_AFTER_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\n[ \t]+").expect("Invalid break-space regex"));
static COLON_EMPHASIS_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^\s:*]):\*\*(?:[ \t]*:)+").expect("Invalid colon regex"));
static TRAILING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("Invalid trailing-space regex"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid blank-run regex"));

// ============================================================================
// Configuration
// ============================================================================

/// One label pattern to emphasize wherever it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Regular expression matching the label including its colon
    pub pattern: String,
    /// Force a line break before the label
    #[serde(default)]
    pub break_before: bool,
}

/// Normalizer settings as they appear in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub section_titles: Vec<String>,
    pub labels: Vec<LabelConfig>,
    /// When this pattern occurs in a value, the question rule is skipped
    pub question_guard: String,
    pub question_min_chars: usize,
    pub question_max_chars: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            section_titles: [
                "Summary",
                "Context",
                "Analysis",
                "Proposed solutions",
                "Reflective conclusion",
                "References",
                "Self-assessment",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            labels: vec![
                LabelConfig {
                    pattern: r"(?i)\baspect\s+\d+\s*:".to_string(),
                    break_before: false,
                },
                LabelConfig {
                    pattern: r"(?i)\brationale\s*:".to_string(),
                    break_before: true,
                },
            ],
            question_guard: r"(?i)\brationale\s*:".to_string(),
            question_min_chars: 10,
            question_max_chars: 150,
        }
    }
}

// ============================================================================
// Normalizer
// ============================================================================

#[derive(Debug, Clone)]
struct LabelRule {
    pattern: Regex,
    break_before: bool,
}

/// Compiled normalization rules
#[derive(Debug, Clone)]
pub struct Normalizer {
    titles: Vec<String>,
    labels: Vec<LabelRule>,
    question_guard: Option<Regex>,
    question_chars: std::ops::RangeInclusive<usize>,
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Result<Self, regex::Error> {
        let mut titles: Vec<String> = config
            .section_titles
            .iter()
            .map(|t| t.trim().trim_end_matches(':').to_string())
            .filter(|t| !t.is_empty())
            .collect();
        // Longest first so "Analysis of risks" wins over "Analysis"
        titles.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        let labels = config
            .labels
            .iter()
            .map(|l| {
                Ok(LabelRule {
                    pattern: Regex::new(&l.pattern)?,
                    break_before: l.break_before,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let question_guard = if config.question_guard.trim().is_empty() {
            None
        } else {
            Some(Regex::new(&config.question_guard)?)
        };

        Ok(Self {
            titles,
            labels,
            question_guard,
            question_chars: config.question_min_chars..=config.question_max_chars,
        })
    }

    /// Run every rule over one value.
    pub fn normalize(&self, value: &str) -> String {
        let value = strip_outer_emphasis(&collapse_artifacts(value));
        let value = self.emphasize_labels(&value);
        let value = self.emphasize_titles(&value);
        let value = self.emphasize_leading_question(&value);
        collapse_artifacts(&value)
    }

    /// Normalize every value of a field map.
    pub fn normalize_map(&self, map: &FieldMap) -> FieldMap {
        map.map_values(|v| self.normalize(v))
    }

    /// Emphasize a section title opening a line and break the line after it.
    ///
    /// The title must be followed by a colon, or stand alone on its line, so
    /// prose such as "Context switching costs..." is left as written. A line
    /// directly below a fully emphasized line is left alone: that is
    /// the remainder moved down by a previous pass.
    pub fn emphasize_titles(&self, value: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        for line in value.split('\n') {
            let below_heading = out
                .last()
                .and_then(|prev| prev.rsplit('\n').next())
                .map_or(false, is_fully_emphasized);
            if below_heading {
                out.push(line.to_string());
            } else {
                out.push(self.emphasize_title_line(line));
            }
        }
        out.join("\n")
    }

    fn emphasize_title_line(&self, line: &str) -> String {
        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];
        if body.starts_with(EMPHASIS) {
            return line.to_string();
        }

        for title in &self.titles {
            let Some(after) = strip_prefix_ci(body, title) else {
                continue;
            };
            let (rest, label_len) =
                if let Some(rest) = after.trim_start_matches(is_inline_space).strip_prefix(':') {
                    (rest, body.len() - rest.len())
                } else if after.trim().is_empty() {
                    ("", body.len() - after.len())
                } else {
                    continue;
                };

            let label = &body[..label_len];
            let rest = rest.trim_start_matches(is_inline_space);
            let mut result = format!("{}{}{}{}", indent, EMPHASIS, label, EMPHASIS);
            if !rest.is_empty() {
                result.push('\n');
                result.push_str(rest);
            }
            return result;
        }

        line.to_string()
    }

    /// Emphasize every label occurrence; break-before labels also start a new line.
    pub fn emphasize_labels(&self, value: &str) -> String {
        self.labels
            .iter()
            .fold(value.to_string(), |acc, rule| apply_label(&acc, rule))
    }

    /// Emphasize a question opening the value and move its answer to the next line.
    pub fn emphasize_leading_question(&self, value: &str) -> String {
        let Some(mark) = value.find('?') else {
            return value.to_string();
        };
        if let Some(guard) = &self.question_guard {
            if guard.is_match(value) {
                return value.to_string();
            }
        }

        let question = value[..mark].trim();
        let rest = value[mark + 1..].trim_start();
        let len = question.chars().count();

        if !self.question_chars.contains(&len)
            || question.contains(EMPHASIS)
            || question.contains('\n')
            || rest.is_empty()
        {
            return value.to_string();
        }

        format!("{}{}?{}\n{}", EMPHASIS, question, EMPHASIS, rest)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        static DEFAULT: Lazy<Normalizer> = Lazy::new(|| {
            Normalizer::new(&NormalizerConfig::default()).expect("Invalid default normalizer rules")
        });
        DEFAULT.clone()
    }
}

// ============================================================================
// Rule helpers
// ============================================================================

fn apply_label(value: &str, rule: &LabelRule) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    let mut last = 0;
    let mut markers = 0;

    for m in rule.pattern.find_iter(value) {
        let between = &value[last..m.start()];
        markers += between.matches(EMPHASIS).count();
        out.push_str(between);
        last = m.end();

        // Odd marker count: the label already sits inside an emphasized span
        let inside = markers % 2 == 1;
        let wrapped = inside
            && value[..m.start()].ends_with(EMPHASIS)
            && value[m.end()..].starts_with(EMPHASIS);
        if inside && !wrapped {
            out.push_str(m.as_str());
            continue;
        }
        if wrapped {
            out.truncate(out.len() - EMPHASIS.len());
        }
        if rule.break_before {
            let kept = out.trim_end_matches(is_inline_space).len();
            out.truncate(kept);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(EMPHASIS);
        out.push_str(m.as_str());
        if !wrapped {
            out.push_str(EMPHASIS);
        }
    }

    out.push_str(&value[last..]);
    out
}

/// Collapse the artifacts the emphasis passes can leave behind.
pub fn collapse_artifacts(value: &str) -> String {
    let value = COLON_EMPHASIS_COLON.replace_all(value, "${1}:**");
    let value = TRAILING_SPACE.replace_all(&value, "\n");
    let value = SPACE_AFTER_BREAK.replace_all(&value, "**\n");
    let value = BLANK_RUNS.replace_all(&value, "\n\n");
    value.trim().to_string()
}

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_fully_emphasized(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2 * EMPHASIS.len() && starts_emphasized(line) && line.ends_with(EMPHASIS)
}

/// Case-insensitive `strip_prefix`, char by char so non-ASCII titles work.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[offset..])
}
