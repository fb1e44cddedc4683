//! Light markup shared by provider output and rendered documents.

/// Emphasis (bold) marker pair
pub const EMPHASIS: &str = "**";

/// Strip whole-value emphasis wrapping, one layer at a time, until the value
/// is no longer fully wrapped.
///
/// A value counts as fully wrapped only when the outer markers pair with each
/// other, i.e. the core left after removing them contains no further marker.
/// `**a** and **b**` is therefore left alone, while `****a****` becomes `a`.
pub fn strip_outer_emphasis(value: &str) -> String {
    let mut current = value.trim();
    let marker = EMPHASIS.len();

    loop {
        if current.len() <= 2 * marker
            || !current.starts_with(EMPHASIS)
            || !current.ends_with(EMPHASIS)
        {
            break;
        }

        // Peel symmetric layers to find the innermost core
        let mut core = current;
        while core.len() > 2 * marker && core.starts_with(EMPHASIS) && core.ends_with(EMPHASIS) {
            core = core[marker..core.len() - marker].trim();
        }
        if core.contains(EMPHASIS) || core.trim().is_empty() {
            break;
        }

        current = current[marker..current.len() - marker].trim();
    }

    current.to_string()
}

/// Remove every emphasis marker, leaving the visible text.
pub fn strip_emphasis(value: &str) -> String {
    value.replace(EMPHASIS, "")
}

/// A run of text with uniform emphasis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichRun {
    pub text: String,
    pub emphasized: bool,
}

impl RichRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

/// Split one line on the emphasis marker. Segments alternate plain/emphasized
/// starting plain; empty segments produce no run. An unpaired trailing marker
/// leaves the rest of the line emphasized.
pub fn split_emphasis(line: &str) -> Vec<RichRun> {
    line.split(EMPHASIS)
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
        .map(|(i, segment)| RichRun {
            text: segment.to_string(),
            emphasized: i % 2 == 1,
        })
        .collect()
}

/// Whether `text` (ignoring leading whitespace) opens with an emphasis marker
pub fn starts_emphasized(text: &str) -> bool {
    text.trim_start().starts_with(EMPHASIS)
}
