//! Filename-based categorization of course PDFs.
//!
//! The filename is the only signal: "Protein PTC 2022.pdf" is a `nutrition`
//! document with topic "Protein". Unknown names fall back to `general`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Course/year markers appended to every filename in the corpus.
const SUFFIX_TOKENS: &[&str] = &["ptc 2022", "ptc 2023"];

const PDF_EXTENSION: &str = ".pdf";

/// Label stored on every chunk's metadata.
pub const COURSE_LABEL: &str = "Menno Henselmans PTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nutrition,
    Training,
    Science,
    Lifestyle,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Training => "training",
            Self::Science => "science",
            Self::Lifestyle => "lifestyle",
            Self::General => "general",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "nutrition" => Self::Nutrition,
            "training" => Self::Training,
            "science" => Self::Science,
            "lifestyle" => Self::Lifestyle,
            _ => Self::General,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scanned in order; the first category with a matching keyword wins, so
/// "biochemistry" lands in nutrition even though science lists it too.
pub const TAXONOMY: &[(Category, &[&str])] = &[
    (
        Category::Nutrition,
        &[
            "ad libitum",
            "adherence",
            "biochemistry",
            "carbohydrates",
            "dietary fat",
            "energy",
            "fasting",
            "ketogenic",
            "macronutrition",
            "micronutrition",
            "nutrition case",
            "periodization",
            "protein",
            "supplements",
            "health science and food",
        ],
    ),
    (
        Category::Training,
        &[
            "advanced strength",
            "age specific",
            "cardio",
            "exercise library",
            "exercise performance",
            "exercise selection",
            "how to structure",
            "injury management",
            "powerlifting",
            "program customization",
            "stretching",
            "training case",
            "training gear",
            "training volume",
            "understanding muscle",
            "warming up",
            "posture",
        ],
    ),
    (
        Category::Science,
        &[
            "biochemistry",
            "muscle functional anatomy",
            "understanding muscle growth",
        ],
    ),
    (
        Category::Lifestyle,
        &[
            "business",
            "fitness for women",
            "lifestyle factors",
            "how to learn think and research",
        ],
    ),
];

/// Map a filename to its coarse category.
pub fn categorize(filename: &str) -> Category {
    let mut normalized = filename.to_lowercase();
    for token in SUFFIX_TOKENS {
        normalized = normalized.replace(token, "");
    }
    let normalized = normalized.replace(PDF_EXTENSION, "");
    let normalized = normalized.trim();

    TAXONOMY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// Clean display name: suffix tokens, extension and trailing "(n)" counters removed.
///
/// Stripping repeats until nothing changes, since removing one token can join
/// its neighbours into another ("ptc ptc 20222022"). That makes the result a
/// fixed point: `extract_topic(&extract_topic(x)) == extract_topic(x)`.
pub fn extract_topic(filename: &str) -> String {
    let mut name = filename.trim().to_string();
    loop {
        let next = strip_decorations(&name);
        if next == name {
            return name;
        }
        name = next;
    }
}

fn strip_decorations(name: &str) -> String {
    let mut name = name.to_string();
    for token in SUFFIX_TOKENS {
        name = remove_ascii_case_insensitive(&name, token);
    }
    let mut name = remove_ascii_case_insensitive(&name, PDF_EXTENSION);
    while let Some(stripped) = strip_trailing_counter(&name) {
        name = stripped;
    }
    name.trim().to_string()
}

/// Category and topic for a filename in one call.
pub fn classify(filename: &str) -> (Category, String) {
    (categorize(filename), extract_topic(filename))
}

fn remove_ascii_case_insensitive(haystack: &str, needle: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original string.
    let lowered = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lowered.match_indices(needle) {
        out.push_str(&haystack[last..idx]);
        last = idx + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}

/// "Exercise Selection (1)" -> Some("Exercise Selection").
fn strip_trailing_counter(name: &str) -> Option<String> {
    let trimmed = name.trim_end();
    let inner = trimmed.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(inner[..open].trim_end().to_string())
}
