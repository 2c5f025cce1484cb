//! Filename parsing for workflow archives.
//!
//! Archives follow the convention
//! `Workflow-X<code>_<slug>_<n>-draft-<revision>.zip`, e.g.
//! `Workflow-X178_S_search_2_buy_407_1-draft-4281.zip`. Some archives only
//! keep the `Workflow-X<code>` prefix; those still parse, without slug or
//! revision.

use regex::Regex;
use std::sync::LazyLock;

static STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Workflow-(X_?\d+)_(.+)_(\d+)-draft-(\d+)(?i:\.zip)?$").expect("strict pattern")
});

static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Workflow-(X_?\d+)").expect("prefix pattern"));

static DRAFT_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:jy|vjy)_draft_?0(\d)").expect("draft sequence pattern"));

static DRAFT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-draft-(\d+)(?i:\.zip)?$").expect("draft suffix pattern"));

static ZIP_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.zip$").expect("zip suffix pattern"));

/// Everything that can be derived from an archive filename alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentifier {
    /// The code token exactly as it appears in the filename (`X_201`).
    pub raw_code: String,
    /// `raw_code` normalized (`X201`).
    pub literal_code: String,
    /// Effective code after the draft-sequence adjustment.
    pub code: String,
    /// Numeric part of `code`.
    pub number: u64,
    pub slug: Option<String>,
    /// Step marker (1–3) if the filename carries one.
    pub step: Option<u8>,
    /// Draft revision, only known when the strict pattern matched.
    pub revision: Option<u64>,
    /// Lowercased filename split on `_`, `-` and `.`.
    pub tokens: Vec<String>,
}

/// Normalize a code token: `X_201` → `X201`.
pub fn normalize_code(raw: &str) -> String {
    raw.replace('_', "")
}

/// Parse an archive filename. `None` means the name follows no known convention.
pub fn parse(filename: &str) -> Option<ParsedIdentifier> {
    let (raw_code, slug, revision) = if let Some(caps) = STRICT.captures(filename) {
        (
            caps[1].to_string(),
            Some(caps[2].to_string()),
            caps[4].parse::<u64>().ok(),
        )
    } else {
        let caps = PREFIX.captures(filename)?;
        (caps[1].to_string(), None, None)
    };

    let literal_code = normalize_code(&raw_code);
    let literal_number = literal_code[1..].parse::<u64>().ok()?;
    let lower = filename.to_lowercase();

    let number = match draft_sequence(&lower) {
        Some(seq) if seq > 1 => literal_number.checked_add(seq - 1)?,
        _ => literal_number,
    };

    Some(ParsedIdentifier {
        raw_code,
        literal_code,
        code: format!("X{}", number),
        number,
        slug,
        step: detect_step(&lower),
        revision,
        tokens: lower
            .split(['_', '-', '.'])
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// First step marker found in an already-lowercased filename.
pub fn detect_step(lower: &str) -> Option<u8> {
    (1u8..=3).find(|n| lower.contains(&format!("step{n}")) || lower.contains(&format!("step_{n}")))
}

/// Sequence number of a `jy_draft_0N` marker. Only the jianying-draft family
/// uses it; every other filename returns `None`.
fn draft_sequence(lower: &str) -> Option<u64> {
    if !lower.contains("jy_draft") {
        return None;
    }
    DRAFT_SEQUENCE
        .captures(lower)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}

/// Trailing `-draft-<n>` revision of any filename, 0 when absent.
pub fn draft_revision(filename: &str) -> u64 {
    DRAFT_SUFFIX
        .captures(filename)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .unwrap_or(0)
}

/// Filename with its `-draft-<n>[.zip]` tail (or bare `.zip`) removed. The
/// extension matches in any case.
pub fn strip_draft_suffix(filename: &str) -> &str {
    match DRAFT_SUFFIX.find(filename).or_else(|| ZIP_SUFFIX.find(filename)) {
        Some(m) => &filename[..m.start()],
        None => filename,
    }
}
