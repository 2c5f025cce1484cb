//! Reference table lookup for archive codes.
//!
//! The table is a JSON object keyed by normalized code:
//!
//! ```json
//! {
//!   "X1": { "description": "老黄历查询", "type": "工具", "type_code": "W", "original_id": "X1_laohuangli" }
//! }
//! ```
//!
//! It is loaded once and never mutated. Iteration order is the file order,
//! which decides fuzzy tie-breaks.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::parser::{ParsedIdentifier, normalize_code};

/// Lowest fuzzy score that still counts as a match.
pub const MIN_FUZZY_SCORE: usize = 10;

/// Bonus for an entry whose reference text equals the filename slug.
const EXACT_SLUG_BONUS: usize = 1000;

pub const PLACEHOLDER_CATEGORY: &str = "其他";
pub const PLACEHOLDER_TYPE_CODE: &str = "W";

static LEADING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^x_?\d+_?").expect("leading code pattern"));

/// Display metadata for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub description: String,
    /// Category label.
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default = "default_type_code")]
    pub type_code: String,
    /// Identifier as written in the upstream listing, e.g. `X178_S_search_2_buy_407`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
}

fn default_type_code() -> String {
    PLACEHOLDER_TYPE_CODE.into()
}

impl MappingEntry {
    /// Text the fuzzy matcher compares against filenames: the original id
    /// without its code, or the description when there is no original id.
    fn reference_text(&self) -> String {
        let stripped = self
            .original_id
            .as_deref()
            .map(|id| LEADING_CODE.replace(&id.to_lowercase(), "").into_owned())
            .filter(|s| !s.is_empty());
        stripped.unwrap_or_else(|| self.description.to_lowercase())
    }
}

/// How a code was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Direct,
    Fuzzy { score: usize },
    Placeholder,
}

/// Outcome of [`MappingTable::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Code the entry belongs to; the parsed code for placeholders.
    pub code: String,
    pub entry: MappingEntry,
    pub kind: MatchKind,
}

impl Resolution {
    /// Numeric part of the resolved code.
    pub fn id(&self) -> &str {
        self.code.trim_start_matches('X')
    }
}

/// Immutable code → entry table.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<(String, MappingEntry)>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    /// Create an empty table (every lookup falls through to a placeholder).
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Build a table from `(code, entry)` pairs. Codes are normalized; the
    /// first occurrence of a code wins.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, MappingEntry)>,
        K: AsRef<str>,
    {
        let mut table = Self::default();
        for (code, entry) in entries {
            let code = normalize_code(code.as_ref());
            if table.index.contains_key(&code) {
                warn!(code = %code, "duplicate code in mapping table, keeping first");
                continue;
            }
            table.index.insert(code.clone(), table.entries.len());
            table.entries.push((code, entry));
        }
        table
    }

    /// Parse a JSON reference table.
    pub fn from_json(raw: &str) -> flowdex_core::Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut entries = Vec::with_capacity(map.len());
        for (code, value) in map {
            let entry: MappingEntry = serde_json::from_value(value).map_err(|e| {
                flowdex_core::FlowdexError::Mapping(format!("entry {}: {}", code, e))
            })?;
            entries.push((code, entry));
        }
        Ok(Self::from_entries(entries))
    }

    /// Load the table from disk. A missing file yields an empty table.
    pub fn load(path: &Path) -> flowdex_core::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "mapping file not found, every archive gets a placeholder entry");
            return Ok(Self::new_empty());
        }
        let raw = std::fs::read_to_string(path)?;
        let table = Self::from_json(&raw).map_err(|e| {
            flowdex_core::FlowdexError::Mapping(format!("failed to load {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), entries = table.len(), "loaded mapping table");
        Ok(table)
    }

    pub fn get(&self, code: &str) -> Option<&MappingEntry> {
        self.index.get(code).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a parsed filename: direct hit, then fuzzy match, then placeholder.
    pub fn resolve(&self, parsed: &ParsedIdentifier, filename: &str) -> Resolution {
        if let Some(entry) = self.get(&parsed.code) {
            return Resolution {
                code: parsed.code.clone(),
                entry: entry.clone(),
                kind: MatchKind::Direct,
            };
        }

        if let Some((code, entry, score)) = self.best_fuzzy(parsed, filename) {
            debug!(filename, code, score, "fuzzy mapping match");
            return Resolution {
                code: code.to_string(),
                entry: entry.clone(),
                kind: MatchKind::Fuzzy { score },
            };
        }

        Resolution {
            code: parsed.code.clone(),
            entry: placeholder_entry(parsed.number),
            kind: MatchKind::Placeholder,
        }
    }

    /// Highest-scoring entry at or above [`MIN_FUZZY_SCORE`]. Ties keep the
    /// entry that comes first in the table.
    fn best_fuzzy(
        &self,
        parsed: &ParsedIdentifier,
        filename: &str,
    ) -> Option<(&str, &MappingEntry, usize)> {
        let haystack: Vec<char> = filename.to_lowercase().chars().collect();
        let slug = parsed.slug.as_deref().map(str::to_lowercase);

        let mut best: Option<(&str, &MappingEntry, usize)> = None;
        for (code, entry) in self.iter() {
            let reference = entry.reference_text();
            let needle: Vec<char> = reference.chars().collect();
            let mut score = longest_common_substring(&needle, &haystack);
            if score > 0 && slug.as_deref() == Some(reference.as_str()) {
                score += EXACT_SLUG_BONUS;
            }
            if score > best.map_or(0, |(_, _, s)| s) {
                best = Some((code, entry, score));
            }
        }
        best.filter(|&(_, _, score)| score >= MIN_FUZZY_SCORE)
    }
}

/// Entry used when a code has no match in the table.
pub fn placeholder_entry(number: u64) -> MappingEntry {
    MappingEntry {
        description: format!("Coze 工作流模板 #{}", number),
        category: PLACEHOLDER_CATEGORY.into(),
        type_code: PLACEHOLDER_TYPE_CODE.into(),
        original_id: None,
    }
}

/// Length in characters of the longest run of `a` that also appears in `b`.
pub fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    let mut best = 0;
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            best = best.max(cur[j + 1]);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn entry(description: &str, category: &str, original_id: Option<&str>) -> MappingEntry {
        MappingEntry {
            description: description.into(),
            category: category.into(),
            type_code: "W".into(),
            original_id: original_id.map(str::to_string),
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn lcs_lengths() {
        assert_eq!(longest_common_substring(&chars("abcdef"), &chars("zzcdezz")), 3);
        assert_eq!(longest_common_substring(&chars(""), &chars("abc")), 0);
        assert_eq!(longest_common_substring(&chars("老黄历"), &chars("查老黄历")), 3);
    }

    #[test]
    fn direct_lookup_wins() {
        let table = MappingTable::from_entries([("X1", entry("老黄历查询", "工具", None))]);
        let name = "Workflow-X1_laohuangli_1-draft-10.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.kind, MatchKind::Direct);
        assert_eq!(r.code, "X1");
        assert_eq!(r.id(), "1");
        assert_eq!(r.entry.category, "工具");
    }

    #[test]
    fn fuzzy_threshold_ten_is_accepted() {
        let table = MappingTable::from_entries([("X50", entry("d", "视频", Some("X50_abcdefghij")))]);
        let name = "Workflow-X999_abcdefghijqq_1-draft-1.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.kind, MatchKind::Fuzzy { score: 10 });
        assert_eq!(r.code, "X50");
    }

    #[test]
    fn fuzzy_threshold_nine_is_rejected() {
        let table = MappingTable::from_entries([("X50", entry("d", "视频", Some("X50_abcdefghi")))]);
        let name = "Workflow-X999_abcdefghiqq_1-draft-1.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.kind, MatchKind::Placeholder);
        assert_eq!(r.code, "X999");
        assert_eq!(r.entry.category, PLACEHOLDER_CATEGORY);
        assert_eq!(r.entry.description, "Coze 工作流模板 #999");
    }

    #[test]
    fn fuzzy_exact_slug_gets_bonus() {
        let table = MappingTable::from_entries([("X50", entry("d", "视频", Some("X50_shudan")))]);
        let name = "Workflow-X999_shudan_1-draft-1.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.kind, MatchKind::Fuzzy { score: 1006 });
    }

    #[test]
    fn fuzzy_tie_keeps_first_entry() {
        let table = MappingTable::from_entries([
            ("X10", entry("first", "A", Some("X10_abcdefghijkl"))),
            ("X11", entry("second", "B", Some("X11_abcdefghijkl"))),
        ]);
        let name = "Workflow-X999_abcdefghijklzz_1-draft-1.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.code, "X10");
    }

    #[test]
    fn fuzzy_falls_back_to_description() {
        let table = MappingTable::from_entries([("X3", entry("gushici_generator", "文档", None))]);
        let name = "Workflow-X998_gushici_generator_v2_1-draft-1.zip";
        let r = table.resolve(&parse(name).unwrap(), name);
        assert_eq!(r.code, "X3");
    }

    #[test]
    fn from_json_preserves_order_and_normalizes() {
        let raw = r#"{
            "X_2": {"description": "b", "type": "视频", "type_code": "V"},
            "X1": {"description": "a", "type": "工具"}
        }"#;
        let table = MappingTable::from_json(raw).unwrap();
        let codes: Vec<_> = table.iter().map(|(c, _)| c.to_string()).collect();
        assert_eq!(codes, vec!["X2", "X1"]);
        assert_eq!(table.get("X1").unwrap().type_code, "W");
    }

    #[test]
    fn from_json_rejects_bad_entries() {
        let err = MappingTable::from_json(r#"{"X1": {"type": "工具"}}"#).unwrap_err();
        assert!(err.to_string().contains("X1"));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let table = MappingTable::load(Path::new("/nonexistent/mapping.json")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(
            &path,
            r#"{"X1": {"description": "老黄历查询", "type": "工具", "type_code": "W"}}"#,
        )
        .unwrap();
        let table = MappingTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("X1").unwrap().description, "老黄历查询");
    }
}
