//! Collapse archive revisions into one catalog item per logical workflow.
//!
//! Grouping looks only at the filename shape, never at the mapping result,
//! so two distinct archives that resolve to the same entry stay separate.

use flowdex_core::CatalogItem;
use std::collections::HashMap;

use crate::parser::{ParsedIdentifier, strip_draft_suffix};

/// Group key for an archive: the literal code plus the first two
/// underscore-delimited tokens after the code token. Falls back to the
/// literal code when fewer than two tokens follow.
pub fn group_key(filename: &str, parsed: &ParsedIdentifier) -> String {
    let stem = strip_draft_suffix(filename);
    let rest = stem
        .strip_prefix("Workflow-")
        .and_then(|s| s.strip_prefix(parsed.raw_code.as_str()))
        .unwrap_or("");

    let tokens: Vec<&str> = rest.split('_').filter(|t| !t.is_empty()).take(2).collect();
    if tokens.len() < 2 {
        return parsed.literal_code.clone();
    }
    format!("{}_{}_{}", parsed.literal_code, tokens[0], tokens[1])
}

/// Keep the highest-revision item of every group.
///
/// Candidates are `(group key, item)` pairs; `item.revision` is compared.
/// On equal revisions the candidate seen first stays. Output keeps the order
/// in which groups were first seen.
pub fn dedup<I>(candidates: I) -> Vec<CatalogItem>
where
    I: IntoIterator<Item = (String, CatalogItem)>,
{
    let mut kept: Vec<CatalogItem> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (key, item) in candidates {
        match by_key.get(&key) {
            Some(&i) => {
                if item.revision > kept[i].revision {
                    kept[i] = item;
                }
            }
            None => {
                by_key.insert(key, kept.len());
                kept.push(item);
            }
        }
    }
    kept
}
