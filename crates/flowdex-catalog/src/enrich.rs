//! Display name construction for resolved archives.

use crate::mapping::{MatchKind, Resolution};
use crate::parser::ParsedIdentifier;

/// Version markers: first hit whose label is not already in the name is appended.
const VERSION_MARKERS: &[(&str, &str)] = &[
    ("V54", "V54版"),
    ("v2", "V2版"),
    ("v3", "V3版"),
    ("pro", "专业版"),
    ("new", "新版"),
    ("max", "增强版"),
    ("_mul", "多页版"),
    ("by_file", "文件版"),
    ("by_url", "链接版"),
];

/// `(code, filename keyword) → label` overrides for codes whose upstream
/// descriptions collide.
const CODE_OVERRIDES: &[(&str, &str, &str)] = &[
    ("X7", "W_red_word", "(文档版)"),
    ("X21", "Tredbook_table", "(表格版)"),
    ("X147", "_32_", "(V32)"),
    ("X183", "_589_", "(V589)"),
    ("X91", "ertonghongshui", "(V1)"),
    ("X125", "children_to_leep", "(V2)"),
    ("X66", "shudananhei", "(V1)"),
    ("X233", "V_shudan_anhei", "(V2)"),
    ("X241", "Vflux_dianshang", "(Flux版)"),
    ("X242", "flux_video", "(视频版)"),
];

const STEP_NUMERALS: [&str; 3] = ["一", "二", "三"];

/// Name and description shown for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    pub name: String,
    pub description: String,
}

impl DisplayText {
    fn append(&mut self, suffix: &str) {
        self.name.push_str(suffix);
        self.description.push_str(suffix);
    }
}

/// Build the display text for a resolved archive.
pub fn display_text(
    parsed: &ParsedIdentifier,
    resolution: &Resolution,
    filename: &str,
) -> DisplayText {
    let lower = filename.to_lowercase();

    let mut text = match resolution.kind {
        MatchKind::Placeholder => DisplayText {
            name: format!("工作流 #{}", resolution.id()),
            description: resolution.entry.description.clone(),
        },
        MatchKind::Direct | MatchKind::Fuzzy { .. } => DisplayText {
            name: resolution.entry.description.clone(),
            description: resolution.entry.description.clone(),
        },
    };

    if let Some(step) = parsed.step {
        let marker = format!("第{}步", STEP_NUMERALS[usize::from(step.clamp(1, 3)) - 1]);
        if resolution.kind == MatchKind::Placeholder || !text.name.contains(&marker) {
            text.append(&format!(" - 第{}步", step));
        }
    }

    if let Some((_, label)) = VERSION_MARKERS
        .iter()
        .find(|(marker, label)| lower.contains(&marker.to_lowercase()) && !text.name.contains(*label))
    {
        text.append(&format!(" ({})", label));
    }

    if let Some((_, _, label)) = CODE_OVERRIDES.iter().find(|(code, keyword, label)| {
        *code == resolution.code && lower.contains(&keyword.to_lowercase()) && !text.name.contains(*label)
    }) {
        text.append(&format!(" {}", label));
    }

    if parsed.literal_code != resolution.code {
        text.append(&format!(" [原始:{}]", parsed.literal_code));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingEntry, MappingTable};
    use crate::parser::parse;

    fn table() -> MappingTable {
        MappingTable::from_entries([
            (
                "X1",
                MappingEntry {
                    description: "老黄历查询".into(),
                    category: "工具".into(),
                    type_code: "W".into(),
                    original_id: Some("X1_laohuangli".into()),
                },
            ),
            (
                "X7",
                MappingEntry {
                    description: "小红书笔记".into(),
                    category: "文档".into(),
                    type_code: "W".into(),
                    original_id: None,
                },
            ),
            (
                "X100",
                MappingEntry {
                    description: "绘本视频 第二步".into(),
                    category: "视频".into(),
                    type_code: "V".into(),
                    original_id: None,
                },
            ),
            (
                "X141",
                MappingEntry {
                    description: "剪映草稿".into(),
                    category: "视频".into(),
                    type_code: "V".into(),
                    original_id: None,
                },
            ),
        ])
    }

    fn text_for(name: &str) -> DisplayText {
        let parsed = parse(name).unwrap();
        let resolution = table().resolve(&parsed, name);
        display_text(&parsed, &resolution, name)
    }

    #[test]
    fn direct_match_uses_description() {
        let t = text_for("Workflow-X1_laohuangli_1-draft-10.zip");
        assert_eq!(t.name, "老黄历查询");
        assert_eq!(t.description, "老黄历查询");
    }

    #[test]
    fn placeholder_name_and_step() {
        let t = text_for("Workflow-X500_foo_step1_1-draft-1.zip");
        assert_eq!(t.name, "工作流 #500 - 第1步");
        assert_eq!(t.description, "Coze 工作流模板 #500 - 第1步");
    }

    #[test]
    fn step_suffix_skipped_when_name_has_it() {
        let t = text_for("Workflow-X100_Vhuiben_step2video_1-draft-1.zip");
        assert_eq!(t.name, "绘本视频 第二步");
    }

    #[test]
    fn first_version_marker_only() {
        let t = text_for("Workflow-X1_laohuangli_pro_v2_1-draft-1.zip");
        assert_eq!(t.name, "老黄历查询 (V2版)");
    }

    #[test]
    fn code_override_appends_label() {
        let t = text_for("Workflow-X7_W_red_word_1-draft-3.zip");
        assert_eq!(t.name, "小红书笔记 (文档版)");
    }

    #[test]
    fn shifted_code_gets_original_marker() {
        let t = text_for("Workflow-X140_jy_draft_02_1-draft-1.zip");
        assert_eq!(t.name, "剪映草稿 [原始:X140]");
    }
}
