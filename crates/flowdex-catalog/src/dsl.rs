//! DSL catalogs: YAML workflow exports (`app` metadata plus a
//! `workflow.graph` of nodes and edges).

use flowdex_core::{CatalogItem, Category, ScanReport, SkipReason, WorkflowDetails};
use serde_yaml::Value;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::source::{CatalogSource, download_url};

pub const DEFAULT_DESCRIPTION: &str = "暂无描述";
pub const DEFAULT_ICON: &str = "🤖";
pub const DEFAULT_MODE: &str = "workflow";
pub const DEFAULT_CATEGORY: &str = "utility";

const MAX_NODE_TYPES: usize = 6;
const MAX_MODELS: usize = 3;

/// Node types that are editor furniture rather than workflow steps.
const IGNORED_NODE_TYPES: &[&str] = &["custom", "custom-note", "custom-iteration-start"];

/// `(id, display name, keywords)`, matched in order; first hit wins.
const CATEGORY_TABLE: &[(&str, &str, &[&str])] = &[
    (
        "translation",
        "翻译&语言",
        &["翻译", "译", "translate", "translation", "英译中", "中译英", "多语言", "language"],
    ),
    (
        "content",
        "内容创作",
        &["文章", "标题", "写作", "文案", "创作", "seo", "仿写", "小红书", "抖音", "运营", "博客"],
    ),
    (
        "ai-art",
        "AI 绘画",
        &["绘画", "画图", "图像", "flux", "即梦", "插画", "绘本", "图片", "image", "art", "draw"],
    ),
    (
        "data-analysis",
        "数据分析",
        &["数据", "分析", "统计", "股票", "excel", "表格", "chart", "图表", "matplotlib"],
    ),
    (
        "document",
        "文档处理",
        &["文档", "发票", "合同", "pdf", "知识库", "文件", "file", "document", "解析"],
    ),
    (
        "chatbot",
        "聊天机器人",
        &["聊天", "客服", "对话", "意图", "记忆", "chat", "bot", "问答", "机器人"],
    ),
    (
        "code",
        "代码开发",
        &["代码", "code", "python", "coding", "api", "sql", "编程", "开发"],
    ),
    (
        "research",
        "搜索&研究",
        &["搜索", "研究", "search", "research", "jina", "爬虫", "网页", "web"],
    ),
    ("agent", "Agent&工具", &["agent", "mcp", "工具", "tool", "智能体", "flow"]),
    (
        "education",
        "教育学习",
        &["学习", "教育", "教学", "题目", "面试", "培训", "课程", "学生"],
    ),
    (
        "media",
        "媒体&视频",
        &["视频", "音频", "语音", "tts", "播客", "youtube", "媒体", "video", "audio"],
    ),
    (
        "utility",
        "实用工具",
        &["工具", "json", "春联", "思维导图", "邮件", "表单", "form", "生成器"],
    ),
];

/// Pick a category id from the filename and description.
pub fn categorize(filename: &str, description: &str) -> &'static str {
    let text = format!("{} {}", filename, description).to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(_, _, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(id, _, _)| *id)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Display name of a category id; unknown ids are returned as-is.
pub fn category_name(id: &str) -> &str {
    CATEGORY_TABLE
        .iter()
        .find(|(cid, _, _)| *cid == id)
        .map(|(_, name, _)| *name)
        .unwrap_or(id)
}

pub fn mode_display(mode: &str) -> &str {
    match mode {
        "workflow" => "Workflow",
        "chatflow" => "Chatflow",
        "agent-chat" | "advanced-chat" => "Agent",
        "completion" => "Completion",
        other => other,
    }
}

fn node_type_display(kind: &str) -> &str {
    match kind {
        "llm" => "LLM",
        "code" => "代码",
        "start" => "开始",
        "end" => "结束",
        "iteration" => "迭代",
        "if-else" => "条件",
        "variable-assigner" => "变量",
        "template-transform" => "模板",
        "http-request" => "HTTP",
        "tool" => "工具",
        "knowledge-retrieval" => "知识库",
        other => other,
    }
}

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DslDocument {
    pub name: String,
    /// Empty when the document carries none.
    pub description: String,
    pub details: WorkflowDetails,
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `app.<key>`, falling back to the top-level `<key>`.
fn app_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    non_empty_str(data.get("app").and_then(|a| a.get(key))).or_else(|| non_empty_str(data.get(key)))
}

/// Parse a YAML workflow export. `Ok(None)` means the document is empty.
pub fn parse_document(raw: &str, stem: &str) -> Result<Option<DslDocument>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let data: Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
    if data.is_null() {
        return Ok(None);
    }
    if !data.is_mapping() {
        return Err("top-level value is not a mapping".into());
    }

    let app = data.get("app");
    let name = app_field(&data, "name").unwrap_or(stem).to_string();
    let description = app_field(&data, "description").unwrap_or_default().to_string();
    let icon = app
        .and_then(|a| a.get("icon"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ICON)
        .to_string();
    let mode = app
        .and_then(|a| a.get("mode"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MODE)
        .to_string();

    let graph = data.get("workflow").and_then(|w| w.get("graph"));
    let nodes = graph
        .and_then(|g| g.get("nodes"))
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let edge_count = graph
        .and_then(|g| g.get("edges"))
        .and_then(Value::as_sequence)
        .map_or(0, Vec::len);

    let mut type_counts: Vec<(String, usize)> = Vec::new();
    let mut models = BTreeSet::new();
    let mut llm_count = 0;
    let mut code_count = 0;

    for node in nodes {
        let data = node.get("data");
        let Some(kind) = non_empty_str(data.and_then(|d| d.get("type"))).or(non_empty_str(node.get("type")))
        else {
            continue;
        };

        if !IGNORED_NODE_TYPES.contains(&kind) {
            match type_counts.iter_mut().find(|(k, _)| k == kind) {
                Some((_, n)) => *n += 1,
                None => type_counts.push((kind.to_string(), 1)),
            }
        }

        match kind {
            "llm" => {
                llm_count += 1;
                let model = data.and_then(|d| d.get("model"));
                if let Some(model_name) = non_empty_str(model.and_then(|m| m.get("name"))) {
                    match non_empty_str(model.and_then(|m| m.get("provider"))) {
                        Some(provider) => models.insert(format!("{}/{}", provider, model_name)),
                        None => models.insert(model_name.to_string()),
                    };
                }
            }
            "code" => code_count += 1,
            _ => {}
        }
    }

    let node_types = type_counts
        .iter()
        .take(MAX_NODE_TYPES)
        .map(|(kind, n)| format!("{}×{}", node_type_display(kind), n))
        .collect();

    Ok(Some(DslDocument {
        name,
        description,
        details: WorkflowDetails {
            icon,
            mode_display: mode_display(&mode).to_string(),
            mode,
            node_count: nodes.len(),
            edge_count,
            llm_count,
            code_count,
            node_types,
            models_used: models.into_iter().take(MAX_MODELS).collect(),
        },
    }))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
}

/// Source over one or more directory trees of YAML exports.
pub struct DslSource {
    name: String,
    dirs: Vec<PathBuf>,
}

impl DslSource {
    pub fn new(name: impl Into<String>, dirs: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dirs,
        }
    }

    fn build_item(&self, dir: &Path, path: &Path, filename: &str, doc: DslDocument) -> CatalogItem {
        let category = categorize(filename, &doc.description);
        let description = if doc.description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            doc.description
        };
        CatalogItem {
            id: filename.to_string(),
            filename: filename.to_string(),
            name: doc.name,
            category: category.to_string(),
            kind: doc.details.mode_display.clone(),
            source: dir.display().to_string(),
            description,
            tags: vec![category_name(category).to_string(), doc.details.mode_display.clone()],
            url: download_url(&self.name, filename),
            details: Some(doc.details),
            path: path.to_path_buf(),
            revision: 0,
        }
    }
}

impl CatalogSource for DslSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "dsl"
    }

    fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();
        let mut seen = HashSet::new();

        for dir in &self.dirs {
            if !dir.is_dir() {
                debug!(catalog = %self.name, dir = %dir.display(), "DSL directory missing, skipping");
                continue;
            }

            for entry in WalkDir::new(dir).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(catalog = %self.name, error = %e, "failed to walk DSL directory");
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_file() || !is_yaml(path) {
                    continue;
                }

                let filename = entry.file_name().to_string_lossy().into_owned();
                if seen.contains(&filename) {
                    debug!(catalog = %self.name, filename = %filename, "duplicate filename, keeping first");
                    continue;
                }
                report.scanned += 1;

                let raw = match std::fs::read_to_string(path) {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(catalog = %self.name, path = %path.display(), error = %e, "failed to read DSL file");
                        report.skip(filename, SkipReason::Io(e.to_string()));
                        continue;
                    }
                };

                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| filename.clone());

                match parse_document(&raw, &stem) {
                    Ok(Some(doc)) => {
                        seen.insert(filename.clone());
                        let item = self.build_item(dir, path, &filename, doc);
                        report.items.push(item);
                    }
                    Ok(None) => {
                        debug!(catalog = %self.name, filename = %filename, "empty DSL document");
                        report.skip(filename, SkipReason::EmptyDocument);
                    }
                    Err(e) => {
                        warn!(catalog = %self.name, filename = %filename, error = %e, "invalid DSL document");
                        report.skip(filename, SkipReason::InvalidDocument(e));
                    }
                }
            }
        }

        report.items.sort_by(|a, b| node_count(b).cmp(&node_count(a)));

        info!(
            catalog = %self.name,
            scanned = report.scanned,
            items = report.items.len(),
            skipped = report.skipped.len(),
            "DSL scan complete"
        );
        report
    }

    fn categories(&self, _items: &[CatalogItem]) -> Vec<Category> {
        CATEGORY_TABLE
            .iter()
            .map(|(id, name, _)| Category {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn category_counts(&self, items: &[CatalogItem]) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = CATEGORY_TABLE.iter().map(|(id, _, _)| (id.to_string(), 0)).collect();
        for item in items {
            match counts.iter_mut().find(|(id, _)| *id == item.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.category.clone(), 1)),
            }
        }
        counts
    }

    fn stats(&self, items: &[CatalogItem]) -> serde_json::Value {
        let details = || items.iter().filter_map(|i| i.details.as_ref());
        let models: BTreeSet<&str> = details()
            .flat_map(|d| d.models_used.iter().map(String::as_str))
            .collect();
        serde_json::json!({
            "total": items.len(),
            "total_nodes": details().map(|d| d.node_count).sum::<usize>(),
            "total_llm": details().map(|d| d.llm_count).sum::<usize>(),
            "total_edges": details().map(|d| d.edge_count).sum::<usize>(),
            "unique_models": models.len(),
            "categories": CATEGORY_TABLE.len(),
        })
    }

    fn detail(&self, item: &CatalogItem) -> flowdex_core::Result<serde_json::Value> {
        let mut value = serde_json::to_value(item)?;
        let raw_yaml = match read_yaml_as_json(&item.path) {
            Ok(v) => v,
            Err(e) => {
                warn!(catalog = %self.name, filename = %item.filename, error = %e, "failed to re-read DSL file");
                serde_json::Value::Object(Default::default())
            }
        };
        if let Some(obj) = value.as_object_mut() {
            obj.insert("raw_yaml".into(), raw_yaml);
        }
        Ok(value)
    }
}

fn node_count(item: &CatalogItem) -> usize {
    item.details.as_ref().map_or(0, |d| d.node_count)
}

fn read_yaml_as_json(path: &Path) -> flowdex_core::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)?;
    let yaml: Value = serde_yaml::from_str(&raw)?;
    Ok(serde_json::to_value(yaml)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSLATOR: &str = r#"
app:
  name: 中英翻译助手
  description: 把中文翻译成英文
  icon: "🌐"
  mode: advanced-chat
workflow:
  graph:
    nodes:
      - data: { type: start }
      - data:
          type: llm
          model: { provider: openai, name: gpt-4o }
      - data:
          type: llm
          model: { provider: anthropic, name: claude }
      - data: { type: code }
      - type: custom-note
      - data: { type: end }
    edges:
      - { source: a, target: b }
      - { source: b, target: c }
"#;

    #[test]
    fn parses_app_metadata_and_graph() {
        let doc = parse_document(TRANSLATOR, "translator").unwrap().unwrap();
        assert_eq!(doc.name, "中英翻译助手");
        assert_eq!(doc.description, "把中文翻译成英文");
        assert_eq!(doc.details.icon, "🌐");
        assert_eq!(doc.details.mode, "advanced-chat");
        assert_eq!(doc.details.mode_display, "Agent");
        assert_eq!(doc.details.node_count, 6);
        assert_eq!(doc.details.edge_count, 2);
        assert_eq!(doc.details.llm_count, 2);
        assert_eq!(doc.details.code_count, 1);
        assert_eq!(doc.details.node_types, vec!["开始×1", "LLM×2", "代码×1", "结束×1"]);
        assert_eq!(doc.details.models_used, vec!["anthropic/claude", "openai/gpt-4o"]);
    }

    #[test]
    fn falls_back_to_top_level_then_stem() {
        let doc = parse_document("name: top\ndescription: d\n", "stem").unwrap().unwrap();
        assert_eq!(doc.name, "top");
        assert_eq!(doc.description, "d");
        assert_eq!(doc.details.icon, DEFAULT_ICON);
        assert_eq!(doc.details.mode_display, "Workflow");

        let doc = parse_document("app: { name: '' }\n", "stem").unwrap().unwrap();
        assert_eq!(doc.name, "stem");
        assert_eq!(doc.description, "");
        assert_eq!(doc.details.node_count, 0);
    }

    #[test]
    fn empty_and_invalid_documents() {
        assert_eq!(parse_document("", "x").unwrap(), None);
        assert!(parse_document("app: [unclosed", "x").is_err());
        assert!(parse_document("- a\n- b\n", "x").is_err());
    }

    #[test]
    fn categorize_first_hit_wins() {
        assert_eq!(categorize("translator.yml", "把中文翻译成英文"), "translation");
        assert_eq!(categorize("seo_title.yml", ""), "content");
        assert_eq!(categorize("random.yml", "nothing here"), "utility");
        // "工具" hits agent before utility.
        assert_eq!(categorize("x.yml", "小工具"), "agent");
    }

    #[test]
    fn mode_display_passes_unknown_through() {
        assert_eq!(mode_display("chatflow"), "Chatflow");
        assert_eq!(mode_display("completion"), "Completion");
        assert_eq!(mode_display("custom-mode"), "custom-mode");
    }

    #[test]
    fn scan_walks_sorts_and_skips() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("translator.yml"), TRANSLATOR).unwrap();
        std::fs::write(root.path().join("small.yaml"), "app: { name: small }\nworkflow: { graph: { nodes: [ { data: { type: start } } ] } }\n").unwrap();
        std::fs::write(root.path().join("empty.yml"), "").unwrap();
        std::fs::write(root.path().join("broken.yml"), "app: [unclosed").unwrap();
        std::fs::write(root.path().join("notes.txt"), "ignored").unwrap();

        let src = DslSource::new("dify", vec![root.path().to_path_buf()]);
        let report = src.scan();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].filename, "translator.yml");
        assert_eq!(report.items[1].filename, "small.yaml");
        assert_eq!(report.items[1].description, DEFAULT_DESCRIPTION);
        assert_eq!(report.items[0].tags, vec!["翻译&语言", "Agent"]);
        assert_eq!(report.items[0].url, "/api/v1/dify/download/translator.yml");

        let reasons: Vec<_> = report.skipped.iter().map(|s| (s.filename.as_str(), &s.reason)).collect();
        assert!(reasons.contains(&("empty.yml", &SkipReason::EmptyDocument)));
        assert!(
            report
                .skipped
                .iter()
                .any(|s| s.filename == "broken.yml" && matches!(s.reason, SkipReason::InvalidDocument(_)))
        );
    }

    #[test]
    fn first_filename_wins_across_dirs() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("same.yml"), "app: { name: first }\n").unwrap();
        std::fs::write(b.path().join("same.yml"), "app: { name: second }\n").unwrap();

        let src = DslSource::new("dify", vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let report = src.scan();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].name, "first");
    }

    #[test]
    fn counts_are_preseeded_and_stats_sum() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("translator.yml"), TRANSLATOR).unwrap();
        let src = DslSource::new("dify", vec![root.path().to_path_buf()]);
        let items = src.scan().items;

        let counts = src.category_counts(&items);
        assert_eq!(counts.len(), CATEGORY_TABLE.len());
        assert_eq!(counts[0], ("translation".to_string(), 1));
        assert!(counts[1..].iter().all(|(_, n)| *n == 0));
        assert_eq!(src.categories(&items).len(), 12);

        let stats = src.stats(&items);
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["total_nodes"], 6);
        assert_eq!(stats["total_llm"], 2);
        assert_eq!(stats["unique_models"], 2);
        assert_eq!(stats["categories"], 12);

        let detail = src.detail(&items[0]).unwrap();
        assert_eq!(detail["raw_yaml"]["app"]["name"], "中英翻译助手");
        assert_eq!(detail["node_count"], 6);
    }
}
