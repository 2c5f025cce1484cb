#[cfg(test)]
mod tests {
    use flowdex_core::*;
    use std::path::PathBuf;

    fn item(name: &str, description: &str, tags: &[&str]) -> CatalogItem {
        CatalogItem {
            id: "1".into(),
            filename: "Workflow-X1_test_1-draft-1.zip".into(),
            name: name.into(),
            category: "工具".into(),
            kind: "W".into(),
            source: "community".into(),
            description: description.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: "/api/v1/coze/download/Workflow-X1_test_1-draft-1.zip".into(),
            details: None,
            path: PathBuf::from("/data/Workflow-X1_test_1-draft-1.zip"),
            revision: 1,
        }
    }

    // ── CatalogItem tests ──────────────────────────────────────

    #[test]
    fn test_matches_text_name_description_tags() {
        let it = item("Web Search", "Find things", &["Coze", "AI"]);
        assert!(it.matches_text("search"));
        assert!(it.matches_text("things"));
        assert!(it.matches_text("coze"));
        assert!(!it.matches_text("video"));
    }

    #[test]
    fn test_item_serializes_type_and_hides_path() {
        let it = item("n", "d", &[]);
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["type"], "W");
        assert!(json.get("kind").is_none());
        assert!(json.get("path").is_none());
        assert!(json.get("revision").is_none());
        assert!(json.get("node_count").is_none());
    }

    #[test]
    fn test_item_flattens_details() {
        let mut it = item("n", "d", &[]);
        it.details = Some(WorkflowDetails {
            icon: "🤖".into(),
            mode: "workflow".into(),
            mode_display: "Workflow".into(),
            node_count: 4,
            ..Default::default()
        });
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["node_count"], 4);
        assert_eq!(json["mode_display"], "Workflow");
    }

    // ── Scan report tests ──────────────────────────────────────

    #[test]
    fn test_scan_report_skip() {
        let mut report = ScanReport::default();
        report.skip("bad.zip", SkipReason::Unparseable);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason.to_string(), "unrecognized filename");
    }

    #[test]
    fn test_skip_reason_serde() {
        let json = serde_json::to_value(SkipReason::Io("denied".into())).unwrap();
        assert_eq!(json["kind"], "io");
        assert_eq!(json["detail"], "denied");
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = FlowdexError::InvalidQuery("page must be >= 1".into());
        assert!(err.to_string().contains("page must be >= 1"));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_error_catalog() {
        let err = FlowdexError::Catalog {
            catalog: "coze".into(),
            reason: "directory missing".into(),
        };
        let s = err.to_string();
        assert!(s.contains("coze"));
        assert!(s.contains("directory missing"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FlowdexError = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }
}
