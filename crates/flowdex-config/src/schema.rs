use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Root configuration, maps to `flowdex.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowdexConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub catalogs: Vec<CatalogConfig>,
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Enable permissive CORS (for browser front-ends on another origin).
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:4004".into(),
            cors: true,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Catalogs ───────────────────────────────────────────────────

/// How a catalog's files are discovered and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// `Workflow-X<code>_..._<n>-draft-<rev>.zip` archives plus a reference table.
    Archive,
    /// Workflow DSL documents (`.yml` / `.yaml`).
    Dsl,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Archive => write!(f, "archive"),
            CatalogKind::Dsl => write!(f, "dsl"),
        }
    }
}

/// One `[[catalogs]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// URL-safe name, used as the `{catalog}` path segment.
    pub name: String,
    pub kind: CatalogKind,
    /// Directories to scan. Archive catalogs only use the first one.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Reference table for archive catalogs.
    #[serde(default)]
    pub mapping_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl CatalogConfig {
    fn resolve_paths(&mut self, base: &Path) {
        for dir in &mut self.dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(f) = self.mapping_file.as_mut()
            && f.is_relative()
        {
            *f = base.join(&*f);
        }
    }
}

fn default_catalogs() -> Vec<CatalogConfig> {
    vec![
        CatalogConfig {
            name: "coze".into(),
            kind: CatalogKind::Archive,
            dirs: vec![PathBuf::from("coze/workflows")],
            mapping_file: Some(PathBuf::from("coze/workflow_mapping_simple.json")),
            enabled: true,
        },
        CatalogConfig {
            name: "dify".into(),
            kind: CatalogKind::Dsl,
            dirs: vec![PathBuf::from("dify/DSL")],
            mapping_file: None,
            enabled: true,
        },
    ]
}

// ── Default for root ───────────────────────────────────────────

impl Default for FlowdexConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            catalogs: default_catalogs(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl FlowdexConfig {
    /// Enabled catalogs, in declaration order.
    pub fn enabled_catalogs(&self) -> impl Iterator<Item = &CatalogConfig> {
        self.catalogs.iter().filter(|c| c.enabled)
    }

    /// Make every relative catalog path relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for c in &mut self.catalogs {
            c.resolve_paths(base);
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl FlowdexConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Server ───
        if self.server.listen.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "server.listen".into(),
                message: "listen address is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. '127.0.0.1:4004'".into()),
            });
        } else if !self.server.listen.contains(':') {
            warnings.push(ConfigWarning {
                field: "server.listen".into(),
                message: format!("'{}' is missing a port", self.server.listen),
                severity: WarningSeverity::Error,
                hint: Some("Use 'host:port'".into()),
            });
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Catalogs ───
        if self.enabled_catalogs().next().is_none() {
            warnings.push(ConfigWarning {
                field: "catalogs".into(),
                message: "no catalogs are enabled, the API will serve nothing".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Add a [[catalogs]] entry with kind = \"archive\" or \"dsl\"".into()),
            });
        }

        let mut seen = HashSet::new();
        for (i, c) in self.catalogs.iter().enumerate() {
            let field = format!("catalogs[{}]", i);

            if c.name.is_empty()
                || !c
                    .name
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
            {
                warnings.push(ConfigWarning {
                    field: format!("{}.name", field),
                    message: format!("catalog name '{}' is not URL-safe", c.name),
                    severity: WarningSeverity::Error,
                    hint: Some("Use letters, digits, '-' or '_'".into()),
                });
            }
            if !seen.insert(c.name.as_str()) {
                warnings.push(ConfigWarning {
                    field: format!("{}.name", field),
                    message: format!("duplicate catalog name '{}'", c.name),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            }

            if c.dirs.is_empty() {
                warnings.push(ConfigWarning {
                    field: format!("{}.dirs", field),
                    message: format!("catalog '{}' has no directories", c.name),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            }

            if !c.enabled {
                continue;
            }

            for dir in &c.dirs {
                if !dir.exists() {
                    warnings.push(ConfigWarning {
                        field: format!("{}.dirs", field),
                        message: format!("directory {} does not exist", dir.display()),
                        severity: WarningSeverity::Warning,
                        hint: Some("The catalog will be empty until it is created".into()),
                    });
                }
            }

            match c.kind {
                CatalogKind::Archive => {
                    if c.dirs.len() > 1 {
                        warnings.push(ConfigWarning {
                            field: format!("{}.dirs", field),
                            message: format!(
                                "archive catalog '{}' only scans its first directory",
                                c.name
                            ),
                            severity: WarningSeverity::Warning,
                            hint: None,
                        });
                    }
                    if c.mapping_file.is_none() {
                        warnings.push(ConfigWarning {
                            field: format!("{}.mapping_file", field),
                            message: format!(
                                "archive catalog '{}' has no mapping file, every entry gets a placeholder name",
                                c.name
                            ),
                            severity: WarningSeverity::Info,
                            hint: None,
                        });
                    }
                }
                CatalogKind::Dsl => {
                    if c.mapping_file.is_some() {
                        warnings.push(ConfigWarning {
                            field: format!("{}.mapping_file", field),
                            message: format!("dsl catalog '{}' ignores mapping_file", c.name),
                            severity: WarningSeverity::Info,
                            hint: None,
                        });
                    }
                }
            }
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
