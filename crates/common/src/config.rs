use std::fmt::Display;

use smol_str::SmolStr;
use toml::Value;

pub const DEFAULT_RECURSION_LIMIT: usize = 128;
pub const DEFAULT_CRATE_NAME: &str = "main";

/// Front-end configuration, usually read from a `tyres.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Config {
    pub crate_name: SmolStr,
    pub analysis: AnalysisConfig,
    pub codegen: CodegenConfig,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisConfig {
    /// Maximum nesting depth of trait resolution requests.
    pub recursion_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodegenConfig {
    pub mangling: ManglingVersion,
}

/// Symbol mangling scheme.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManglingVersion {
    #[default]
    Legacy,
    V0,
}

impl ManglingVersion {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::Legacy),
            "v0" => Some(Self::V0),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crate_name: SmolStr::new_static(DEFAULT_CRATE_NAME),
            analysis: AnalysisConfig::default(),
            codegen: CodegenConfig::default(),
            diagnostics: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a configuration file. Malformed TOML is an error; invalid values
    /// are recorded in [`Config::diagnostics`] and replaced by defaults.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut config = Config::default();

        let parsed: Value = content
            .parse()
            .map_err(|e: toml::de::Error| e.to_string())?;

        if let Some(value) = parsed.get("crate") {
            match value.as_table() {
                Some(table) => config.parse_crate(table),
                None => config.unexpected("crate", value, "table"),
            }
        }

        if let Some(value) = parsed.get("analysis") {
            match value.as_table() {
                Some(table) => config.parse_analysis(table),
                None => config.unexpected("analysis", value, "table"),
            }
        }

        if let Some(value) = parsed.get("codegen") {
            match value.as_table() {
                Some(table) => config.parse_codegen(table),
                None => config.unexpected("codegen", value, "table"),
            }
        }

        Ok(config)
    }

    fn parse_crate(&mut self, table: &toml::Table) {
        let Some(name) = table.get("name") else {
            return;
        };
        match name.as_str() {
            Some(name) if is_valid_name(name) => self.crate_name = SmolStr::new(name),
            Some(name) => self
                .diagnostics
                .push(ConfigDiagnostic::InvalidCrateName(SmolStr::new(name))),
            None => self.unexpected("crate.name", name, "string"),
        }
    }

    fn parse_analysis(&mut self, table: &toml::Table) {
        let Some(limit) = table.get("recursion-limit") else {
            return;
        };
        match limit.as_integer() {
            Some(limit) if limit > 0 => self.analysis.recursion_limit = limit as usize,
            Some(limit) => self
                .diagnostics
                .push(ConfigDiagnostic::InvalidRecursionLimit(limit)),
            None => self.unexpected("analysis.recursion-limit", limit, "integer"),
        }
    }

    fn parse_codegen(&mut self, table: &toml::Table) {
        let Some(mangling) = table.get("mangling") else {
            return;
        };
        match mangling.as_str() {
            Some(name) => match ManglingVersion::from_name(name) {
                Some(version) => self.codegen.mangling = version,
                None => self
                    .diagnostics
                    .push(ConfigDiagnostic::UnknownManglingVersion(SmolStr::new(name))),
            },
            None => self.unexpected("codegen.mangling", mangling, "string"),
        }
    }

    fn unexpected(&mut self, field: &str, found: &Value, expected: &str) {
        self.diagnostics.push(ConfigDiagnostic::UnexpectedTomlData {
            field: field.into(),
            found: found.type_str().to_lowercase().into(),
            expected: Some(expected.into()),
        });
    }

    pub fn formatted_diagnostics(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            None
        } else {
            Some(
                self.diagnostics
                    .iter()
                    .map(|diag| format!("  {diag}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigDiagnostic {
    InvalidCrateName(SmolStr),
    InvalidRecursionLimit(i64),
    UnknownManglingVersion(SmolStr),
    UnexpectedTomlData {
        field: SmolStr,
        found: SmolStr,
        expected: Option<SmolStr>,
    },
}

impl Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCrateName(name) => write!(f, "Invalid crate name \"{name}\""),
            Self::InvalidRecursionLimit(limit) => {
                write!(f, "Recursion limit must be positive, found {limit}")
            }
            Self::UnknownManglingVersion(name) => {
                write!(
                    f,
                    "Unknown mangling version \"{name}\", expected \"legacy\" or \"v0\""
                )
            }
            Self::UnexpectedTomlData {
                field,
                found,
                expected,
            } => {
                if let Some(expected) = expected {
                    write!(
                        f,
                        "Expected a {expected} in field {field}, but found a {found}"
                    )
                } else {
                    write!(f, "Unexpected field {field}")
                }
            }
        }
    }
}

fn is_valid_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_valid_name_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.formatted_diagnostics().is_none());
    }

    #[test]
    fn parses_all_sections() {
        let config = Config::parse(
            r#"
[crate]
name = "example"

[analysis]
recursion-limit = 16

[codegen]
mangling = "v0"
"#,
        )
        .unwrap();

        assert_eq!(config.crate_name, "example");
        assert_eq!(config.analysis.recursion_limit, 16);
        assert_eq!(config.codegen.mangling, ManglingVersion::V0);
        assert!(config.diagnostics.is_empty());
    }

    #[test]
    fn invalid_values_become_diagnostics() {
        let config = Config::parse(
            r#"
[crate]
name = "bad-name"

[analysis]
recursion-limit = "deep"

[codegen]
mangling = "v1"
"#,
        )
        .unwrap();

        assert_eq!(config.crate_name, DEFAULT_CRATE_NAME);
        assert_eq!(config.analysis.recursion_limit, DEFAULT_RECURSION_LIMIT);
        assert_eq!(config.codegen.mangling, ManglingVersion::Legacy);
        assert_eq!(
            config.diagnostics,
            vec![
                ConfigDiagnostic::InvalidCrateName("bad-name".into()),
                ConfigDiagnostic::UnexpectedTomlData {
                    field: "analysis.recursion-limit".into(),
                    found: "string".into(),
                    expected: Some("integer".into()),
                },
                ConfigDiagnostic::UnknownManglingVersion("v1".into()),
            ]
        );
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::parse("[crate").is_err());
    }
}
