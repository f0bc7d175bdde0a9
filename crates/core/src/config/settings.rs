use crate::config::{ConfigError, ConfigResult, ConfigSource, Properties};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Property keys recognised by the session pipeline
pub mod keys {
    pub const ENABLE_LOGGER: &str = "enableLogger";
    pub const ENABLE_MAPPER_SCAN_LOG: &str = "enableMapperScanLog";
    pub const ENABLE_RUNTIME_LOG: &str = "enableRuntimeLog";
    pub const ENABLE_COMPILATION_LOG: &str = "enableCompilationLog";
    pub const ENABLE_KEYWORDS_TO_UPPERCASE: &str = "enableKeywordsToUppercase";
    pub const DATABASE_COLUMN_STYLE: &str = "databaseColumnStyle";
    pub const ENABLE_XML_SYNTAX_PARSING: &str = "enableXmlSyntaxParsing";

    pub const ALL: [&str; 7] = [
        ENABLE_LOGGER,
        ENABLE_MAPPER_SCAN_LOG,
        ENABLE_RUNTIME_LOG,
        ENABLE_COMPILATION_LOG,
        ENABLE_KEYWORDS_TO_UPPERCASE,
        DATABASE_COLUMN_STYLE,
        ENABLE_XML_SYNTAX_PARSING,
    ];
}

/// Typed settings loaded from property overrides
pub trait SettingsTrait: Sized {
    /// Build settings from property overrides, falling back to defaults
    fn from_properties(properties: &Properties) -> ConfigResult<Self>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> &HashMap<String, ConfigSource>;
}

/// Naming style applied to database column names derived from properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStyle {
    Lowercase,
    Uppercase,
    #[default]
    LowercaseUnderline,
    UppercaseUnderline,
    Camelcase,
    CapitalCamelcase,
}

impl ColumnStyle {
    pub const VARIANTS: [&'static str; 6] = [
        "lowercase",
        "uppercase",
        "lowercase_underline",
        "uppercase_underline",
        "camelcase",
        "capital_camelcase",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnStyle::Lowercase => "lowercase",
            ColumnStyle::Uppercase => "uppercase",
            ColumnStyle::LowercaseUnderline => "lowercase_underline",
            ColumnStyle::UppercaseUnderline => "uppercase_underline",
            ColumnStyle::Camelcase => "camelcase",
            ColumnStyle::CapitalCamelcase => "capital_camelcase",
        }
    }

    /// Apply the style to a property name written in camelCase
    pub fn apply(&self, property: &str) -> String {
        let words = split_camel(property);
        match self {
            ColumnStyle::Lowercase => words.concat().to_lowercase(),
            ColumnStyle::Uppercase => words.concat().to_uppercase(),
            ColumnStyle::LowercaseUnderline => words.join("_").to_lowercase(),
            ColumnStyle::UppercaseUnderline => words.join("_").to_uppercase(),
            ColumnStyle::Camelcase => camel(&words, false),
            ColumnStyle::CapitalCamelcase => camel(&words, true),
        }
    }
}

impl FromStr for ColumnStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowercase" => Ok(ColumnStyle::Lowercase),
            "uppercase" => Ok(ColumnStyle::Uppercase),
            "lowercase_underline" | "underline" => Ok(ColumnStyle::LowercaseUnderline),
            "uppercase_underline" => Ok(ColumnStyle::UppercaseUnderline),
            "camelcase" => Ok(ColumnStyle::Camelcase),
            "capital_camelcase" => Ok(ColumnStyle::CapitalCamelcase),
            _ => Err(ConfigError::invalid_value(
                keys::DATABASE_COLUMN_STYLE,
                s,
                format!("one of: {}", ColumnStyle::VARIANTS.join(", ")),
            )),
        }
    }
}

impl std::fmt::Display for ColumnStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn split_camel(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn camel(words: &[String], capital_first: bool) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 && !capital_first {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Flags the session pipeline recognises in its property overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperSettings {
    /// Bootstrap banners on build/finalize
    pub enable_logger: bool,
    pub enable_mapper_scan_log: bool,
    pub enable_runtime_log: bool,
    pub enable_compilation_log: bool,
    pub enable_keywords_to_uppercase: bool,
    pub database_column_style: ColumnStyle,
    pub enable_xml_syntax_parsing: bool,
    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            enable_logger: true,
            enable_mapper_scan_log: false,
            enable_runtime_log: false,
            enable_compilation_log: false,
            enable_keywords_to_uppercase: false,
            database_column_style: ColumnStyle::default(),
            enable_xml_syntax_parsing: false,
            sources: HashMap::new(),
        }
    }
}

// Equality ignores `sources`.
impl PartialEq for MapperSettings {
    fn eq(&self, other: &Self) -> bool {
        self.enable_logger == other.enable_logger
            && self.enable_mapper_scan_log == other.enable_mapper_scan_log
            && self.enable_runtime_log == other.enable_runtime_log
            && self.enable_compilation_log == other.enable_compilation_log
            && self.enable_keywords_to_uppercase == other.enable_keywords_to_uppercase
            && self.database_column_style == other.database_column_style
            && self.enable_xml_syntax_parsing == other.enable_xml_syntax_parsing
    }
}

impl Eq for MapperSettings {}

impl MapperSettings {
    /// Settings from `MAPFORGE_*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let properties = Properties::from_env();
        let mut settings = Self::from_properties(&properties)?;
        for key in keys::ALL {
            if properties.contains_key(key) {
                settings.sources.insert(
                    key.to_string(),
                    ConfigSource::EnvVar(env_var_name(key)),
                );
            }
        }
        Ok(settings)
    }

    // `enableLogger` is the master switch for every category below.

    pub fn bootstrap_log_enabled(&self) -> bool {
        self.enable_logger
    }

    pub fn scan_log_enabled(&self) -> bool {
        self.enable_logger && self.enable_mapper_scan_log
    }

    pub fn runtime_log_enabled(&self) -> bool {
        self.enable_logger && self.enable_runtime_log
    }

    pub fn compilation_log_enabled(&self) -> bool {
        self.enable_logger && self.enable_compilation_log
    }

    fn read_bool(
        properties: &Properties,
        key: &str,
        default: bool,
        sources: &mut HashMap<String, ConfigSource>,
    ) -> ConfigResult<bool> {
        match properties.get_bool(key)? {
            Some(value) => {
                sources.insert(key.to_string(), ConfigSource::Property(key.to_string()));
                Ok(value)
            }
            None => {
                sources.insert(key.to_string(), ConfigSource::Default(default.to_string()));
                Ok(default)
            }
        }
    }
}

impl SettingsTrait for MapperSettings {
    fn from_properties(properties: &Properties) -> ConfigResult<Self> {
        let defaults = Self::default();
        let mut sources = HashMap::new();

        let database_column_style = match properties.get(keys::DATABASE_COLUMN_STYLE) {
            Some(raw) => {
                sources.insert(
                    keys::DATABASE_COLUMN_STYLE.to_string(),
                    ConfigSource::Property(keys::DATABASE_COLUMN_STYLE.to_string()),
                );
                raw.parse()?
            }
            None => {
                sources.insert(
                    keys::DATABASE_COLUMN_STYLE.to_string(),
                    ConfigSource::Default(defaults.database_column_style.to_string()),
                );
                defaults.database_column_style
            }
        };

        let settings = Self {
            enable_logger: Self::read_bool(
                properties,
                keys::ENABLE_LOGGER,
                defaults.enable_logger,
                &mut sources,
            )?,
            enable_mapper_scan_log: Self::read_bool(
                properties,
                keys::ENABLE_MAPPER_SCAN_LOG,
                defaults.enable_mapper_scan_log,
                &mut sources,
            )?,
            enable_runtime_log: Self::read_bool(
                properties,
                keys::ENABLE_RUNTIME_LOG,
                defaults.enable_runtime_log,
                &mut sources,
            )?,
            enable_compilation_log: Self::read_bool(
                properties,
                keys::ENABLE_COMPILATION_LOG,
                defaults.enable_compilation_log,
                &mut sources,
            )?,
            enable_keywords_to_uppercase: Self::read_bool(
                properties,
                keys::ENABLE_KEYWORDS_TO_UPPERCASE,
                defaults.enable_keywords_to_uppercase,
                &mut sources,
            )?,
            database_column_style,
            enable_xml_syntax_parsing: Self::read_bool(
                properties,
                keys::ENABLE_XML_SYNTAX_PARSING,
                defaults.enable_xml_syntax_parsing,
                &mut sources,
            )?,
            sources,
        };

        Ok(settings)
    }

    fn config_sources(&self) -> &HashMap<String, ConfigSource> {
        &self.sources
    }
}

fn env_var_name(key: &str) -> String {
    let mut name = String::from(crate::config::ENV_PREFIX);
    for ch in key.chars() {
        if ch.is_uppercase() {
            name.push('_');
        }
        name.push(ch.to_ascii_uppercase());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_overrides() {
        let settings = MapperSettings::from_properties(&Properties::new()).unwrap();
        assert_eq!(settings, MapperSettings::default());
        assert!(settings.config_sources()[keys::ENABLE_LOGGER].is_default());
    }

    #[test]
    fn test_equality_ignores_provenance() {
        let from_props = MapperSettings::from_properties(
            &Properties::new().with(keys::ENABLE_LOGGER, true),
        )
        .unwrap();
        assert!(!from_props.config_sources().is_empty());
        assert!(MapperSettings::default().config_sources().is_empty());
        assert_eq!(from_props, MapperSettings::default());

        let changed = MapperSettings::from_properties(
            &Properties::new().with(keys::ENABLE_RUNTIME_LOG, true),
        )
        .unwrap();
        assert_ne!(changed, MapperSettings::default());
    }

    #[test]
    fn test_overrides_are_typed_and_tracked() {
        let props = Properties::new()
            .with(keys::ENABLE_MAPPER_SCAN_LOG, true)
            .with(keys::DATABASE_COLUMN_STYLE, "uppercase_underline")
            .with(keys::ENABLE_XML_SYNTAX_PARSING, "on");

        let settings = MapperSettings::from_properties(&props).unwrap();

        assert!(settings.enable_mapper_scan_log);
        assert!(settings.enable_xml_syntax_parsing);
        assert_eq!(settings.database_column_style, ColumnStyle::UppercaseUnderline);
        assert!(settings.config_sources()[keys::DATABASE_COLUMN_STYLE].is_property());
    }

    #[test]
    fn test_invalid_column_style_is_rejected() {
        let props = Properties::new().with(keys::DATABASE_COLUMN_STYLE, "kebab");
        let err = MapperSettings::from_properties(&props).unwrap_err();
        assert_eq!(err.field(), Some(keys::DATABASE_COLUMN_STYLE));
    }

    #[test]
    fn test_logger_is_master_switch() {
        let props = Properties::new()
            .with(keys::ENABLE_LOGGER, false)
            .with(keys::ENABLE_COMPILATION_LOG, true)
            .with(keys::ENABLE_MAPPER_SCAN_LOG, true);
        let settings = MapperSettings::from_properties(&props).unwrap();

        assert!(settings.enable_compilation_log);
        assert!(!settings.compilation_log_enabled());
        assert!(!settings.scan_log_enabled());
        assert!(!settings.bootstrap_log_enabled());
    }

    #[test]
    fn test_column_style_apply() {
        assert_eq!(ColumnStyle::LowercaseUnderline.apply("userName"), "user_name");
        assert_eq!(ColumnStyle::UppercaseUnderline.apply("userName"), "USER_NAME");
        assert_eq!(ColumnStyle::Uppercase.apply("userName"), "USERNAME");
        assert_eq!(ColumnStyle::Camelcase.apply("user_name"), "userName");
        assert_eq!(ColumnStyle::CapitalCamelcase.apply("userName"), "UserName");
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name(keys::ENABLE_MAPPER_SCAN_LOG), "MAPFORGE_ENABLE_MAPPER_SCAN_LOG");
    }
}
