/// Where a settings value was taken from, for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value read from an environment variable
    EnvVar(String),
    /// Built-in default
    Default(String),
    /// Value supplied through a property override key
    Property(String),
}

impl ConfigSource {
    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Check if source is a property override
    pub fn is_property(&self) -> bool {
        matches!(self, ConfigSource::Property(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::Property(key) => format!("Property override: {}", key),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
