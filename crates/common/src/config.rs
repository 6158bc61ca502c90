/// Deployment environment, selected with the `ENVIRONMENT` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Anything that is not a production alias falls back to development.
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_production_aliases() {
        assert_eq!(Environment::parse(Some("production")), Environment::Production);
        assert_eq!(Environment::parse(Some("PROD")), Environment::Production);
    }

    #[test]
    fn parse_defaults_to_development() {
        assert_eq!(Environment::parse(None), Environment::Development);
        assert_eq!(Environment::parse(Some("staging")), Environment::Development);
    }

    #[test]
    fn as_str_matches_env_names() {
        assert_eq!(Environment::Production.as_str(), "production");
        assert_eq!(Environment::Development.as_str(), "development");
    }
}
