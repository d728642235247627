//! Gateway environment selection

use serde::Deserialize;
use std::fmt;

/// Sandbox gateway host
pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

/// Production gateway host
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

/// Which gateway deployment requests are sent to.
///
/// Parsing is lenient: `"production"` in any case selects production and
/// every other value falls back to sandbox, so a typo never sends test
/// traffic to the live gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Sandbox
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Environment::from_name(&value)
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        Environment::from_name(value)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_maps_to_live_host() {
        assert_eq!(
            Environment::from_name("production").base_url(),
            "https://api.safaricom.co.ke"
        );
        assert_eq!(
            Environment::from_name("PRODUCTION"),
            Environment::Production
        );
    }

    #[test]
    fn sandbox_maps_to_sandbox_host() {
        assert_eq!(
            Environment::from_name("sandbox").base_url(),
            "https://sandbox.safaricom.co.ke"
        );
    }

    #[test]
    fn unknown_values_default_to_sandbox() {
        for name in ["", "staging", "prod", "live"] {
            assert_eq!(Environment::from_name(name), Environment::Sandbox, "{name}");
        }
    }

    #[test]
    fn deserializes_from_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            env: Environment,
        }
        let w: Wrapper = toml::from_str(r#"env = "Production""#).unwrap();
        assert_eq!(w.env, Environment::Production);
        let w: Wrapper = toml::from_str(r#"env = "qa""#).unwrap();
        assert_eq!(w.env, Environment::Sandbox);
    }
}
