//! Service configuration loaded from the environment.

use std::str::FromStr;

use anyhow::{anyhow, Context};

/// How strictly the liquid oxygen flow rate is validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiquidFlowPolicy {
    /// Flow rate must be a positive whole number, like the gas form
    #[default]
    WholeNumber,
    /// Any positive flow rate, fractional included
    Positive,
}

impl FromStr for LiquidFlowPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole" | "whole_number" => Ok(Self::WholeNumber),
            "positive" => Ok(Self::Positive),
            other => Err(anyhow!(
                "unknown liquid flow rate policy {:?} (expected \"whole\" or \"positive\")",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub static_dir: String,
    pub liquid_flow_policy: LiquidFlowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            static_dir: "static".to_string(),
            liquid_flow_policy: LiquidFlowPolicy::default(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let liquid_flow_policy = match lookup("LIQUID_FLOW_RATE_POLICY") {
            Some(value) => value
                .parse::<LiquidFlowPolicy>()
                .context("invalid LIQUID_FLOW_RATE_POLICY")?,
            None => defaults.liquid_flow_policy,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
            liquid_flow_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.liquid_flow_policy, LiquidFlowPolicy::WholeNumber);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("STATIC_DIR", "/srv/static"),
            ("LIQUID_FLOW_RATE_POLICY", "Positive"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.static_dir, "/srv/static");
        assert_eq!(config.liquid_flow_policy, LiquidFlowPolicy::Positive);
    }

    #[test]
    fn test_invalid_policy() {
        let err = Config::from_lookup(lookup(&[("LIQUID_FLOW_RATE_POLICY", "lenient")])).unwrap_err();
        assert!(format!("{:#}", err).contains("lenient"));
    }
}
