//! Explicit engine configuration.
//!
//! Visibility toggles are passed to the compiler rather than read from the
//! process environment inside the engine. Binaries build an `AbilityConfig`
//! once at startup with [`AbilityConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::{AbilityError, AbilityResult, ResourceKind};

pub const ENV_FREE_CONTENT_KINDS: &str = "COURSEWARE_FREE_CONTENT_KINDS";
pub const ENV_OPEN_TUTORIALS: &str = "COURSEWARE_OPEN_TUTORIALS";
pub const ENV_HONOR_ENTITLEMENT_EXPIRY: &str = "COURSEWARE_HONOR_ENTITLEMENT_EXPIRY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbilityConfig {
    /// Content kinds readable by everyone, regardless of tree position.
    pub free_content_kinds: Vec<ResourceKind>,
    /// Make every tutorial module readable in full by every viewer.
    pub open_tutorials: bool,
    /// Treat entitlements whose `expires` has passed as inert.
    pub honor_entitlement_expiry: bool,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            free_content_kinds: vec![ResourceKind::Tip, ResourceKind::Talk],
            open_tutorials: false,
            honor_entitlement_expiry: true,
        }
    }
}

impl AbilityConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> AbilityResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> AbilityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_FREE_CONTENT_KINDS) {
            config.free_content_kinds = parse_kinds(&raw)?;
        }
        if let Some(raw) = lookup(ENV_OPEN_TUTORIALS) {
            config.open_tutorials = parse_bool(ENV_OPEN_TUTORIALS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HONOR_ENTITLEMENT_EXPIRY) {
            config.honor_entitlement_expiry = parse_bool(ENV_HONOR_ENTITLEMENT_EXPIRY, &raw)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> AbilityResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AbilityError::InvalidConfig {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_kinds(raw: &str) -> AbilityResult<Vec<ResourceKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            ResourceKind::ALL
                .into_iter()
                .filter(|kind| *kind != ResourceKind::Other)
                .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
                .ok_or_else(|| AbilityError::InvalidConfig {
                    key: ENV_FREE_CONTENT_KINDS,
                    value: name.to_string(),
                })
        })
        .collect()
}
