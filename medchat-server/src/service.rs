//! Service families and their resolved settings.
//!
//! Each family is one process serving one router. The defaults below are what
//! a family gets when `[server.<family>]` leaves a value unset.

use std::fmt;

use clap::ValueEnum;
use medchat_core::config::{ServerConfig, ServiceOverrides};
use medchat_core::UpstreamPolicy;

/// One of the four HTTP service families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ServiceKind {
    /// Multi-persona `/chat`: medication, condition, camera.
    Advisor,
    /// Blood-pressure evaluation `/chat`.
    Health,
    /// Medication usage / frequency `/chat`.
    Dosage,
    /// Condition, medicine and psychology chats, audio summary, accounts.
    Clinic,
}

impl ServiceKind {
    #[must_use]
    pub fn all() -> &'static [ServiceKind] {
        &[
            ServiceKind::Advisor,
            ServiceKind::Health,
            ServiceKind::Dosage,
            ServiceKind::Clinic,
        ]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Advisor => "advisor",
            ServiceKind::Health => "health",
            ServiceKind::Dosage => "dosage",
            ServiceKind::Clinic => "clinic",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            ServiceKind::Advisor => 5001,
            ServiceKind::Health => 5002,
            ServiceKind::Dosage => 5003,
            ServiceKind::Clinic => 5004,
        }
    }

    /// The clinic service answers with an apology on upstream failure; the
    /// single-route services surface the error.
    #[must_use]
    pub fn default_policy(self) -> UpstreamPolicy {
        match self {
            ServiceKind::Clinic => UpstreamPolicy::Fallback,
            _ => UpstreamPolicy::Propagate,
        }
    }

    /// Default `(temperature, max_tokens)`; `None` leaves the provider default.
    #[must_use]
    pub fn default_sampling(self) -> (Option<f64>, Option<u32>) {
        match self {
            ServiceKind::Clinic => (Some(0.7), Some(2000)),
            _ => (None, None),
        }
    }

    fn overrides(self, server: &ServerConfig) -> &ServiceOverrides {
        match self {
            ServiceKind::Advisor => &server.advisor,
            ServiceKind::Health => &server.health,
            ServiceKind::Dosage => &server.dosage,
            ServiceKind::Clinic => &server.clinic,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Family defaults merged with configuration overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub kind: ServiceKind,
    pub port: u16,
    pub policy: UpstreamPolicy,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ServiceSettings {
    /// Resolve settings for `kind` from the `[server]` section.
    #[must_use]
    pub fn resolve(kind: ServiceKind, server: &ServerConfig) -> Self {
        let o = kind.overrides(server);
        let (temperature, max_tokens) = kind.default_sampling();
        Self {
            kind,
            port: o.port.unwrap_or_else(|| kind.default_port()),
            policy: o.policy.unwrap_or_else(|| kind.default_policy()),
            temperature: o.temperature.or(temperature),
            max_tokens: o.max_tokens.or(max_tokens),
        }
    }

    /// Family defaults with no overrides.
    #[must_use]
    pub fn defaults(kind: ServiceKind) -> Self {
        Self::resolve(kind, &ServerConfig::default())
    }
}
