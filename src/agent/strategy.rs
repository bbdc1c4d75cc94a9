//! Strategy regimes and entry sizing

use serde::{Deserialize, Serialize};

use super::config::AgentConfig;

/// Risk-policy regime the agent trades under.
///
/// Ordered so that `V1 < V2`; the agent only ever moves forward. Persisted
/// as the numbers `1.0` / `2.0`, which is how existing state files store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "f64")]
pub enum StrategyVersion {
    /// Sizes entries off whatever capital is left, uncapped
    V1,
    /// Sizes entries off a fixed slice of initial capital
    V2,
}

impl Default for StrategyVersion {
    fn default() -> Self {
        Self::V1
    }
}

impl std::fmt::Display for StrategyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "1.0"),
            Self::V2 => write!(f, "2.0"),
        }
    }
}

impl StrategyVersion {
    /// Number of lots to buy on entry.
    ///
    /// Always at least one lot, even when capital is exhausted or negative.
    pub fn lots(self, capital: f64, config: &AgentConfig) -> u32 {
        let affordable = match self {
            Self::V1 => capital / config.capital_per_lot,
            Self::V2 => config.risk_budget() / config.capital_per_lot,
        };
        whole_lots(affordable)
    }
}

fn whole_lots(raw: f64) -> u32 {
    if raw.is_nan() || raw < 1.0 {
        return 1;
    }
    raw.trunc().min(u32::MAX as f64) as u32
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Number(f64),
    Label(String),
}

impl TryFrom<VersionRepr> for StrategyVersion {
    type Error = String;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        match repr {
            VersionRepr::Number(n) if n.is_finite() => {
                Ok(if n < 2.0 { Self::V1 } else { Self::V2 })
            }
            VersionRepr::Number(n) => Err(format!("invalid strategy version {}", n)),
            VersionRepr::Label(label) => match label.trim().to_lowercase().as_str() {
                "v1" | "1" | "1.0" => Ok(Self::V1),
                "v2" | "2" | "2.0" => Ok(Self::V2),
                other => Err(format!("unknown strategy version {:?}", other)),
            },
        }
    }
}

impl From<StrategyVersion> for f64 {
    fn from(version: StrategyVersion) -> Self {
        match version {
            StrategyVersion::V1 => 1.0,
            StrategyVersion::V2 => 2.0,
        }
    }
}
