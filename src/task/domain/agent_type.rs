//! Worker roles that can be engaged on a task.

use super::ParseAgentTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an optimisation worker.
///
/// Variant order is the canonical dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Deep planner: slow, thorough analysis and QA.
    Cerebro,
    /// Fast operator: SQL generation, benchmarking and transforms.
    Operativo,
    /// Low-cost bulk worker: boilerplate and refactors.
    Bulk,
}

impl AgentType {
    /// All roles in canonical dispatch order.
    pub const CANONICAL: [Self; 3] = [Self::Cerebro, Self::Operativo, Self::Bulk];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cerebro => "cerebro",
            Self::Operativo => "operativo",
            Self::Bulk => "bulk",
        }
    }

    /// Returns the role's area of expertise.
    #[must_use]
    pub const fn specialization(self) -> &'static str {
        match self {
            Self::Cerebro => "Planning/QA",
            Self::Operativo => "SQL/Bench/Transforms",
            Self::Bulk => "Boilerplate/Refactors",
        }
    }

    /// Maps a role name or model alias to a role.
    ///
    /// Unrecognised aliases resolve to [`AgentType::Operativo`].
    #[must_use]
    pub fn from_alias(alias: &str) -> Self {
        match alias.trim().to_ascii_lowercase().as_str() {
            "cerebro" | "gemini-2.5-pro" | "gemini25pro" => Self::Cerebro,
            "bulk" | "gemini-2.0-flash" | "gemini20flash" => Self::Bulk,
            _ => Self::Operativo,
        }
    }

    /// Fallback role for a proposal identified only by its position in a
    /// result list.
    #[must_use]
    pub const fn for_position(position: usize) -> Self {
        match position {
            0 => Self::Cerebro,
            2 => Self::Bulk,
            _ => Self::Operativo,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentType {
    type Error = ParseAgentTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cerebro" => Ok(Self::Cerebro),
            "operativo" => Ok(Self::Operativo),
            "bulk" => Ok(Self::Bulk),
            _ => Err(ParseAgentTypeError(value.to_owned())),
        }
    }
}
