//! Rule-based choice of which workers engage on a task.

use crate::task::domain::{AgentType, Task};
use std::collections::BTreeSet;

/// Row count above which the fast operator is always engaged.
pub const LARGE_TABLE_ROWS: f64 = 1_000_000.0;

/// Workers chosen for a task and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Distinct roles in canonical order.
    pub agents: Vec<AgentType>,
    /// Matched rules, joined with `; `.
    pub rationale: String,
}

/// Chooses workers from task content and metadata.
///
/// Rules, all of which may apply:
///
/// - `priority = "high"` engages every role.
/// - A query containing a join engages the planner and the operator.
/// - A `table_rows` (or `table_size_rows`) estimate above one million
///   engages the operator.
///
/// When nothing matches, only the operator is engaged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentSelector;

impl AgentSelector {
    /// Creates a selector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Selects the workers for `task`.
    #[must_use]
    pub fn select(&self, task: &Task) -> Selection {
        let mut chosen = BTreeSet::new();
        let mut reasons = Vec::new();

        if is_high_priority(task) {
            chosen.extend(AgentType::CANONICAL);
            reasons.push("high priority: all roles");
        }
        if has_join(task.target_query()) {
            chosen.insert(AgentType::Operativo);
            chosen.insert(AgentType::Cerebro);
            reasons.push("join detected: operativo and cerebro");
        }
        if row_estimate(task).is_some_and(|rows| rows > LARGE_TABLE_ROWS) {
            chosen.insert(AgentType::Operativo);
            reasons.push("more than 1M rows: operativo");
        }
        if chosen.is_empty() {
            chosen.insert(AgentType::Operativo);
            reasons.push("default: operativo");
        }

        Selection {
            agents: chosen.into_iter().collect(),
            rationale: reasons.join("; "),
        }
    }
}

fn is_high_priority(task: &Task) -> bool {
    task.metadata()
        .get("priority")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|priority| priority.trim().eq_ignore_ascii_case("high"))
}

fn has_join(query: &str) -> bool {
    let lowered = query.to_lowercase();
    lowered.contains(" join ") || lowered.contains(" join\n")
}

fn row_estimate(task: &Task) -> Option<f64> {
    let read = |key: &str| {
        task.metadata()
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .filter(|rows| rows.is_normal())
    };
    read("table_rows").or_else(|| read("table_size_rows"))
}
