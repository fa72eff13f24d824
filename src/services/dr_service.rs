//! DR scenario catalog.
//!
//! Holds registered disaster-recovery scenarios and evaluates drill and
//! failover outcomes against their RPO/RTO targets.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::EngineError;
use crate::models::dr::{parse_iso8601_duration, DrScenario};

/// Per-axis result of evaluating achieved recovery values against a
/// scenario's targets. Overall success requires both axes.
#[derive(Debug, Clone, Copy)]
pub struct DrillEvaluation {
    pub rpo_met: bool,
    pub rto_met: bool,
}

impl DrillEvaluation {
    pub fn passed(&self) -> bool {
        self.rpo_met && self.rto_met
    }
}

/// Registered disaster scenarios, keyed by scenario id.
#[derive(Default)]
pub struct DrScenarioCatalog {
    scenarios: RwLock<HashMap<String, DrScenario>>,
}

impl DrScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scenario, overwriting a prior registration of the same id.
    pub fn register(&self, scenario: DrScenario) {
        self.scenarios
            .write()
            .expect("scenario lock poisoned")
            .insert(scenario.scenario_id.clone(), scenario);
    }

    pub fn get(&self, scenario_id: &str) -> Option<DrScenario> {
        self.scenarios
            .read()
            .expect("scenario lock poisoned")
            .get(scenario_id)
            .cloned()
    }

    /// Evaluate achieved RPO/RTO against the scenario's targets.
    ///
    /// Both achieved values and targets are ISO-8601 durations; the drill
    /// passes iff achieved RPO and RTO are each within target.
    pub fn evaluate_drill(
        &self,
        scenario_id: &str,
        achieved_rpo: &str,
        achieved_rto: &str,
    ) -> Result<DrillEvaluation, EngineError> {
        let scenario = self
            .get(scenario_id)
            .ok_or_else(|| EngineError::UnknownScenario(scenario_id.to_string()))?;

        let rpo_target = parse_iso8601_duration(&scenario.rpo_target)?;
        let rto_target = parse_iso8601_duration(&scenario.rto_target)?;
        let rpo = parse_iso8601_duration(achieved_rpo)?;
        let rto = parse_iso8601_duration(achieved_rto)?;

        Ok(DrillEvaluation {
            rpo_met: rpo <= rpo_target,
            rto_met: rto <= rto_target,
        })
    }
}
