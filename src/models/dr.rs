//! Disaster-recovery scenario models and ISO-8601 duration parsing.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::restore::RestoreOutcome;

/// One manual or automated step in a scenario runbook.
/// Ordered and immutable once the scenario is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrRunbookStep {
    pub name: String,
    pub description: String,
    pub automated: bool,
}

/// A registered disaster scenario with measurable recovery targets.
///
/// `rpo_target` and `rto_target` are ISO-8601 duration strings (e.g.
/// `PT4H`); they are parsed at evaluation time so a scenario can be
/// registered from untrusted configuration without failing early.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrScenario {
    pub scenario_id: String,
    pub name: String,
    pub trigger: String,
    pub strategy: String,
    pub rpo_target: String,
    pub rto_target: String,
    #[serde(default)]
    pub runbook: Vec<DrRunbookStep>,
}

/// Result of evaluating a DR drill against scenario targets.
#[derive(Debug, Clone, Serialize)]
pub struct DrillOutcome {
    pub scenario_id: String,
    pub success: bool,
    pub rpo_met: bool,
    pub rto_met: bool,
    pub involved_plans: Vec<String>,
}

/// Result of an actual failover cutover.
#[derive(Debug, Clone, Serialize)]
pub struct FailoverOutcome {
    pub scenario_id: String,
    pub target_env: String,
    pub restore: RestoreOutcome,
}

/// Parse an ISO-8601 duration of the form `PnDTnHnMnS`.
///
/// Integer components only; any designator may be omitted but at least one
/// must be present. Week and month designators are not supported, since
/// RPO/RTO targets are wall-clock bounded.
pub fn parse_iso8601_duration(input: &str) -> Result<Duration, EngineError> {
    let invalid = || EngineError::InvalidDuration(input.to_string());

    let rest = input.strip_prefix('P').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((_, t)) if t.is_empty() => return Err(invalid()),
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut total = Duration::zero();
    let mut matched = false;

    let mut consume = |part: &str, designators: &[(char, i64)]| -> Result<(), EngineError> {
        let mut digits = String::new();
        let mut allowed = designators.iter().peekable();
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            // Designators must appear in declaration order, each at most once
            let seconds_per_unit = loop {
                match allowed.next() {
                    Some((designator, secs)) if *designator == ch => break *secs,
                    Some(_) => continue,
                    None => return Err(invalid()),
                }
            };
            if digits.is_empty() {
                return Err(invalid());
            }
            let value: i64 = digits.parse().map_err(|_| invalid())?;
            digits.clear();
            // Checked arithmetic: a syntactically valid but absurdly large
            // component is rejected, not wrapped or panicked on
            let seconds = value.checked_mul(seconds_per_unit).ok_or_else(|| invalid())?;
            let component = Duration::try_seconds(seconds).ok_or_else(|| invalid())?;
            total = total.checked_add(&component).ok_or_else(|| invalid())?;
            matched = true;
        }
        if digits.is_empty() {
            Ok(())
        } else {
            // Trailing digits without a designator
            Err(invalid())
        }
    };

    consume(date_part, &[('D', 86_400)])?;
    if let Some(time) = time_part {
        consume(time, &[('H', 3_600), ('M', 60), ('S', 1)])?;
    }

    if matched {
        Ok(total)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_iso8601_duration("PT30M").unwrap(), Duration::minutes(30));
        assert_eq!(parse_iso8601_duration("PT4H").unwrap(), Duration::hours(4));
        assert_eq!(parse_iso8601_duration("P1D").unwrap(), Duration::days(1));
        assert_eq!(parse_iso8601_duration("PT90S").unwrap(), Duration::seconds(90));
        assert_eq!(
            parse_iso8601_duration("P1DT2H30M15S").unwrap(),
            Duration::days(1) + Duration::hours(2) + Duration::minutes(30) + Duration::seconds(15)
        );
    }

    #[test]
    fn parses_zero_components() {
        assert_eq!(parse_iso8601_duration("PT0S").unwrap(), Duration::zero());
        assert_eq!(parse_iso8601_duration("P0D").unwrap(), Duration::zero());
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "P", "PT", "30M", "PT30", "PTM", "P1DT", "PT1H30", "P1X", "PT-5M", "PT5M3H"] {
            assert!(
                parse_iso8601_duration(bad).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn rejects_out_of_range_components() {
        // Each of these parses digit-wise but overflows the seconds
        // representation at a different stage
        for huge in [
            "P106751991167301D",
            "PT9223372036854775807H",
            "P9999999999999999999D",
            "P106751991167300DT24H",
        ] {
            let err = parse_iso8601_duration(huge).unwrap_err();
            assert!(matches!(err, EngineError::InvalidDuration(_)), "input '{}'", huge);
        }
        // Near the representable limit still parses
        assert_eq!(
            parse_iso8601_duration("P106751991166D").unwrap(),
            Duration::days(106_751_991_166)
        );
    }

    #[test]
    fn rejects_misordered_designators() {
        // Minutes before hours in the time part
        assert!(parse_iso8601_duration("PT30M4H").is_err());
        // Day designator in the time part
        assert!(parse_iso8601_duration("PT1D").is_err());
    }
}
