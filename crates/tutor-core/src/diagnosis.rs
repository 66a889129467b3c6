//! Pure classification over `diagnose_error` tool output and the resulting
//! intervention-level ladder. No I/O, no clock reads, no logging — same
//! purity constraint as `psm`.

use serde_json::Value;

/// Default threshold for the `error_identified ∧ confidence ≥ threshold`
/// rule (spec §4.5 / §9 open question b). Callers that load a
/// `SessionCoreConfig` should prefer its `diagnosis_known_threshold` field;
/// this constant is the fallback when no config is available (e.g. in unit
/// tests exercising the pure function directly).
pub const DEFAULT_KNOWN_THRESHOLD: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnosis {
    Known {
        category: String,
        confidence: f64,
        remediation_hint: String,
    },
    Unknown {
        confidence: f64,
    },
}

impl Diagnosis {
    pub fn confidence(&self) -> f64 {
        match self {
            Diagnosis::Known { confidence, .. } => *confidence,
            Diagnosis::Unknown { confidence } => *confidence,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InterventionLevel {
    Subtle,
    Moderate,
    Explicit,
    WorkedExample,
}

/// Extracts a confidence value from a `diagnose_error` payload. Accepts
/// numeric and numeric-string forms, clamps to `[0, 1]`, and defaults to 0.5
/// when the field is missing or unparseable (spec §8 invariant 11).
fn parse_confidence(payload: &Value) -> f64 {
    let raw = match payload.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.unwrap_or(0.5).clamp(0.0, 1.0)
}

fn error_identified(payload: &Value) -> bool {
    matches!(payload.get("error_identified"), Some(Value::Bool(true)))
}

/// Classifies a raw `diagnose_error` tool payload using the default
/// threshold. See `classify_diagnosis_with_threshold` to use a configured one.
pub fn classify_diagnosis(payload: &Value) -> Diagnosis {
    classify_diagnosis_with_threshold(payload, DEFAULT_KNOWN_THRESHOLD)
}

pub fn classify_diagnosis_with_threshold(payload: &Value, threshold: f64) -> Diagnosis {
    let confidence = parse_confidence(payload);
    if error_identified(payload) && confidence >= threshold {
        let category = payload
            .get("error_category")
            .and_then(Value::as_str)
            .unwrap_or("unspecified")
            .to_string();
        let remediation_hint = payload
            .get("suggested_approach")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Diagnosis::Known {
            category,
            confidence,
            remediation_hint,
        }
    } else {
        Diagnosis::Unknown { confidence }
    }
}

/// Maps `(attempt_count, confidence)` to how direct the next remediation
/// should be. Total and monotone non-decreasing in `attempt_count`.
pub fn intervention_level(attempt_count: u32, confidence: f64) -> InterventionLevel {
    match attempt_count {
        0 | 1 => InterventionLevel::Subtle,
        2 => {
            if confidence > 0.7 {
                InterventionLevel::Moderate
            } else {
                InterventionLevel::Subtle
            }
        }
        3 => InterventionLevel::Moderate,
        4 => InterventionLevel::Explicit,
        _ => InterventionLevel::WorkedExample,
    }
}

pub fn next_intervention_level(level: InterventionLevel) -> Option<InterventionLevel> {
    match level {
        InterventionLevel::Subtle => Some(InterventionLevel::Moderate),
        InterventionLevel::Moderate => Some(InterventionLevel::Explicit),
        InterventionLevel::Explicit => Some(InterventionLevel::WorkedExample),
        InterventionLevel::WorkedExample => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_confidence_defaults_to_half_and_classifies_by_error_identified() {
        let payload = json!({ "error_identified": true });
        match classify_diagnosis(&payload) {
            Diagnosis::Known { confidence, .. } => assert_eq!(confidence, 0.5),
            other => panic!("expected Known, got {:?}", other),
        }

        let payload = json!({ "error_identified": false });
        match classify_diagnosis(&payload) {
            Diagnosis::Unknown { confidence } => assert_eq!(confidence, 0.5),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn numeric_string_confidence_is_parsed() {
        let payload = json!({ "error_identified": true, "confidence": "0.85" });
        match classify_diagnosis(&payload) {
            Diagnosis::Known { confidence, .. } => assert!((confidence - 0.85).abs() < 1e-9),
            other => panic!("expected Known, got {:?}", other),
        }
    }

    #[test]
    fn confidence_is_clamped() {
        let payload = json!({ "error_identified": true, "confidence": 5.0 });
        assert_eq!(classify_diagnosis(&payload).confidence(), 1.0);

        let payload = json!({ "error_identified": true, "confidence": -2.0 });
        assert_eq!(classify_diagnosis(&payload).confidence(), 0.0);
    }

    #[test]
    fn below_threshold_confidence_is_unknown_even_if_identified() {
        let payload = json!({ "error_identified": true, "confidence": 0.2 });
        assert!(matches!(classify_diagnosis(&payload), Diagnosis::Unknown { .. }));
    }

    #[test]
    fn threshold_is_configurable() {
        let payload = json!({ "error_identified": true, "confidence": 0.6 });
        assert!(matches!(
            classify_diagnosis_with_threshold(&payload, 0.5),
            Diagnosis::Known { .. }
        ));
        assert!(matches!(
            classify_diagnosis_with_threshold(&payload, 0.9),
            Diagnosis::Unknown { .. }
        ));
    }

    #[test]
    fn intervention_level_is_monotone_in_attempt_count() {
        let confidence = 0.3;
        let levels: Vec<InterventionLevel> = (0..=6)
            .map(|n| intervention_level(n, confidence))
            .collect();
        for pair in levels.windows(2) {
            assert!(pair[0] <= pair[1], "{:?} should be <= {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn intervention_level_exact_ladder() {
        assert_eq!(intervention_level(1, 0.9), InterventionLevel::Subtle);
        assert_eq!(intervention_level(2, 0.8), InterventionLevel::Moderate);
        assert_eq!(intervention_level(2, 0.5), InterventionLevel::Subtle);
        assert_eq!(intervention_level(3, 0.1), InterventionLevel::Moderate);
        assert_eq!(intervention_level(4, 0.1), InterventionLevel::Explicit);
        assert_eq!(intervention_level(5, 0.1), InterventionLevel::WorkedExample);
        assert_eq!(intervention_level(99, 0.1), InterventionLevel::WorkedExample);
    }

    #[test]
    fn next_intervention_level_is_monotone_chain() {
        assert_eq!(next_intervention_level(InterventionLevel::Subtle), Some(InterventionLevel::Moderate));
        assert_eq!(next_intervention_level(InterventionLevel::Moderate), Some(InterventionLevel::Explicit));
        assert_eq!(next_intervention_level(InterventionLevel::Explicit), Some(InterventionLevel::WorkedExample));
        assert_eq!(next_intervention_level(InterventionLevel::WorkedExample), None);
    }
}
