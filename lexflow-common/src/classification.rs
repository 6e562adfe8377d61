//! Classification result validation
//!
//! The external classifier returns free text that is *supposed* to be a JSON
//! object matching the intake schema. Nothing past this module ever sees that
//! raw text: [`validate`] either produces a [`ValidatedResult`] or rejects the
//! whole payload with a [`ValidationError`] naming the first violated rule.
//!
//! Checks run in a fixed order:
//! 1. payload is a JSON object
//! 2. all eight required keys are present
//! 3. `case_type` is one of the twelve known labels
//! 4. `urgency` is one of low/medium/high/critical
//! 5. `viability_score` is an integer in 0..=10 (no clamping)
//! 6. `statute_of_limitations_flag` is a boolean
//! 7. `key_facts` is an array of 3 to 5 non-empty strings
//! 8. the three free-text fields are non-empty after trimming

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys every classifier payload must carry, in reporting order
pub const REQUIRED_KEYS: [&str; 8] = [
    "case_type",
    "viability_score",
    "urgency",
    "statute_of_limitations_flag",
    "key_facts",
    "recommended_specialty",
    "recommended_action",
    "client_acknowledgment",
];

/// Inclusive bounds for `viability_score`
pub const MIN_VIABILITY: i64 = 0;
pub const MAX_VIABILITY: i64 = 10;

/// Inclusive bounds for the number of `key_facts`
pub const MIN_KEY_FACTS: usize = 3;
pub const MAX_KEY_FACTS: usize = 5;

/// Closed set of case categories the classifier may assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseType {
    #[serde(rename = "Personal Injury - Vehicle Accident")]
    VehicleAccident,
    #[serde(rename = "Personal Injury - Slip and Fall")]
    SlipAndFall,
    #[serde(rename = "Personal Injury - Medical Malpractice")]
    MedicalMalpractice,
    #[serde(rename = "Personal Injury - Workplace Injury")]
    WorkplaceInjury,
    #[serde(rename = "Defamation - Libel (Written)")]
    Libel,
    #[serde(rename = "Defamation - Slander (Spoken)")]
    Slander,
    #[serde(rename = "Malicious Prosecution - False Criminal Accusation")]
    FalseCriminalAccusation,
    #[serde(rename = "Malicious Prosecution - Workplace False Accusation")]
    WorkplaceFalseAccusation,
    #[serde(rename = "Malicious Prosecution - False Sexual Misconduct Accusation")]
    FalseSexualMisconductAccusation,
    #[serde(rename = "Family Law")]
    FamilyLaw,
    #[serde(rename = "Employment Law")]
    EmploymentLaw,
    #[serde(rename = "Out of Scope")]
    OutOfScope,
    /// Stored label outside the closed set; only produced when reading rows
    #[serde(rename = "Unknown", skip_deserializing)]
    Unknown,
}

impl CaseType {
    /// Every case type, grouped the way the classifier prompt lists them
    pub const ALL: [CaseType; 12] = [
        CaseType::VehicleAccident,
        CaseType::SlipAndFall,
        CaseType::MedicalMalpractice,
        CaseType::WorkplaceInjury,
        CaseType::Libel,
        CaseType::Slander,
        CaseType::FalseCriminalAccusation,
        CaseType::WorkplaceFalseAccusation,
        CaseType::FalseSexualMisconductAccusation,
        CaseType::FamilyLaw,
        CaseType::EmploymentLaw,
        CaseType::OutOfScope,
    ];

    /// Exact label used on the wire and in storage
    pub fn label(&self) -> &'static str {
        match self {
            CaseType::VehicleAccident => "Personal Injury - Vehicle Accident",
            CaseType::SlipAndFall => "Personal Injury - Slip and Fall",
            CaseType::MedicalMalpractice => "Personal Injury - Medical Malpractice",
            CaseType::WorkplaceInjury => "Personal Injury - Workplace Injury",
            CaseType::Libel => "Defamation - Libel (Written)",
            CaseType::Slander => "Defamation - Slander (Spoken)",
            CaseType::FalseCriminalAccusation => {
                "Malicious Prosecution - False Criminal Accusation"
            }
            CaseType::WorkplaceFalseAccusation => {
                "Malicious Prosecution - Workplace False Accusation"
            }
            CaseType::FalseSexualMisconductAccusation => {
                "Malicious Prosecution - False Sexual Misconduct Accusation"
            }
            CaseType::FamilyLaw => "Family Law",
            CaseType::EmploymentLaw => "Employment Law",
            CaseType::OutOfScope => "Out of Scope",
            CaseType::Unknown => "Unknown",
        }
    }

    /// The designated category for submissions the firm does not handle
    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, CaseType::OutOfScope)
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CaseType {
    type Err = ValidationError;

    /// Exact, case-sensitive match against [`CaseType::ALL`]. Near misses are
    /// rejected, never coerced, and `Unknown` is never produced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseType::ALL
            .iter()
            .copied()
            .find(|case_type| case_type.label() == s)
            .ok_or_else(|| ValidationError::InvalidCaseType(s.to_string()))
    }
}

/// How quickly staff should act on an intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
    /// Stored value outside the closed set; only produced when reading rows
    #[serde(skip_deserializing)]
    Unknown,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
            Urgency::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urgency::ALL
            .iter()
            .copied()
            .find(|urgency| urgency.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidUrgency(s.to_string()))
    }
}

/// Classifier output that passed every schema check
///
/// Serializes back to the same JSON shape the classifier produces, so a
/// validated result can be re-validated from its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedResult {
    pub case_type: CaseType,
    pub viability_score: u8,
    pub urgency: Urgency,
    pub statute_of_limitations_flag: bool,
    pub key_facts: Vec<String>,
    pub recommended_specialty: String,
    pub recommended_action: String,
    pub client_acknowledgment: String,
}

/// Reason a classifier payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON object: {0}")]
    MalformedPayload(String),

    #[error("missing required keys: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid case_type: '{0}'")]
    InvalidCaseType(String),

    #[error("invalid urgency: '{0}'")]
    InvalidUrgency(String),

    #[error("viability_score out of range: {0}")]
    ScoreOutOfRange(String),

    #[error("'{field}' must be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("key_facts invalid: {0}")]
    KeyFactsInvalid(String),
}

impl ValidationError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            ValidationError::MissingFields(_) => "MISSING_FIELDS",
            ValidationError::InvalidCaseType(_) => "INVALID_CASE_TYPE",
            ValidationError::InvalidUrgency(_) => "INVALID_URGENCY",
            ValidationError::ScoreOutOfRange(_) => "SCORE_OUT_OF_RANGE",
            ValidationError::TypeMismatch { .. } => "TYPE_MISMATCH",
            ValidationError::KeyFactsInvalid(_) => "KEY_FACTS_INVALID",
        }
    }
}

/// Remove a markdown code fence the model sometimes wraps its answer in
///
/// Accepts a leading fence optionally followed by a language tag
/// (```` ```json ````, ```` ``` ````). Text without a leading fence is
/// returned trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(after_fence) = text.strip_prefix("```") else {
        return text;
    };

    let tag_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'))
        .unwrap_or(after_fence.len());
    let body = &after_fence[tag_len..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Validate raw classifier text into a typed result
pub fn validate(raw: &str) -> Result<ValidatedResult, ValidationError> {
    let cleaned = strip_fences(raw);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
    validate_value(&value)
}

/// Validate an already-parsed JSON value
pub fn validate_value(value: &Value) -> Result<ValidatedResult, ValidationError> {
    let object = value.as_object().ok_or_else(|| {
        ValidationError::MalformedPayload(format!("expected an object, got {}", json_type(value)))
    })?;

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let case_type = match &object["case_type"] {
        Value::String(label) => label.parse::<CaseType>()?,
        other => return Err(ValidationError::InvalidCaseType(other.to_string())),
    };

    let urgency = match &object["urgency"] {
        Value::String(label) => label.parse::<Urgency>()?,
        other => return Err(ValidationError::InvalidUrgency(other.to_string())),
    };

    let viability_score = check_score(&object["viability_score"])?;

    let statute_of_limitations_flag = object["statute_of_limitations_flag"].as_bool().ok_or(
        ValidationError::TypeMismatch {
            field: "statute_of_limitations_flag",
            expected: "a boolean",
        },
    )?;

    let key_facts = check_key_facts(&object["key_facts"])?;

    Ok(ValidatedResult {
        case_type,
        viability_score,
        urgency,
        statute_of_limitations_flag,
        key_facts,
        recommended_specialty: required_text(object, "recommended_specialty")?,
        recommended_action: required_text(object, "recommended_action")?,
        client_acknowledgment: required_text(object, "client_acknowledgment")?,
    })
}

fn check_score(value: &Value) -> Result<u8, ValidationError> {
    // as_i64 is None for floats such as 5.0 and 7.5, so those are rejected too
    match value.as_i64() {
        Some(score) if (MIN_VIABILITY..=MAX_VIABILITY).contains(&score) => Ok(score as u8),
        _ => Err(ValidationError::ScoreOutOfRange(value.to_string())),
    }
}

fn check_key_facts(value: &Value) -> Result<Vec<String>, ValidationError> {
    let facts = value.as_array().ok_or_else(|| {
        ValidationError::KeyFactsInvalid(format!(
            "expected an array of {}-{} strings, got {}",
            MIN_KEY_FACTS,
            MAX_KEY_FACTS,
            json_type(value)
        ))
    })?;

    if !(MIN_KEY_FACTS..=MAX_KEY_FACTS).contains(&facts.len()) {
        return Err(ValidationError::KeyFactsInvalid(format!(
            "expected {}-{} entries, got {}",
            MIN_KEY_FACTS,
            MAX_KEY_FACTS,
            facts.len()
        )));
    }

    facts
        .iter()
        .enumerate()
        .map(|(i, fact)| match fact {
            Value::String(text) if !text.trim().is_empty() => Ok(text.clone()),
            Value::String(_) => Err(ValidationError::KeyFactsInvalid(format!(
                "key_facts[{}] is empty",
                i
            ))),
            other => Err(ValidationError::KeyFactsInvalid(format!(
                "key_facts[{}] is {}, not a string",
                i,
                json_type(other)
            ))),
        })
        .collect()
}

fn required_text(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match object.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(ValidationError::TypeMismatch {
            field,
            expected: "a non-empty string",
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "case_type": "Personal Injury - Slip and Fall",
            "viability_score": 5,
            "urgency": "medium",
            "statute_of_limitations_flag": false,
            "key_facts": ["fell on wet floor", "no warning sign", "minor injury"],
            "recommended_specialty": "PI attorney",
            "recommended_action": "schedule consult",
            "client_acknowledgment": "Hi Ana, ..."
        })
    }

    fn with(key: &str, value: Value) -> String {
        let mut payload = valid_payload();
        payload[key] = value;
        payload.to_string()
    }

    #[test]
    fn test_valid_payload_accepted_verbatim() {
        let result = validate(&valid_payload().to_string()).unwrap();
        assert_eq!(result.case_type, CaseType::SlipAndFall);
        assert_eq!(result.viability_score, 5);
        assert_eq!(result.urgency, Urgency::Medium);
        assert!(!result.statute_of_limitations_flag);
        assert_eq!(
            result.key_facts,
            vec!["fell on wet floor", "no warning sign", "minor injury"]
        );
        assert_eq!(result.recommended_specialty, "PI attorney");
        assert_eq!(result.recommended_action, "schedule consult");
        assert_eq!(result.client_acknowledgment, "Hi Ana, ...");
    }

    #[test]
    fn test_strip_fences_with_language_tag() {
        let raw = format!("```json\n{}\n```", valid_payload());
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let raw = format!("```\n{}\n```", valid_payload());
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_strip_fences_unterminated_and_unfenced() {
        assert_eq!(strip_fences("```json{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = validate("I think this is a slip and fall case.").unwrap_err();
        assert_eq!(err.reason(), "MALFORMED_PAYLOAD");
    }

    #[test]
    fn test_json_array_is_malformed() {
        let err = validate("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_keys_listed_in_order() {
        let mut payload = valid_payload();
        let object = payload.as_object_mut().unwrap();
        object.remove("urgency");
        object.remove("key_facts");

        let err = validate(&payload.to_string()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["urgency".to_string(), "key_facts".to_string()])
        );
    }

    #[test]
    fn test_every_single_missing_key_detected() {
        for key in REQUIRED_KEYS {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(key);
            let err = validate(&payload.to_string()).unwrap_err();
            assert_eq!(err, ValidationError::MissingFields(vec![key.to_string()]));
        }
    }

    #[test]
    fn test_unknown_case_type_rejected() {
        let err = validate(&with("case_type", json!("Dog Bite"))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidCaseType("Dog Bite".to_string()));
    }

    #[test]
    fn test_case_type_not_coerced() {
        let err = validate(&with("case_type", json!("family law"))).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCaseType(_)));
    }

    #[test]
    fn test_all_case_types_round_trip_labels() {
        for case_type in CaseType::ALL {
            let parsed: CaseType = case_type.label().parse().unwrap();
            assert_eq!(parsed, case_type);
        }
    }

    #[test]
    fn test_read_side_fallbacks_never_validate() {
        let err = validate(&with("case_type", json!("Unknown"))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidCaseType("Unknown".to_string()));
        let err = validate(&with("urgency", json!("unknown"))).unwrap_err();
        assert_eq!(err.reason(), "INVALID_URGENCY");

        assert!(!CaseType::ALL.contains(&CaseType::Unknown));
        assert!(serde_json::from_value::<CaseType>(json!("Unknown")).is_err());
        assert_eq!(serde_json::to_value(CaseType::Unknown).unwrap(), json!("Unknown"));
        assert_eq!(serde_json::to_value(Urgency::Unknown).unwrap(), json!("unknown"));
    }

    #[test]
    fn test_invalid_urgency_rejected() {
        let err = validate(&with("urgency", json!("urgent"))).unwrap_err();
        assert_eq!(err, ValidationError::InvalidUrgency("urgent".to_string()));
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(validate(&with("viability_score", json!(0))).unwrap().viability_score, 0);
        assert_eq!(validate(&with("viability_score", json!(10))).unwrap().viability_score, 10);
        for bad in [json!(11), json!(-1), json!(7.5), json!(5.0), json!("5"), json!(null)] {
            let err = validate(&with("viability_score", bad)).unwrap_err();
            assert_eq!(err.reason(), "SCORE_OUT_OF_RANGE");
        }
    }

    #[test]
    fn test_statute_flag_must_be_boolean() {
        let err = validate(&with("statute_of_limitations_flag", json!("true"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "statute_of_limitations_flag",
                expected: "a boolean",
            }
        );
    }

    #[test]
    fn test_key_facts_count_reported() {
        let err = validate(&with("key_facts", json!(["a", "b"]))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::KeyFactsInvalid("expected 3-5 entries, got 2".to_string())
        );

        let err = validate(&with("key_facts", json!(["a", "b", "c", "d", "e", "f"]))).unwrap_err();
        assert!(err.to_string().contains("got 6"));
    }

    #[test]
    fn test_key_facts_type_reported() {
        let err = validate(&with("key_facts", json!("a, b, c"))).unwrap_err();
        assert!(err.to_string().contains("got string"));

        let err = validate(&with("key_facts", json!(["a", 2, "c"]))).unwrap_err();
        assert!(err.to_string().contains("key_facts[1] is number"));

        let err = validate(&with("key_facts", json!(["a", "   ", "c"]))).unwrap_err();
        assert!(err.to_string().contains("key_facts[1] is empty"));
    }

    #[test]
    fn test_blank_text_fields_rejected() {
        for field in ["recommended_specialty", "recommended_action", "client_acknowledgment"] {
            let err = validate(&with(field, json!("   "))).unwrap_err();
            assert!(matches!(err, ValidationError::TypeMismatch { field: f, .. } if f == field));

            let err = validate(&with(field, json!(42))).unwrap_err();
            assert_eq!(err.reason(), "TYPE_MISMATCH");
        }
    }

    #[test]
    fn test_checks_run_in_order() {
        // Both case_type and urgency are wrong; case_type is reported first
        let mut payload = valid_payload();
        payload["case_type"] = json!("Tax Law");
        payload["urgency"] = json!("asap");
        let err = validate(&payload.to_string()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCaseType(_)));
    }

    #[test]
    fn test_revalidating_serialized_result_is_idempotent() {
        let first = validate(&valid_payload().to_string()).unwrap();
        let serialized = serde_json::to_string(&first).unwrap();
        let second = validate(&serialized).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extra_keys_ignored() {
        let raw = with("confidence", json!(0.9));
        assert!(validate(&raw).is_ok());
    }
}
