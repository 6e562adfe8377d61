//! Classifier collaborator interface
//!
//! The classifier turns a client's free-text description into a raw JSON
//! payload. Nothing it returns is trusted until it passes
//! [`crate::classification::validate`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ClientInput;

/// Default model used for classification
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Classifier transport and API failures
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier transport error: {0}")]
    Transport(String),

    #[error("classifier API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("classifier returned no text content")]
    EmptyResponse,
}

/// Fields forwarded to the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub name: String,
    pub description: String,
    pub incident_date: String,
    pub prior_attorney: bool,
}

impl From<&ClientInput> for ClassificationRequest {
    fn from(input: &ClientInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            incident_date: input.incident_date.trim().to_string(),
            prior_attorney: input.prior_attorney,
        }
    }
}

/// Unvalidated classifier answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawClassification {
    /// Response text, possibly wrapped in markdown fences
    pub text: String,
    /// Identifier of the model that produced the text
    pub model: String,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError>;
}

/// Prompt rendering
pub mod prompt {
    use super::ClassificationRequest;
    use crate::classification::{CaseType, Urgency, MAX_KEY_FACTS, MIN_KEY_FACTS, REQUIRED_KEYS};

    const PREAMBLE: &str = "Respond with a single raw JSON object. Start with { and end with }. \
Write nothing before or after it.\n\n\
You are an experienced legal intake specialist at a personal injury and civil litigation firm. \
You receive a client's name, incident date, whether they already consulted an attorney, and \
their own description of what happened. Produce a structured intake assessment.";

    const GUIDANCE: &str = "\
viability_score: integer 0-10. Use 0 only for \"Out of Scope\". \
1-3 weak, 4-6 possible but needs information, 7-9 strong with clear liability, \
10 exceptional with documented evidence and damages.
For defamation, score higher when statements were public, evidence exists and harm is measurable.
For malicious prosecution, score higher when charges were dropped or the client was acquitted \
and malice and damages are clear; score lower while charges are pending.

Choose libel for written or published statements and slander for spoken ones. \
Use the malicious prosecution types for false police reports or charges, false workplace \
accusations that led to discipline, and false sexual misconduct accusations.

statute_of_limitations_flag: true when the incident date suggests the limitation period \
may expire within about six months.

recommended_specialty: the attorney specialty best suited to the case.
recommended_action: one concrete next step for the intake team, under 25 words.
client_acknowledgment: three warm, professional sentences addressed to the client by first name, \
mentioning one specific detail from their description and promising no outcome.

If the matter is out of scope, use \"Out of Scope\" with score 0 and an acknowledgment that \
politely redirects the client. If the description is too vague, score 3-5 and include \
\"Insufficient detail for full assessment\" among the key facts.";

    /// System prompt listing the closed vocabularies
    pub fn system_prompt() -> String {
        let case_types = CaseType::ALL
            .iter()
            .map(|case_type| format!("  \"{}\"", case_type.label()))
            .collect::<Vec<_>>()
            .join("\n");
        let urgencies = Urgency::ALL
            .iter()
            .map(|urgency| format!("\"{}\"", urgency.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{preamble}\n\nRequired keys: {keys}.\n\n\
case_type must be exactly one of:\n{case_types}\n\n\
urgency must be exactly one of: {urgencies}. Use \"critical\" only when the limitation period \
may expire within 30 days, harm is ongoing, or the client faces an imminent court date.\n\n\
key_facts: an array of {min} to {max} short strings with the most legally relevant facts.\n\n\
{guidance}\n",
            preamble = PREAMBLE,
            keys = REQUIRED_KEYS.join(", "),
            case_types = case_types,
            urgencies = urgencies,
            min = MIN_KEY_FACTS,
            max = MAX_KEY_FACTS,
            guidance = GUIDANCE,
        )
    }

    /// User message for one submission
    pub fn user_message(request: &ClassificationRequest) -> String {
        format!(
            "Client Name: {}\nIncident Date: {}\nPreviously consulted an attorney: {}\nClient's description:\n{}",
            request.name,
            request.incident_date,
            if request.prior_attorney { "Yes" } else { "No" },
            request.description
        )
    }
}
