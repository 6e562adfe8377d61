//! Dashboard aggregation over the full record set

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classification::{CaseType, Urgency};
use crate::record::{CaseStatus, IntakeRecord};

/// Number of most recent intakes listed on the dashboard
pub const RECENT_LIMIT: usize = 10;

/// Dashboard summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_intakes: usize,
    /// Mean score over records scoring above zero, one decimal place
    pub avg_viability: f64,
    pub new_unreviewed: usize,
    pub critical_urgency: usize,
    pub by_case_type: BTreeMap<String, usize>,
    pub by_urgency: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub last_10_intakes: Vec<RecentIntake>,
}

/// Dashboard row for a recent intake
///
/// Deliberately excludes the client's description, staff notes, contact
/// details, model identifier and access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentIntake {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub client_name: String,
    pub case_type: CaseType,
    pub viability_score: u8,
    pub urgency: Urgency,
    pub status: CaseStatus,
    pub statute_of_limitations_flag: bool,
}

impl From<&IntakeRecord> for RecentIntake {
    fn from(record: &IntakeRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at,
            client_name: record.client_name.clone(),
            case_type: record.case_type,
            viability_score: record.viability_score,
            urgency: record.urgency,
            status: record.status,
            statute_of_limitations_flag: record.statute_of_limitations_flag,
        }
    }
}

/// Summarize a complete record set
///
/// Deterministic for a given set: recent intakes are ordered by `created_at`
/// descending with ties broken by `id` ascending.
pub fn aggregate(records: &[IntakeRecord]) -> Summary {
    let mut by_case_type = BTreeMap::new();
    let mut by_urgency = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    let mut score_sum = 0u64;
    let mut scored = 0u64;

    for record in records {
        *by_case_type.entry(record.case_type.label().to_string()).or_insert(0) += 1;
        *by_urgency.entry(record.urgency.as_str().to_string()).or_insert(0) += 1;
        *by_status.entry(record.status.as_str().to_string()).or_insert(0) += 1;

        // Score 0 means out of scope, not a weak case; keep it out of the mean
        if record.viability_score > 0 {
            score_sum += u64::from(record.viability_score);
            scored += 1;
        }
    }

    let avg_viability = if scored == 0 {
        0.0
    } else {
        round_one_decimal(score_sum as f64 / scored as f64)
    };

    let new_unreviewed = by_status.get(CaseStatus::New.as_str()).copied().unwrap_or(0);
    let critical_urgency = by_urgency
        .get(Urgency::Critical.as_str())
        .copied()
        .unwrap_or(0);

    let mut newest: Vec<&IntakeRecord> = records.iter().collect();
    newest.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    let last_10_intakes = newest
        .into_iter()
        .take(RECENT_LIMIT)
        .map(RecentIntake::from)
        .collect();

    info!(
        total = records.len(),
        avg_viability,
        critical = critical_urgency,
        "Dashboard aggregation complete"
    );

    Summary {
        total_intakes: records.len(),
        avg_viability,
        new_unreviewed,
        critical_urgency,
        by_case_type,
        by_urgency,
        by_status,
        last_10_intakes,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
