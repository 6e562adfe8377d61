//! End-to-end intake flow tests
//!
//! Drive `IntakeService` with a scripted classifier, the in-memory store and
//! recording notifiers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lexflow_common::classifier::{
    ClassificationRequest, Classifier, ClassifierError, RawClassification,
};
use lexflow_common::notify::{NotificationError, Notifier};
use lexflow_common::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
use lexflow_common::{
    CaseStatus, CaseType, ClientInput, Error, IntakeRecord, IntakeService, LifecycleError,
    Urgency, ValidationError,
};

const ANA_PAYLOAD: &str = r#"```json
{
  "case_type": "Personal Injury - Slip and Fall",
  "viability_score": 5,
  "urgency": "medium",
  "statute_of_limitations_flag": false,
  "key_facts": ["Slipped on wet floor", "No warning sign", "Bruised hip"],
  "recommended_specialty": "Premises liability",
  "recommended_action": "Request incident report from the store",
  "client_acknowledgment": "Hi Ana, thank you for reaching out."
}
```"#;

struct ScriptedClassifier {
    text: String,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawClassification {
            text: self.text.clone(),
            model: "scripted-model".to_string(),
        })
    }
}

struct UnreachableClassifier;

#[async_trait]
impl Classifier for UnreachableClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError> {
        Err(ClassifierError::Transport("connection refused".to_string()))
    }
}

#[derive(Default)]
struct CountingNotifier {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify_intake(&self, record: &IntakeRecord) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotificationError::Delivery {
                to: record.client_email.clone(),
                reason: "mail service down".to_string(),
            });
        }
        Ok(())
    }
}

fn ana() -> ClientInput {
    ClientInput {
        name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        phone: "555".to_string(),
        incident_date: "2025-01-01".to_string(),
        description: "slipped at store".to_string(),
        prior_attorney: false,
    }
}

#[tokio::test]
async fn test_submit_stores_new_case() {
    let store = Arc::new(MemoryRecordStore::new());
    let notifier = Arc::new(CountingNotifier::default());
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store.clone(),
        notifier.clone(),
    );

    let record = service.submit(ana()).await.unwrap();

    assert_eq!(record.case_type, CaseType::SlipAndFall);
    assert_eq!(record.viability_score, 5);
    assert_eq!(record.urgency, Urgency::Medium);
    assert_eq!(record.status, CaseStatus::New);
    assert_eq!(record.note, "");
    assert_eq!(record.model_identifier, "scripted-model");
    assert_eq!(record.client_name, "Ana");

    let stored = store.get_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(stored, record);
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_submission() {
    let store = Arc::new(MemoryRecordStore::new());
    let notifier = Arc::new(CountingNotifier {
        calls: AtomicUsize::new(0),
        fail: true,
    });
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store.clone(),
        notifier.clone(),
    );

    let record = service.submit(ana()).await.unwrap();
    assert!(store.get_by_id(&record.id).await.unwrap().is_some());
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_payload_persists_nothing() {
    let store = Arc::new(MemoryRecordStore::new());
    let notifier = Arc::new(CountingNotifier::default());
    let payload = ANA_PAYLOAD.replace("Personal Injury - Slip and Fall", "Maritime Law");
    let service = IntakeService::new(
        ScriptedClassifier::new(&payload),
        store.clone(),
        notifier.clone(),
    );

    let err = service.submit(ana()).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidCaseType(_))));
    assert!(store.is_empty().await);
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_fields_rejected_before_classifier_call() {
    let classifier = ScriptedClassifier::new(ANA_PAYLOAD);
    let store = Arc::new(MemoryRecordStore::new());
    let service = IntakeService::new(
        classifier.clone(),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    let mut input = ana();
    input.phone = "  ".to_string();
    let err = service.submit(input).await.unwrap_err();

    assert!(matches!(err, Error::Input(_)));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_classifier_failure_fails_submission() {
    let store = Arc::new(MemoryRecordStore::new());
    let service = IntakeService::new(
        Arc::new(UnreachableClassifier),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    let err = service.submit(ana()).await.unwrap_err();
    assert!(matches!(err, Error::Classifier(ClassifierError::Transport(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_store_failure_fails_submission() {
    let store = Arc::new(MemoryRecordStore::new());
    store.set_unavailable(true);
    let notifier = Arc::new(CountingNotifier::default());
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store.clone(),
        notifier.clone(),
    );

    let err = service.submit(ana()).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_from_payload_without_classifier_call() {
    let classifier = ScriptedClassifier::new("unused");
    let store = Arc::new(MemoryRecordStore::new());
    let service = IntakeService::new(
        classifier.clone(),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    let record = service
        .create_from_payload(ana(), ANA_PAYLOAD, "batch-import")
        .await
        .unwrap();
    assert_eq!(record.model_identifier, "batch-import");
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_status_change_portal_and_dashboard() {
    let store = Arc::new(SqliteRecordStore::in_memory(2).await.unwrap());
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    let first = service.submit(ana()).await.unwrap();
    let second = service.submit(ana()).await.unwrap();
    service.submit(ana()).await.unwrap();

    let status = service.transition(&first.id, "Declined", " not viable ").await.unwrap();
    assert_eq!(status, CaseStatus::Declined);
    let detail = service.case_detail(&first.id).await.unwrap();
    assert_eq!(detail.status, CaseStatus::Declined);
    assert_eq!(detail.note, "not viable");

    let view = service.portal_view(&second.access_token).await.unwrap();
    assert_eq!(view.client_name, "Ana");
    assert_eq!(view.status, CaseStatus::New);

    let summary = service.dashboard().await.unwrap();
    assert_eq!(summary.total_intakes, 3);
    assert_eq!(summary.new_unreviewed, 2);
    assert_eq!(summary.by_status["declined"], 1);
    assert_eq!(summary.avg_viability, 5.0);
    assert_eq!(summary.last_10_intakes.len(), 3);
}

#[tokio::test]
async fn test_unknown_lookups_are_errors() {
    let store = Arc::new(MemoryRecordStore::new());
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store,
        Arc::new(CountingNotifier::default()),
    );

    assert!(matches!(service.case_detail("nope").await, Err(Error::NotFound(_))));
    assert!(matches!(service.portal_view("nope").await, Err(Error::NotFound(_))));
    assert!(matches!(service.portal_view("").await, Err(Error::NotFound(_))));
    assert!(matches!(
        service.transition("nope", "active", "").await,
        Err(Error::Lifecycle(LifecycleError::CaseNotFound(_)))
    ));
    assert!(matches!(
        service.transition("nope", "archived", "").await,
        Err(Error::Lifecycle(LifecycleError::InvalidStatus { .. }))
    ));
}

#[tokio::test]
async fn test_dashboard_fails_when_a_page_fails() {
    let store = Arc::new(MemoryRecordStore::with_page_size(1).failing_at_page(1));
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store,
        Arc::new(CountingNotifier::default()),
    );
    service.submit(ana()).await.unwrap();
    service.submit(ana()).await.unwrap();

    assert!(matches!(service.dashboard().await, Err(Error::Store(_))));
}

#[tokio::test]
async fn test_dashboard_buckets_unrecognized_rows() {
    let store = Arc::new(SqliteRecordStore::in_memory(100).await.unwrap());
    let service = IntakeService::new(
        ScriptedClassifier::new(ANA_PAYLOAD),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );
    let legacy = service.submit(ana()).await.unwrap();
    service.submit(ana()).await.unwrap();

    sqlx::query(
        "UPDATE intakes SET case_type = 'Legacy Category', urgency = 'urgent', \
         status = 'archived' WHERE id = ?",
    )
    .bind(&legacy.id)
    .execute(store.pool())
    .await
    .unwrap();

    let summary = service.dashboard().await.unwrap();
    assert_eq!(summary.total_intakes, 2);
    assert_eq!(summary.by_case_type["Unknown"], 1);
    assert_eq!(summary.by_case_type["Personal Injury - Slip and Fall"], 1);
    assert_eq!(summary.by_urgency["unknown"], 1);
    assert_eq!(summary.by_urgency["medium"], 1);
    assert_eq!(summary.by_status["unknown"], 1);
    assert_eq!(summary.new_unreviewed, 1);
    assert_eq!(summary.last_10_intakes.len(), 2);

    // The row stays usable from the staff side
    let status = service.transition(&legacy.id, "active", "").await.unwrap();
    assert_eq!(status, CaseStatus::Active);
}
