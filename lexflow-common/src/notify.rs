//! Intake notifications
//!
//! Every stored intake produces two emails: a plain-text acknowledgment to the
//! client and an HTML alert to the reviewing attorney. Delivery belongs to a
//! [`Mailer`]; notification failures are reported to the caller but must never
//! fail an intake.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::classification::Urgency;
use crate::record::IntakeRecord;

const CLIENT_FOOTER: &str = "---\n\
This message was sent automatically upon receipt of your inquiry.\n\
Please do not reply to this email.\n\
If you need immediate assistance, please call our office directly.";

/// Notification delivery failures
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("delivery to {to} failed: {reason}")]
    Delivery { to: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Text(String),
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: EmailBody,
}

/// Outbound email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Mailer that records deliveries in the log instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let kind = match message.body {
            EmailBody::Text(_) => "text",
            EmailBody::Html(_) => "html",
        };
        info!(to = %message.to, subject = %message.subject, kind, "Email delivered");
        Ok(())
    }
}

/// Post-intake notification hook
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_intake(&self, record: &IntakeRecord) -> Result<(), NotificationError>;
}

/// Notifier used when notifications are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_intake(&self, record: &IntakeRecord) -> Result<(), NotificationError> {
        debug!(intake_id = %record.id, "Notifications disabled");
        Ok(())
    }
}

/// Sends the client acknowledgment and the attorney alert
pub struct EmailNotifier<M: Mailer> {
    mailer: M,
    from_email: String,
    attorney_email: String,
}

impl<M: Mailer> EmailNotifier<M> {
    pub fn new(
        mailer: M,
        from_email: impl Into<String>,
        attorney_email: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            from_email: from_email.into(),
            attorney_email: attorney_email.into(),
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    pub fn client_acknowledgment(&self, record: &IntakeRecord) -> EmailMessage {
        EmailMessage {
            to: record.client_email.clone(),
            from: self.from_email.clone(),
            subject: format!("We received your inquiry - {}", record.case_type),
            body: EmailBody::Text(format!(
                "{}\n\n{}",
                record.client_acknowledgment, CLIENT_FOOTER
            )),
        }
    }

    pub fn attorney_alert(&self, record: &IntakeRecord) -> EmailMessage {
        EmailMessage {
            to: self.attorney_email.clone(),
            from: self.from_email.clone(),
            subject: format!(
                "[{}] New intake - {} - Score {}/10",
                urgency_label(record.urgency),
                record.case_type,
                record.viability_score
            ),
            body: EmailBody::Html(render_alert(record)),
        }
    }
}

#[async_trait]
impl<M: Mailer> Notifier for EmailNotifier<M> {
    /// Attempts both emails; the first failure is returned
    async fn notify_intake(&self, record: &IntakeRecord) -> Result<(), NotificationError> {
        let ack = self.mailer.send(&self.client_acknowledgment(record)).await;
        let alert = self.mailer.send(&self.attorney_alert(record)).await;
        ack.and(alert)
    }
}

pub fn urgency_color(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "#DC2626",
        Urgency::High => "#EA580C",
        Urgency::Medium => "#D97706",
        Urgency::Low => "#16A34A",
        Urgency::Unknown => "#6B7280",
    }
}

pub fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "CRITICAL",
        Urgency::High => "HIGH",
        Urgency::Medium => "MEDIUM",
        Urgency::Low => "LOW",
        Urgency::Unknown => "UNKNOWN",
    }
}

/// Escape text for interpolation into HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_alert(record: &IntakeRecord) -> String {
    let color = urgency_color(record.urgency);
    let label = urgency_label(record.urgency);
    let case_type = escape_html(record.case_type.label());

    let facts: String = record
        .key_facts
        .iter()
        .map(|fact| format!("<li>{}</li>", escape_html(fact)))
        .collect();

    let rows = [
        ("Client Name", escape_html(&record.client_name)),
        (
            "Email",
            format!(
                "<a href=\"mailto:{0}\">{0}</a>",
                escape_html(&record.client_email)
            ),
        ),
        ("Phone", escape_html(&record.client_phone)),
        ("Incident Date", escape_html(&record.incident_date)),
        (
            "Prior Attorney",
            (if record.prior_attorney { "Yes" } else { "No" }).to_string(),
        ),
        (
            "Statute of Limitations",
            if record.statute_of_limitations_flag {
                "<strong style=\"color:#DC2626;\">FLAG - may be a concern</strong>".to_string()
            } else {
                "No immediate concern".to_string()
            },
        ),
    ];
    let table: String = rows
        .iter()
        .map(|(field, value)| format!("<tr><td>{}</td><td>{}</td></tr>", field, value))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: Arial, sans-serif; max-width: 680px; margin: 0 auto; color: #1F2937;">
<div style="background-color: {color}; color: white; padding: 16px 20px;">
<h1 style="margin:0; font-size:18px;">LexFlow - New Intake Alert</h1>
<p style="margin:4px 0 0;">Urgency: {label} | Intake ID: {id}</p>
</div>
<div style="padding: 16px 20px;">
<div style="font-size:48px; font-weight:bold; color:{color};">{score}<span style="font-size:24px;">/10</span></div>
<div>{case_type}</div>
<div>Recommended specialty: {specialty}</div>
</div>
<table style="width:100%; border-collapse:collapse;">{table}</table>
<h3>Key Facts</h3>
<ul>{facts}</ul>
<h3>Recommended Action</h3>
<p>{action}</p>
<h3>Client's Description</h3>
<p style="font-style:italic;">{description}</p>
<p style="font-size:12px; color:#9CA3AF;">LexFlow Intake | {created_at} | {model}</p>
</body>
</html>"#,
        color = color,
        label = label,
        id = escape_html(&record.id),
        score = record.viability_score,
        case_type = case_type,
        specialty = escape_html(&record.recommended_specialty),
        table = table,
        facts = facts,
        action = escape_html(&record.recommended_action),
        description = escape_html(&record.raw_description),
        created_at = record.created_at.to_rfc3339(),
        model = escape_html(&record.model_identifier),
    )
}
