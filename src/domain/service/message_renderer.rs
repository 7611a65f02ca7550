use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::domain::entity::notification_request::NotificationKind;
use crate::domain::entity::recipient::Recipient;

const ATTENDANCE_TEMPLATE: &str = "{{title}}\n\
Dear {{recipient_name}}, your attendance for {{subject}} on {{date}} was marked {{status}}.";

const FEE_PAYMENT_TEMPLATE: &str = "{{title}}\n\
Dear {{recipient_name}}, we have received your fee payment of {{amount}} via {{payment_method}}.\n\
Receipt number: {{receipt_number}}";

const MARKS_TEMPLATE: &str = "{{title}}\n\
Dear {{recipient_name}}, your {{exam_type}} result for {{subject}}: {{marks}}/{{max_marks}} \
({{percentage}}%, grade {{grade}}).";

const EMERGENCY_TEMPLATE: &str = "EMERGENCY: {{title}}\n{{message}}";

const GENERAL_TEMPLATE: &str = "{{title}}\n{{message}}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("missing required field '{field}' for {kind} notification")]
    MissingField {
        kind: NotificationKind,
        field: &'static str,
    },

    #[error("invalid field '{field}' for {kind} notification: {reason}")]
    InvalidField {
        kind: NotificationKind,
        field: &'static str,
        reason: String,
    },

    #[error("template error: {0}")]
    Template(String),
}

/// MessageRenderer turns a notification payload into the plain-text message
/// for one recipient. Output depends only on (kind, recipient, payload).
pub struct MessageRenderer {
    registry: Handlebars<'static>,
}

impl MessageRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        for kind in [
            NotificationKind::Attendance,
            NotificationKind::FeePayment,
            NotificationKind::Marks,
            NotificationKind::Emergency,
            NotificationKind::General,
        ] {
            registry
                .register_template_string(kind.as_str(), Self::template_for(kind))
                .map_err(|e| RenderError::Template(e.to_string()))?;
        }
        Ok(Self { registry })
    }

    fn template_for(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Attendance => ATTENDANCE_TEMPLATE,
            NotificationKind::FeePayment => FEE_PAYMENT_TEMPLATE,
            NotificationKind::Marks => MARKS_TEMPLATE,
            NotificationKind::Emergency => EMERGENCY_TEMPLATE,
            NotificationKind::General => GENERAL_TEMPLATE,
        }
    }

    pub fn render(
        &self,
        kind: NotificationKind,
        title: &str,
        recipient: &Recipient,
        payload: &Map<String, Value>,
    ) -> Result<String, RenderError> {
        let mut data = template_data(kind, payload)?;
        data.insert("title".to_string(), Value::String(title.to_string()));
        data.insert(
            "recipient_name".to_string(),
            Value::String(recipient.display_name.clone()),
        );
        self.registry
            .render(kind.as_str(), &Value::Object(data))
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

/// Letter grade for a percentage score.
pub fn letter_grade(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A+"
    } else if percentage >= 80.0 {
        "A"
    } else if percentage >= 70.0 {
        "B+"
    } else if percentage >= 60.0 {
        "B"
    } else if percentage >= 50.0 {
        "C"
    } else {
        "F"
    }
}

fn template_data(
    kind: NotificationKind,
    payload: &Map<String, Value>,
) -> Result<Map<String, Value>, RenderError> {
    let mut data = Map::new();
    match kind {
        NotificationKind::Attendance => {
            put_text(&mut data, "subject", require_text(kind, payload, "subject")?);
            put_text(&mut data, "date", require_text(kind, payload, "date")?);
            let present = require_bool(kind, payload, "is_present")?;
            put_text(
                &mut data,
                "status",
                if present { "Present" } else { "Absent" }.to_string(),
            );
        }
        NotificationKind::FeePayment => {
            let amount = require_number(kind, payload, "amount")?;
            put_text(&mut data, "amount", format!("{:.2}", amount));
            put_text(
                &mut data,
                "payment_method",
                require_text(kind, payload, "payment_method")?,
            );
            put_text(
                &mut data,
                "receipt_number",
                require_text(kind, payload, "receipt_number")?,
            );
        }
        NotificationKind::Marks => {
            let subject = require_text(kind, payload, "subject")?;
            let exam_type = require_text(kind, payload, "exam_type")?;
            let marks = require_number(kind, payload, "marks")?;
            let max_marks = require_number(kind, payload, "max_marks")?;
            if max_marks <= 0.0 {
                return Err(RenderError::InvalidField {
                    kind,
                    field: "max_marks",
                    reason: "must be greater than zero".to_string(),
                });
            }
            let percentage = marks / max_marks * 100.0;
            put_text(&mut data, "subject", subject);
            put_text(&mut data, "exam_type", exam_type);
            put_text(&mut data, "marks", format_number(marks));
            put_text(&mut data, "max_marks", format_number(max_marks));
            put_text(&mut data, "percentage", format!("{:.1}", percentage));
            put_text(&mut data, "grade", letter_grade(percentage).to_string());
        }
        NotificationKind::Emergency | NotificationKind::General => {
            put_text(&mut data, "message", require_text(kind, payload, "message")?);
        }
    }
    Ok(data)
}

fn put_text(data: &mut Map<String, Value>, key: &str, value: String) {
    data.insert(key.to_string(), Value::String(value));
}

fn require_text(
    kind: NotificationKind,
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<String, RenderError> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(RenderError::MissingField { kind, field }),
        Some(Value::String(_)) => Err(RenderError::MissingField { kind, field }),
        Some(other) => Err(RenderError::InvalidField {
            kind,
            field,
            reason: format!("expected text, got {}", other),
        }),
    }
}

fn require_number(
    kind: NotificationKind,
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, RenderError> {
    match payload.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| RenderError::InvalidField {
            kind,
            field,
            reason: "number out of range".to_string(),
        }),
        None | Some(Value::Null) => Err(RenderError::MissingField { kind, field }),
        Some(other) => Err(RenderError::InvalidField {
            kind,
            field,
            reason: format!("expected number, got {}", other),
        }),
    }
}

fn require_bool(
    kind: NotificationKind,
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<bool, RenderError> {
    match payload.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        None | Some(Value::Null) => Err(RenderError::MissingField { kind, field }),
        Some(other) => Err(RenderError::InvalidField {
            kind,
            field,
            reason: format!("expected boolean, got {}", other),
        }),
    }
}

// 85.0 -> "85", 42.5 -> "42.5"
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
