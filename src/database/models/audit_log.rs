use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const AUDIT_LOGS_TABLE: &str = "audit_logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    UpdateInventory,
    BulkUpdateStatus,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::UpdateInventory => "update_inventory",
            AuditAction::BulkUpdateStatus => "bulk_update_status",
        }
    }
}

/// Who performed a mutation and from where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditActor {
    pub user_id: Option<Uuid>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditActor {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid) -> Self {
        Self { user_id: Some(user_id), ..Self::default() }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(actor: &AuditActor, action: AuditAction, table_name: &str, record_id: Option<Uuid>) -> Self {
        Self {
            actor_id: actor.user_id,
            action,
            table_name: table_name.to_string(),
            record_id,
            old_values: None,
            new_values: None,
            ip: actor.ip.clone(),
            user_agent: actor.user_agent.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn with_old(mut self, values: Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn with_new(mut self, values: Value) -> Self {
        self.new_values = Some(values);
        self
    }
}
