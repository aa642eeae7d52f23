//! Append-only audit log backed by SQLite.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use credilock_core::lockout::ports::AuditLog as AuditLogPort;
use credilock_domain::{AuditEvent, Result as DomainResult};
use rusqlite::params;
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::sale_repository::map_join_error;

/// Audit writer. Inserts only; the table is never updated or deleted from.
pub struct SqliteAuditLog {
    db: Arc<DbManager>,
}

impl SqliteAuditLog {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLogPort for SqliteAuditLog {
    async fn record(&self, event: AuditEvent) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO audit_log (actor, action, details, tenant_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.actor.as_str(),
                    event.action.as_str(),
                    event.details,
                    event.tenant_id,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
