//! Resume lookup used by the export gateway.
//!
//! Only the read the gateway needs lives here; resume CRUD belongs to the
//! form-filling flow. `AppState` holds an `Arc<dyn ResumeStore>`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::export::error::ExportError;
use crate::models::resume::ResumeRow;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Returns the resume only if `user_id` owns it.
    async fn fetch(&self, resume_id: Uuid, user_id: Uuid)
        -> Result<Option<ResumeRow>, ExportError>;
}

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn fetch(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeRow>, ExportError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT id, user_id, title, template, data, created_at, updated_at
            FROM resumes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryResumeStore {
        rows: Mutex<HashMap<Uuid, ResumeRow>>,
    }

    impl MemoryResumeStore {
        pub fn insert(&self, row: ResumeRow) {
            self.rows.lock().unwrap().insert(row.id, row);
        }
    }

    #[async_trait]
    impl ResumeStore for MemoryResumeStore {
        async fn fetch(
            &self,
            resume_id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<ResumeRow>, ExportError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&resume_id)
                .filter(|row| row.user_id == user_id)
                .cloned())
        }
    }
}
