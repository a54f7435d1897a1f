//! SQLite-backed member lookup.
//!
//! Members are managed elsewhere; this table is a read-mostly mirror that
//! lets the store resolve participants without another service.

use sqlx::SqlitePool;

use crate::persistence::traits::MemberResolver;
use crate::persistence::{Member, MemberId, StoreError};

/// SQLite implementation of [`MemberResolver`].
#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or rename a member.
    pub async fn save(&self, member: &Member) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO member (id, name) VALUES (?, ?)")
            .bind(member.id)
            .bind(&member.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl MemberResolver for SqliteMemberRepository {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        let row: Option<(i64, String)> = sqlx::query_as("SELECT id, name FROM member WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, name)| Member { id, name }))
    }
}
