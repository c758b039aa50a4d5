use bon::Builder;
use rocket::{async_trait, time::OffsetDateTime};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::{
    error::{StoreError, StoreResult},
    storage::{Session, SessionFilter, SessionPersistence},
};

use super::*;

/** Session persistence using SQLite via [sqlx](https://docs.rs/crate/sqlx), for use with
[`DurableStorage`](crate::storage::durable::DurableStorage).

# Requirements
You must pass in an initialized sqlx SQLite connection pool. The table is created on
setup if it doesn't exist yet:

| Name | Type |
|------|---------|
| id   | TEXT NOT NULL PRIMARY KEY |
| user_id | TEXT NOT NULL |
| created_at | TEXT NOT NULL |

# Example
```
use std::sync::Arc;
use rocket_session_auth::storage::{durable::DurableStorage, sqlx::SqlxSqlitePersistence};

async fn create_storage() -> DurableStorage {
    let pool = sqlx::SqlitePool::connect("sqlite://sessions.db").await.unwrap();
    let persistence = SqlxSqlitePersistence::builder()
        .pool(pool)
        .table_name("user_sessions")
        .build();
    DurableStorage::new(Arc::new(persistence))
}
```
*/
#[derive(Builder)]
pub struct SqlxSqlitePersistence {
    /// An initialized SQLite connection pool.
    pool: SqlitePool,
    /// The name of the table to use for storing sessions (default: `"user_sessions"`)
    #[builder(into, default = "user_sessions")]
    table_name: String,
}

fn session_from_row(row: &SqliteRow) -> sqlx::Result<Session> {
    let id: String = row.try_get(ID_COLUMN)?;
    let user_id: String = row.try_get(USER_ID_COLUMN)?;
    let created_at: OffsetDateTime = row.try_get(CREATED_AT_COLUMN)?;
    Ok(Session::new(id, user_id, created_at))
}

#[async_trait]
impl SessionPersistence for SqlxSqlitePersistence {
    async fn save(&self, session: &Session) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO \"{}\" ({ID_COLUMN}, {USER_ID_COLUMN}, {CREATED_AT_COLUMN}) VALUES (?, ?, ?)",
            self.table_name
        );
        sqlx::query(&sql)
            .bind(session.id())
            .bind(session.user_id())
            .bind(session.created_at())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn search(&self, filter: &SessionFilter) -> StoreResult<Vec<Session>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ID_COLUMN}, {USER_ID_COLUMN}, {CREATED_AT_COLUMN} FROM \"{}\"",
            self.table_name
        ));
        let mut separator = " WHERE ";
        if let Some(session_id) = &filter.session_id {
            query
                .push(separator)
                .push(ID_COLUMN)
                .push(" = ")
                .push_bind(session_id.clone());
            separator = " AND ";
        }
        if let Some(user_id) = &filter.user_id {
            query
                .push(separator)
                .push(USER_ID_COLUMN)
                .push(" = ")
                .push_bind(user_id.clone());
        }
        query.push(format!(" ORDER BY {CREATED_AT_COLUMN}"));

        let rows = query.build().fetch_all(&self.pool).await?;
        let sessions = rows
            .iter()
            .map(session_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(sessions)
    }

    async fn remove(&self, session: &Session) -> StoreResult<()> {
        let sql = format!("DELETE FROM \"{}\" WHERE {ID_COLUMN} = ?", self.table_name);
        sqlx::query(&sql)
            .bind(session.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn setup(&self) -> StoreResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\
                {ID_COLUMN} TEXT NOT NULL PRIMARY KEY, \
                {USER_ID_COLUMN} TEXT NOT NULL, \
                {CREATED_AT_COLUMN} TEXT NOT NULL\
            )",
            self.table_name
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::SetupTeardown(e.to_string()))?;
        rocket::debug!("Session table '{}' is ready", self.table_name);
        Ok(())
    }
}
