//! Session persistence via sqlx

mod sqlite;
pub use sqlite::SqlxSqlitePersistence;

const ID_COLUMN: &str = "id";
const USER_ID_COLUMN: &str = "user_id";
const CREATED_AT_COLUMN: &str = "created_at";
