use sqlx::mysql::MySqlDatabaseError;

/// MySQL error number for a duplicate primary or unique key.
pub const ER_DUP_ENTRY: u16 = 1062;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == ER_DUP_ENTRY;
        }
    }

    false
}
