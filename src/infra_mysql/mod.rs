mod token_store_mysql;

pub use token_store_mysql::*;

mod util;

/// Schema for the `token_record` table used by `MySqlTokenStore`.
pub const TOKEN_RECORD_SCHEMA: &str = include_str!("../../sql/token_record.sql");
