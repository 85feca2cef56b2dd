//! Table layout
//!
//! Column names match `data.db` files produced by earlier deployments of the
//! service, so those files open without conversion.

pub(crate) const CREATE_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS data (
    "user_name" TEXT PRIMARY KEY,
    "password" TEXT,
    "content" BLOB,
    "last_login_time" TEXT,
    "last_login_ip" TEXT
)"#;

pub(crate) const INSERT_ACCOUNT: &str =
    "INSERT INTO data (user_name, password) VALUES (?1, ?2) ON CONFLICT(user_name) DO NOTHING";

pub(crate) const DELETE_ACCOUNT: &str = "DELETE FROM data WHERE user_name = ?1";

pub(crate) const SELECT_USERNAMES: &str = "SELECT user_name FROM data";

pub(crate) const UPDATE_CREDENTIAL: &str = "UPDATE data SET password = ?1 WHERE user_name = ?2";

pub(crate) const SELECT_CREDENTIAL: &str = "SELECT password FROM data WHERE user_name = ?1";

pub(crate) const SELECT_CREDENTIAL_AND_CONTENT: &str =
    "SELECT password, content FROM data WHERE user_name = ?1";

/// Conditional write: only lands if the hash is still the one the caller verified
pub(crate) const UPDATE_CONTENT_IF_CREDENTIAL: &str =
    "UPDATE data SET content = ?1 WHERE user_name = ?2 AND password = ?3";

pub(crate) const SELECT_INFO: &str = "SELECT user_name, content IS NOT NULL, \
     COALESCE(length(content), 0), last_login_time, last_login_ip \
     FROM data WHERE user_name = ?1";
