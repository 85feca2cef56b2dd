//! SQLite-backed account table
//!
//! A single connection guarded by a mutex. Every method takes the lock for
//! exactly one statement, so no caller ever holds it across a bcrypt call.

use super::schema;
use crate::model::{AccountInfo, CredentialHash, Username};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a statement waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Row-level access to the account table
pub struct AccountStore {
    /// Path to the database file (`None` for in-memory stores)
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl AccountStore {
    /// Open a database file, creating the file and table if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(conn, Some(path))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(schema::CREATE_TABLE)?;
        Ok(AccountStore {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new account with no payload
    pub fn insert(&self, username: &Username, hash: &CredentialHash) -> Result<()> {
        let changed = self.conn.lock().execute(
            schema::INSERT_ACCOUNT,
            params![username.as_str(), hash.as_str()],
        )?;
        if changed == 0 {
            return Err(Error::DuplicateAccount(username.to_string()));
        }
        Ok(())
    }

    /// Delete an account. Returns whether a row existed.
    pub fn delete(&self, username: &Username) -> Result<bool> {
        let changed = self
            .conn
            .lock()
            .execute(schema::DELETE_ACCOUNT, params![username.as_str()])?;
        Ok(changed > 0)
    }

    /// All usernames, in storage iteration order
    pub fn usernames(&self) -> Result<Vec<Username>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(schema::SELECT_USERNAMES)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(Username::from_stored(name?));
        }
        Ok(names)
    }

    /// Overwrite the credential hash. Returns whether the account existed.
    pub fn set_credential(&self, username: &Username, hash: &CredentialHash) -> Result<bool> {
        let changed = self.conn.lock().execute(
            schema::UPDATE_CREDENTIAL,
            params![hash.as_str(), username.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Current credential hash, if the account exists
    pub fn credential(&self, username: &Username) -> Result<Option<CredentialHash>> {
        let hash = self
            .conn
            .lock()
            .query_row(
                schema::SELECT_CREDENTIAL,
                params![username.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(hash.map(|h| CredentialHash::from_stored(h.unwrap_or_default())))
    }

    /// Credential hash and payload read as one snapshot.
    ///
    /// A never-written payload comes back as an empty vector.
    pub fn credential_and_payload(
        &self,
        username: &Username,
    ) -> Result<Option<(CredentialHash, Vec<u8>)>> {
        let row = self
            .conn
            .lock()
            .query_row(
                schema::SELECT_CREDENTIAL_AND_CONTENT,
                params![username.as_str()],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<Vec<u8>>>(1)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(hash, payload)| {
            (
                CredentialHash::from_stored(hash.unwrap_or_default()),
                payload.unwrap_or_default(),
            )
        }))
    }

    /// Replace the payload only if the stored hash still equals `expected`.
    ///
    /// Returns `false` when the account is gone or its credential changed
    /// since `expected` was read.
    pub fn compare_and_set_payload(
        &self,
        username: &Username,
        expected: &CredentialHash,
        payload: &[u8],
    ) -> Result<bool> {
        let changed = self.conn.lock().execute(
            schema::UPDATE_CONTENT_IF_CREDENTIAL,
            params![payload, username.as_str(), expected.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Operator view of an account
    pub fn info(&self, username: &Username) -> Result<Option<AccountInfo>> {
        let info = self
            .conn
            .lock()
            .query_row(schema::SELECT_INFO, params![username.as_str()], |row| {
                Ok(AccountInfo {
                    username: Username::from_stored(row.get(0)?),
                    has_payload: row.get(1)?,
                    payload_size: row.get::<_, i64>(2)? as u64,
                    last_login_time: row.get(3)?,
                    last_login_ip: row.get(4)?,
                })
            })
            .optional()?;
        Ok(info)
    }

    /// Get the file path (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
