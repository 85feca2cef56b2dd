//! High-level Vault API
//!
//! This module provides the main entry point for interacting with blobkeep:
//! account lifecycle for operators, and password-gated payload access for
//! everyone else.

use crate::model::{AccountInfo, CredentialHash, HashCost, Username};
use crate::store::AccountStore;
use crate::{Error, Result};
use std::path::Path;
use std::sync::OnceLock;

/// How many times a write re-verifies after losing a race with a reset
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Plaintext behind the decoy hash checked for unknown accounts
const DECOY_PASSWORD: &str = "blobkeep-decoy-credential";

/// The credentialed blob store
///
/// Owns the account table and the hashing policy. Construct one per process
/// and share it (it is `Send + Sync`).
///
/// Provides:
/// - Account lifecycle: register, remove, list, reset credential
/// - Verified payload reads and writes
pub struct Vault {
    store: AccountStore,
    cost: HashCost,
    /// Hashed on first use at `cost`; `None` if hashing failed
    decoy: OnceLock<Option<CredentialHash>>,
}

impl Vault {
    /// Open or create a vault backed by a database file
    pub fn open(path: impl AsRef<Path>, cost: HashCost) -> Result<Self> {
        let store = AccountStore::open(path)?;
        if let Some(path) = store.path() {
            tracing::debug!(path = %path.display(), "vault opened");
        }
        Ok(Vault {
            store,
            cost,
            decoy: OnceLock::new(),
        })
    }

    /// Create a vault that lives only as long as this value
    pub fn in_memory(cost: HashCost) -> Result<Self> {
        Ok(Vault {
            store: AccountStore::in_memory()?,
            cost,
            decoy: OnceLock::new(),
        })
    }

    /// The bcrypt cost used for new hashes
    pub fn cost(&self) -> HashCost {
        self.cost
    }

    // === Account Operations ===

    /// Create an account with no payload
    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        let username = Username::parse(username)?;
        let hash = CredentialHash::generate(password, self.cost)?;
        self.store.insert(&username, &hash)?;
        tracing::info!(username = %username, "account registered");
        Ok(())
    }

    /// Delete an account without checking its credential.
    ///
    /// Removing an unknown account succeeds.
    pub fn remove(&self, username: &str) -> Result<()> {
        let username = Username::parse(username)?;
        if self.store.delete(&username)? {
            tracing::info!(username = %username, "account removed");
        } else {
            tracing::debug!(username = %username, "remove of unknown account ignored");
        }
        Ok(())
    }

    /// All usernames. Order is unspecified.
    pub fn list(&self) -> Result<Vec<Username>> {
        self.store.usernames()
    }

    /// Overwrite an account's credential without checking the old one
    pub fn reset_credential(&self, username: &str, new_password: &str) -> Result<()> {
        let username = Username::parse(username)?;
        let hash = CredentialHash::generate(new_password, self.cost)?;
        if !self.store.set_credential(&username, &hash)? {
            return Err(Error::AccountMissing(username.to_string()));
        }
        tracing::info!(username = %username, "credential reset");
        Ok(())
    }

    /// Operator view of one account
    pub fn account_info(&self, username: &str) -> Result<AccountInfo> {
        let username = Username::parse(username)?;
        self.store
            .info(&username)?
            .ok_or_else(|| Error::NotFound(username.to_string()))
    }

    // === Payload Operations ===

    /// Return the payload after checking the password.
    ///
    /// An account that was never written yields an empty payload, which is
    /// distinct from `BadCredential` and `NotFound`.
    pub fn verified_read(&self, username: &str, password: &str) -> Result<Vec<u8>> {
        let username = Username::parse(username)?;
        let Some((hash, payload)) = self.store.credential_and_payload(&username)? else {
            return Err(self.unknown_account(&username, password));
        };

        if !hash.verify(password) {
            tracing::warn!(username = %username, "credential check failed on read");
            return Err(Error::BadCredential(username.to_string()));
        }

        tracing::debug!(username = %username, bytes = payload.len(), "payload read");
        Ok(payload)
    }

    /// Replace the payload after checking the password.
    ///
    /// The write only lands if the hash it verified against is still current;
    /// a concurrent reset forces a fresh check against the new hash.
    pub fn verified_write(&self, username: &str, password: &str, payload: &[u8]) -> Result<()> {
        let username = Username::parse(username)?;
        self.write_checked(&username, password, payload, || {})
    }

    /// Verify-then-compare-and-set loop. `before_commit` runs between the
    /// password check and the conditional update of every attempt.
    fn write_checked(
        &self,
        username: &Username,
        password: &str,
        payload: &[u8],
        mut before_commit: impl FnMut(),
    ) -> Result<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(hash) = self.store.credential(username)? else {
                return Err(self.unknown_account(username, password));
            };

            if !hash.verify(password) {
                tracing::warn!(username = %username, "credential check failed on write");
                return Err(Error::BadCredential(username.to_string()));
            }

            before_commit();

            if self.store.compare_and_set_payload(username, &hash, payload)? {
                tracing::info!(username = %username, bytes = payload.len(), "payload stored");
                return Ok(());
            }

            tracing::debug!(
                username = %username,
                attempt,
                "credential changed during write, re-verifying"
            );
        }

        // Still racing after several resets; treat the password as no longer valid.
        if self.store.credential(username)?.is_none() {
            return Err(Error::NotFound(username.to_string()));
        }
        Err(Error::BadCredential(username.to_string()))
    }

    /// `NotFound`, after spending the same bcrypt work a real check costs
    fn unknown_account(&self, username: &Username, password: &str) -> Error {
        let decoy = self
            .decoy
            .get_or_init(|| CredentialHash::generate(DECOY_PASSWORD, self.cost).ok());
        if let Some(decoy) = decoy {
            let _ = decoy.verify(password);
        }
        tracing::debug!(username = %username, "access to unknown account");
        Error::NotFound(username.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn vault() -> Vault {
        Vault::in_memory(HashCost::MIN).unwrap()
    }

    #[test]
    fn test_register_twice_is_duplicate() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.verified_write("alice", "secret", b"data").unwrap();

        let err = v.register("alice", "other").unwrap_err();
        assert_eq!(err.outcome(), Outcome::DuplicateAccount);

        // First credential and payload survive
        assert_eq!(v.verified_read("alice", "secret").unwrap(), b"data");
        assert_eq!(
            v.verified_read("alice", "other").unwrap_err().outcome(),
            Outcome::BadCredential
        );
    }

    #[test]
    fn test_register_validates_input() {
        let v = vault();
        assert_eq!(
            v.register("", "secret").unwrap_err().outcome(),
            Outcome::ValidationFailure
        );
        assert_eq!(
            v.register("alice", "").unwrap_err().outcome(),
            Outcome::ValidationFailure
        );
        assert!(v.list().unwrap().is_empty());
    }

    #[test]
    fn test_correct_and_wrong_password_in_any_order() {
        let v = vault();
        v.register("alice", "secret").unwrap();

        assert_eq!(
            v.verified_write("alice", "nope", b"x").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        v.verified_write("alice", "secret", b"x").unwrap();
        assert_eq!(
            v.verified_read("alice", "nope").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        assert_eq!(v.verified_read("alice", "secret").unwrap(), b"x");
        assert_eq!(
            v.verified_write("alice", "Secret", b"y").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        assert_eq!(v.verified_read("alice", "secret").unwrap(), b"x");
    }

    #[test]
    fn test_round_trip_including_empty() {
        let v = vault();
        v.register("alice", "secret").unwrap();

        let payload: Vec<u8> = (0..=255).collect();
        v.verified_write("alice", "secret", &payload).unwrap();
        assert_eq!(v.verified_read("alice", "secret").unwrap(), payload);

        v.verified_write("alice", "secret", &[]).unwrap();
        assert_eq!(v.verified_read("alice", "secret").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_never_written_reads_empty() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        assert!(v.verified_read("alice", "secret").unwrap().is_empty());
    }

    #[test]
    fn test_reset_credential() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.reset_credential("alice", "newsecret").unwrap();

        assert_eq!(
            v.verified_read("alice", "secret").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        assert!(v.verified_read("alice", "newsecret").is_ok());
    }

    #[test]
    fn test_reset_unknown_account_is_storage_failure() {
        let v = vault();
        let err = v.reset_credential("ghost", "pw").unwrap_err();
        assert!(matches!(err, Error::AccountMissing(_)));
        assert_eq!(err.outcome(), Outcome::StorageFailure);
    }

    #[test]
    fn test_remove_then_access_is_not_found() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.remove("alice").unwrap();

        assert_eq!(
            v.verified_read("alice", "secret").unwrap_err().outcome(),
            Outcome::NotFound
        );
        assert_eq!(
            v.verified_write("alice", "secret", b"x").unwrap_err().outcome(),
            Outcome::NotFound
        );
        // Idempotent
        v.remove("alice").unwrap();
    }

    #[test]
    fn test_list() {
        let v = vault();
        v.register("alice", "a").unwrap();
        v.register("bob", "b").unwrap();

        let mut names: Vec<String> = v.list().unwrap().into_iter().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_account_info() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.verified_write("alice", "secret", &[1, 2, 3]).unwrap();

        let info = v.account_info("alice").unwrap();
        assert_eq!(info.username.as_str(), "alice");
        assert!(info.has_payload);
        assert_eq!(info.payload_size, 3);

        assert_eq!(
            v.account_info("ghost").unwrap_err().outcome(),
            Outcome::NotFound
        );
    }

    #[test]
    fn test_alice_scenario() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.verified_write("alice", "secret", &[0x01, 0x02]).unwrap();
        assert_eq!(v.verified_read("alice", "secret").unwrap(), vec![0x01, 0x02]);
        assert_eq!(
            v.verified_read("alice", "wrong").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        v.reset_credential("alice", "newsecret").unwrap();
        assert_eq!(
            v.verified_read("alice", "secret").unwrap_err().outcome(),
            Outcome::BadCredential
        );
        assert_eq!(
            v.verified_read("alice", "newsecret").unwrap(),
            vec![0x01, 0x02]
        );
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.db");

        {
            let v = Vault::open(&path, HashCost::MIN).unwrap();
            v.register("alice", "secret").unwrap();
            v.verified_write("alice", "secret", b"persisted").unwrap();
        }

        {
            let v = Vault::open(&path, HashCost::MIN).unwrap();
            assert_eq!(v.verified_read("alice", "secret").unwrap(), b"persisted");
        }
    }

    #[test]
    fn test_concurrent_writes_with_reset() {
        let v = Arc::new(vault());
        v.register("alice", "secret").unwrap();

        let writers: Vec<_> = (0..4u8)
            .map(|i| {
                let v = Arc::clone(&v);
                std::thread::spawn(move || {
                    let outcome = Outcome::of(&v.verified_write("alice", "secret", &[i]));
                    assert!(matches!(
                        outcome,
                        Outcome::Success | Outcome::BadCredential
                    ));
                })
            })
            .collect();
        v.reset_credential("alice", "newsecret").unwrap();
        for w in writers {
            w.join().unwrap();
        }

        // Whatever landed, only the new password reads it now
        assert!(v.verified_read("alice", "newsecret").is_ok());
        assert_eq!(
            v.verified_read("alice", "secret").unwrap_err().outcome(),
            Outcome::BadCredential
        );
    }

    #[test]
    fn test_unknown_account_runs_decoy_check() {
        let v = vault();
        assert!(v.decoy.get().is_none());

        assert_eq!(
            v.verified_read("ghost", "pw").unwrap_err().outcome(),
            Outcome::NotFound
        );
        let decoy = v.decoy.get().cloned().flatten().expect("decoy hash built");
        assert!(decoy.as_str().starts_with("$2"));
        assert!(decoy.as_str().contains(&format!("${:02}$", HashCost::MIN.get())));

        assert_eq!(
            v.verified_write("ghost", "pw", b"x").unwrap_err().outcome(),
            Outcome::NotFound
        );
        // The decoy never lands in the table
        assert!(v.list().unwrap().is_empty());
    }

    #[test]
    fn test_write_loses_race_to_reset() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        v.verified_write("alice", "secret", b"before").unwrap();
        let alice = Username::parse("alice").unwrap();

        let mut resets = 0;
        let err = v
            .write_checked(&alice, "secret", b"after", || {
                resets += 1;
                v.reset_credential("alice", "newsecret").unwrap();
            })
            .unwrap_err();

        assert_eq!(err.outcome(), Outcome::BadCredential);
        assert_eq!(resets, 1);
        assert_eq!(v.verified_read("alice", "newsecret").unwrap(), b"before");
        assert_eq!(
            v.verified_read("alice", "secret").unwrap_err().outcome(),
            Outcome::BadCredential
        );
    }

    #[test]
    fn test_write_retries_after_reset_to_same_password() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        let alice = Username::parse("alice").unwrap();

        // Same plaintext, fresh salt: the first compare-and-set misses, the retry lands
        let mut attempts = 0;
        v.write_checked(&alice, "secret", b"after", || {
            attempts += 1;
            if attempts == 1 {
                v.reset_credential("alice", "secret").unwrap();
            }
        })
        .unwrap();

        assert_eq!(attempts, 2);
        assert_eq!(v.verified_read("alice", "secret").unwrap(), b"after");
    }

    #[test]
    fn test_write_gives_up_after_repeated_resets() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        let alice = Username::parse("alice").unwrap();

        let mut attempts = 0;
        let err = v
            .write_checked(&alice, "secret", b"after", || {
                attempts += 1;
                v.reset_credential("alice", "secret").unwrap();
            })
            .unwrap_err();

        assert_eq!(err.outcome(), Outcome::BadCredential);
        assert_eq!(attempts, MAX_WRITE_ATTEMPTS);
        assert!(v.verified_read("alice", "secret").unwrap().is_empty());
    }

    #[test]
    fn test_write_to_account_removed_mid_write() {
        let v = vault();
        v.register("alice", "secret").unwrap();
        let alice = Username::parse("alice").unwrap();

        let err = v
            .write_checked(&alice, "secret", b"after", || {
                v.remove("alice").unwrap();
            })
            .unwrap_err();

        assert_eq!(err.outcome(), Outcome::NotFound);
        assert!(v.list().unwrap().is_empty());
    }
}
