//! Credential hashing, salt rotation and authentication.
//!
//! All functions work on any [`Credentialed`] record, so a standalone
//! applicant and one embedded in a bootcamp are handled by the same code.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tokio::task::{self, JoinError};
use tracing::debug;

use crate::constants::hashing::{
    DERIVED_KEY_LEN, MIN_PASSWORD_LEN_EXCLUSIVE, PBKDF2_ITERATIONS, SALT_LEN,
};
use crate::domain::Credentialed;

/// PBKDF2-HMAC-SHA512 of `plaintext` under `salt`, base64 encoded.
///
/// Without a salt (or with an empty plaintext) the input is returned
/// unchanged. Records that were never saved with a long enough password
/// therefore compare their stored plaintext directly.
#[must_use]
pub fn hash_with_salt(plaintext: &str, salt: Option<&str>) -> String {
    match salt {
        Some(salt) if !salt.is_empty() && !plaintext.is_empty() => {
            let mut key = [0u8; DERIVED_KEY_LEN];
            pbkdf2_hmac::<Sha512>(
                plaintext.as_bytes(),
                salt.as_bytes(),
                PBKDF2_ITERATIONS,
                &mut key,
            );
            STANDARD.encode(key)
        }
        _ => plaintext.to_string(),
    }
}

/// Hashes `plaintext` with the record's current salt.
#[must_use]
pub fn hash_password<C: Credentialed + ?Sized>(record: &C, plaintext: &str) -> String {
    hash_with_salt(plaintext, record.identity().salt.as_deref())
}

/// 16 bytes from the thread-local CSPRNG, base64 encoded for storage.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_LEN] = rand::rng().random();
    STANDARD.encode(bytes)
}

/// Pre-save hook: draws a new salt and hashes a freshly set password.
///
/// Only acts when the password was set since the record was loaded and is
/// longer than six characters. Saves that leave a stored hash untouched keep
/// its salt, so a long password is not re-salted on every save and a stored
/// hash is never hashed again. Returns whether the credentials changed.
pub fn rotate_credentials<C: Credentialed + ?Sized>(record: &mut C) -> bool {
    let base = record.identity_mut();

    if !base.password_modified() || base.password.chars().count() <= MIN_PASSWORD_LEN_EXCLUSIVE {
        return false;
    }

    let salt = generate_salt();
    let hashed = hash_with_salt(&base.password, Some(&salt));
    base.salt = Some(salt);
    base.password = hashed;
    base.mark_persisted();

    debug!(username = %base.username, "Rotated credential salt");
    true
}

/// True iff `candidate` hashes to the stored password under the stored salt.
#[must_use]
pub fn authenticate<C: Credentialed + ?Sized>(record: &C, candidate: &str) -> bool {
    let computed = hash_password(record, candidate);
    record
        .identity()
        .password
        .as_bytes()
        .ct_eq(computed.as_bytes())
        .into()
}

/// Runs [`rotate_credentials`] on the blocking pool.
/// PBKDF2 is CPU-bound and would stall the async runtime if run inline.
pub async fn rotate_credentials_blocking<C>(mut record: C) -> Result<C, JoinError>
where
    C: Credentialed + Send + 'static,
{
    task::spawn_blocking(move || {
        rotate_credentials(&mut record);
        record
    })
    .await
}

/// Runs [`authenticate`] on the blocking pool, handing the record back.
pub async fn authenticate_blocking<C>(record: C, candidate: String) -> Result<(bool, C), JoinError>
where
    C: Credentialed + Send + 'static,
{
    task::spawn_blocking(move || (authenticate(&record, &candidate), record)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Applicant, BaseIdentity, Bootcamp, Identity};

    fn with_password(password: &str) -> BaseIdentity {
        let mut base = BaseIdentity::local("ada");
        base.set_password(password);
        base
    }

    #[test]
    fn hashing_is_deterministic_for_same_salt() {
        let a = hash_with_salt("correct horse", Some("c2FsdA=="));
        let b = hash_with_salt("correct horse", Some("c2FsdA=="));
        assert_eq!(a, b);
        assert_eq!(a.len(), 88);
        assert_ne!(a, hash_with_salt("correct horse", Some("b3RoZXI=")));
    }

    #[test]
    fn hashing_without_salt_returns_plaintext() {
        let base = with_password("whatever-it-is");
        assert!(base.salt.is_none());
        assert_eq!(hash_password(&base, "whatever-it-is"), "whatever-it-is");
        assert_eq!(hash_with_salt("", Some("c2FsdA==")), "");
    }

    #[test]
    fn generated_salts_are_sixteen_random_bytes() {
        let a = generate_salt();
        let b = generate_salt();
        assert_ne!(a, b);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), SALT_LEN);
    }

    #[test]
    fn short_password_is_left_untouched_on_save() {
        let mut base = with_password("123456");
        base.salt = Some("previous".to_string());

        assert!(!rotate_credentials(&mut base));
        assert_eq!(base.password, "123456");
        assert_eq!(base.salt.as_deref(), Some("previous"));
    }

    #[test]
    fn long_password_gets_new_salt_and_hash() {
        let mut base = with_password("first-password");
        assert!(rotate_credentials(&mut base));
        let first_salt = base.salt.clone().unwrap();

        assert_eq!(
            base.password,
            hash_with_salt("first-password", Some(&first_salt))
        );

        base.set_password("second-password");
        assert!(rotate_credentials(&mut base));
        assert_ne!(base.salt.as_deref(), Some(first_salt.as_str()));
    }

    #[test]
    fn stored_hash_is_not_rehashed_on_later_saves() {
        let mut base = with_password("first-password");
        rotate_credentials(&mut base);
        let stored = base.password.clone();

        assert!(!rotate_credentials(&mut base));
        assert_eq!(base.password, stored);
        assert!(authenticate(&base, "first-password"));
    }

    #[test]
    fn authenticate_accepts_only_latest_password() {
        let mut base = with_password("first-password");
        rotate_credentials(&mut base);
        assert!(authenticate(&base, "first-password"));
        assert!(!authenticate(&base, "First-password"));
        assert!(!authenticate(&base, ""));

        base.set_password("second-password");
        rotate_credentials(&mut base);
        assert!(authenticate(&base, "second-password"));
        assert!(!authenticate(&base, "first-password"));
    }

    #[tokio::test]
    async fn blocking_variants_match_inline_results() {
        let base = rotate_credentials_blocking(with_password("off-thread-pass"))
            .await
            .unwrap();
        assert!(base.salt.is_some());

        let (ok, base) = authenticate_blocking(base, "off-thread-pass".to_string())
            .await
            .unwrap();
        assert!(ok);
        let (ok, _) = authenticate_blocking(base, "nope".to_string()).await.unwrap();
        assert!(!ok);
    }

    #[test]
    fn embedded_and_top_level_applicants_hash_identically() {
        let salt = generate_salt();

        let mut top_level = Applicant::new(with_password("bootcamp-pass"));
        top_level.identity.salt = Some(salt.clone());

        let mut camp = Bootcamp::new("Cohort 1", None);
        camp.applicants.push(top_level.clone());
        let embedded = &camp.applicants[0];

        let as_identity = Identity::Applicant(top_level.clone());
        assert_eq!(
            hash_password(embedded, "bootcamp-pass"),
            hash_password(&as_identity, "bootcamp-pass")
        );
        assert_eq!(
            hash_password(embedded, "bootcamp-pass"),
            hash_with_salt("bootcamp-pass", Some(&salt))
        );
    }
}
