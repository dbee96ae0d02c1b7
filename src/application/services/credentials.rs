use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use std::sync::OnceLock;

#[cfg(test)]
thread_local! {
    static VERIFICATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of argon2 verifications run on the current thread.
#[cfg(test)]
pub(crate) fn verifications() -> usize {
    VERIFICATIONS.with(|c| c.get())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    #[cfg(test)]
    VERIFICATIONS.with(|c| c.set(c.get() + 1));
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn placeholder_hash() -> Option<&'static str> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| hash_password("placeholder-credential").ok())
        .as_deref()
}

/// Runs the same argon2 work as a real verification for a caller that has
/// no stored hash, so a missing account costs as much as a wrong password.
pub fn verify_against_placeholder(password: &str) {
    match placeholder_hash() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => tracing::warn!("placeholder_hash_unavailable"),
    }
}
