use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "rs_webmail";

/// Environment fallback when nothing is stored in the keyring.
pub const SESSION_ENV: &str = "RS_WEBMAIL_SESSION";

/// Save the backend session cookie (`name=value`) for `base_url`.
pub fn save_session_cookie(base_url: &str, cookie: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, base_url);
    entry?
        .set_password(cookie)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

pub fn load_session_cookie(base_url: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, base_url);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Keyring first, then `RS_WEBMAIL_SESSION`.
pub fn resolve_session_cookie(base_url: &str) -> Result<Option<String>> {
    Ok(load_session_cookie(base_url)?.or_else(|| std::env::var(SESSION_ENV).ok()))
}
