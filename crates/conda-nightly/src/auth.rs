use std::env;

use anyhow::{Context, Result, bail};

/// Environment variable carrying the Anaconda.org upload credential. The
/// CI system injects it; there is no file fallback and no default.
pub const TOKEN_VAR: &str = "CONDA_UPLOAD_TOKEN";

/// Read the upload token from the process environment. Only the upload
/// step calls this, so a missing token surfaces exactly when the original
/// script would have passed an empty credential to the upload client.
pub fn resolve_token() -> Result<String> {
    let raw = env::var(TOKEN_VAR)
        .with_context(|| format!("{TOKEN_VAR} is not set; the upload step requires it"))?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        bail!("{TOKEN_VAR} is set but empty");
    }
    Ok(token)
}

/// Whether a token is present, without exposing its value. Used by the
/// doctor diagnostics.
pub fn token_detected() -> bool {
    resolve_token().is_ok()
}
