use std::path::Path;

use log::*;

use crate::errors::ServerError;

/// Extracts the order number from the body of `POST /api/user/orders`.
///
/// Clients send the number either as plain text or as a JSON number or string. Anything that is not a run of digits
/// is a malformed request. Whether the digits make a valid order number is for the ledger to decide.
pub fn parse_order_body(body: &[u8]) -> Result<String, ServerError> {
    let text = std::str::from_utf8(body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?.trim();
    let number = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(text).trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("Expected an order number, but the body was empty".into()));
    }
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServerError::InvalidRequestBody(format!("'{number}' is not an order number")));
    }
    Ok(number.to_string())
}

/// SQLite creates the database file on demand, but not the directory it lives in. Make sure that exists.
pub fn prepare_database_path(url: &str) -> Result<(), ServerError> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
