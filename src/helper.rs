use log::{info, trace};

use crate::{NoteError, NoteField, Result};

/// Installs the `env_logger` backend. Later calls are ignored.
pub fn initialize_logger() {
    let installed =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .format_module_path(true)
            .try_init()
            .is_ok();

    if installed {
        info!("Logger initialized");
    }
}

/// Trims a required field, failing if nothing is left
pub fn require_text(field: NoteField, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        trace!("Rejected empty {}", field);
        return Err(NoteError::Validation { field });
    }
    Ok(trimmed.to_string())
}

// Helper method for cleaning tag input
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
