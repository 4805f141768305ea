use std::path::PathBuf;

use crate::constants::files;
use crate::error::{ParlanceError, Result};

/// `~/.parlance`
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ParlanceError::config("Could not determine home directory"))?;
    Ok(home.join(files::APP_DIR))
}

/// `~/.parlance/conversations.yaml`
pub fn conversations_file() -> Result<PathBuf> {
    Ok(app_dir()?.join(files::CONVERSATIONS_FILE))
}
