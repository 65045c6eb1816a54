//! Passcode gate with an optional persisted login flag

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thuchi_config::AuthConfig;

use crate::error::{CoreError, CoreResult};

const FLAG_VALUE: &str = "true";

/// Tracks whether the session has been unlocked
pub struct LoginGate {
    passcode: String,
    flag_file: Option<PathBuf>,
    logged_in: AtomicBool,
}

impl LoginGate {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            passcode: auth.passcode.clone(),
            flag_file: auth.flag_file.clone(),
            logged_in: AtomicBool::new(false),
        }
    }

    /// Read back a flag persisted by an earlier login
    pub async fn restore(&self) -> bool {
        let Some(path) = &self.flag_file else {
            return false;
        };
        let restored = match tokio::fs::read_to_string(path).await {
            Ok(content) => content.trim() == FLAG_VALUE,
            Err(_) => false,
        };
        if restored {
            log::info!("Restored login from {}", path.display());
        }
        self.logged_in.store(restored, Ordering::SeqCst);
        restored
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub async fn login(&self, passcode: &str) -> CoreResult<()> {
        if passcode != self.passcode {
            return Err(CoreError::InvalidPasscode);
        }

        // Unlock only once the flag is persisted
        if let Some(path) = &self.flag_file {
            tokio::fs::write(path, FLAG_VALUE).await?;
        }
        self.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub async fn logout(&self) -> CoreResult<()> {
        self.logged_in.store(false, Ordering::SeqCst);

        if let Some(path) = &self.flag_file {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Fail with `NotLoggedIn` unless unlocked
    pub fn require(&self) -> CoreResult<()> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(CoreError::NotLoggedIn)
        }
    }
}
