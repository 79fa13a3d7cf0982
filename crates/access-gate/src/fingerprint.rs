//! Device fingerprint used to bind a session to the machine it was created on

use chrono::{Local, Offset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Characteristics of the device running the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub user_agent: String,
    pub language: String,
    /// Minutes to add to local time to get UTC
    pub timezone_offset_minutes: i32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub hardware_concurrency: usize,
}

impl DeviceProfile {
    /// Profile of the current process and host
    pub fn detect() -> Self {
        let local_minus_utc = Local::now().offset().fix().local_minus_utc();

        Self {
            user_agent: format!(
                "{}/{} ({}; {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            language: std::env::var("LANG").unwrap_or_else(|_| "en-US".to_string()),
            timezone_offset_minutes: -local_minus_utc / 60,
            // Headless: no screen
            screen_width: 0,
            screen_height: 0,
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0),
        }
    }

    /// Stable SHA-256 fingerprint (hex) over the profile fields
    pub fn fingerprint(&self) -> String {
        let components = [
            self.user_agent.clone(),
            self.language.clone(),
            self.timezone_offset_minutes.to_string(),
            self.screen_width.to_string(),
            self.screen_height.to_string(),
            self.hardware_concurrency.to_string(),
        ];
        hex::encode(Sha256::digest(components.join("|").as_bytes()))
    }
}
