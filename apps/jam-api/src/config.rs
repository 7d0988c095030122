/// Jam API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Participant ceiling applied when a host doesn't pick one.
    pub default_max_participants: u32,
}

impl Config {
    /// Load configuration from environment variables. Every variable has a
    /// default, so this never fails.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            default_max_participants: std::env::var("JAM_MAX_PARTICIPANTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(10),
        }
    }
}
