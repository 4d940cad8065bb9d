//! Runtime-configurable transport parameters.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `MESHCOMM_`) or by constructing a custom `CommConfig`.

use std::time::Duration;

/// Tuning parameters for the TCP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommConfig {
    /// Disable Nagle's algorithm on every channel.
    pub tcp_nodelay: bool,

    /// Largest frame payload accepted from a peer. Larger frames close the
    /// connection.
    pub max_frame_bytes: usize,

    /// How long an accepted connection may take to send its handshake
    /// before it is dropped.
    pub handshake_timeout: Duration,
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            max_frame_bytes: 1024 * 1024 * 1024, // 1 GiB
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl CommConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `MESHCOMM_TCP_NODELAY` (`true`/`false`/`1`/`0`)
    /// - `MESHCOMM_MAX_FRAME_BYTES`
    /// - `MESHCOMM_HANDSHAKE_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("MESHCOMM_TCP_NODELAY") {
            match v.trim() {
                "1" | "true" | "TRUE" | "yes" => cfg.tcp_nodelay = true,
                "0" | "false" | "FALSE" | "no" => cfg.tcp_nodelay = false,
                _ => {}
            }
        }
        if let Some(v) = lookup("MESHCOMM_MAX_FRAME_BYTES")
            && let Ok(n) = v.trim().parse::<usize>()
        {
            cfg.max_frame_bytes = n;
        }
        if let Some(v) = lookup("MESHCOMM_HANDSHAKE_TIMEOUT_SECS")
            && let Ok(s) = v.trim().parse::<u64>()
        {
            cfg.handshake_timeout = Duration::from_secs(s);
        }

        cfg
    }
}
