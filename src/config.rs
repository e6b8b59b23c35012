use crate::resp::codec::{FrameLimits, DEFAULT_MAX_ARGS, DEFAULT_MAX_BULK_LEN};
use crate::resp::pool::DEFAULT_POOL_SLOTS;

pub const DEFAULT_PORT: u16 = 7464;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespConfig {
    pub host: String,
    pub port: u16,
    pub limits: FrameLimits,
    /// Reply buffers kept for reuse across all connections.
    pub buffer_pool_slots: usize,
}

impl Default for RespConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            limits: FrameLimits::default(),
            buffer_pool_slots: DEFAULT_POOL_SLOTS,
        }
    }
}

impl RespConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("KHRONOS_HOST").ok().as_deref(),
            std::env::var("KHRONOS_PORT").ok().as_deref(),
            std::env::var("KHRONOS_MAX_ARGS").ok().as_deref(),
            std::env::var("KHRONOS_MAX_BULK_LEN").ok().as_deref(),
            std::env::var("KHRONOS_BUFFER_POOL").ok().as_deref(),
        )
    }

    fn from_vars(
        host: Option<&str>,
        port: Option<&str>,
        max_args: Option<&str>,
        max_bulk_len: Option<&str>,
        buffer_pool: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            host: host.map(str::to_string).unwrap_or(defaults.host),
            port: port.and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
            limits: FrameLimits {
                max_args: max_args
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_ARGS),
                max_bulk_len: max_bulk_len
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_BULK_LEN),
            },
            buffer_pool_slots: buffer_pool
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.buffer_pool_slots),
        }
    }

    /// Applies a `host:port` or `:port` bind address. Parts that do not
    /// parse leave the current value alone.
    pub fn with_listen_addr(mut self, addr: &str) -> Self {
        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (addr, None),
        };
        if !host.is_empty() {
            self.host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        }
        if let Some(port) = port.and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        self
    }

    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
