//! Channel pool for callers that need concurrency.
//!
//! A single channel carries one call at a time, so concurrent callers
//! need independent channels. The pool caps how many exist per server
//! name and hands idle ones back out instead of reconnecting. Whole
//! channels, never a shared stream, so pooled use keeps the one-call-per-
//! channel discipline intact.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use peercall_common::protocol::error::{PeercallError, Result};
use peercall_common::transport::{Resolver, SocketDirResolver};

use crate::channel::{Channel, ChannelOptions};

/// Channel pool configuration.
#[derive(Clone)]
pub struct PoolConfig {
    /// Maximum number of channels per server name.
    pub max_channels: usize,
    /// Maximum time to wait for a channel when the pool is full.
    pub acquire_timeout: Duration,
    /// Options applied to freshly connected channels.
    pub options: ChannelOptions,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_channels: 8,
            acquire_timeout: Duration::from_secs(5),
            options: ChannelOptions::default(),
        }
    }
}

/// Pool of channels keyed by server name.
///
/// [`acquire`](Self::acquire) returns an idle channel when one exists,
/// connects a new one while under the cap, and otherwise waits for a
/// release until `acquire_timeout` elapses. Callers return channels with
/// [`release`](Self::release); a channel dropped instead of released
/// simply shrinks the pool.
pub struct ChannelPool {
    resolver: Box<dyn Resolver>,
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    idle: HashMap<String, Vec<Channel>>,
    live: HashMap<String, usize>,
    config: PoolConfig,
}

impl ChannelPool {
    pub fn new(config: PoolConfig) -> Self {
        Self::with_resolver(Box::new(SocketDirResolver::from_env()), config)
    }

    pub fn with_resolver(resolver: Box<dyn Resolver>, config: PoolConfig) -> Self {
        ChannelPool {
            resolver,
            inner: Mutex::new(PoolInner {
                idle: HashMap::new(),
                live: HashMap::new(),
                config,
            }),
        }
    }

    /// Acquires a channel to `name`, reusing an idle one when possible.
    pub fn acquire(&self, name: &str) -> Result<Channel> {
        let start = Instant::now();
        let (acquire_timeout, options) = {
            let inner = self.lock();
            (inner.config.acquire_timeout, inner.config.options.clone())
        };

        loop {
            {
                let mut inner = self.lock();

                if let Some(channel) = inner.idle.get_mut(name).and_then(Vec::pop) {
                    return Ok(channel);
                }

                let live = inner.live.get(name).copied().unwrap_or(0);
                if live < inner.config.max_channels {
                    // reserve the slot before connecting without the lock
                    *inner.live.entry(name.to_string()).or_insert(0) += 1;
                    break;
                }
            }

            if start.elapsed() >= acquire_timeout {
                return Err(PeercallError::Timeout(acquire_timeout.as_millis() as u64));
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        match Channel::connect_with(name, self.resolver.as_ref(), options) {
            Ok(channel) => Ok(channel),
            Err(e) => {
                let mut inner = self.lock();
                if let Some(live) = inner.live.get_mut(name) {
                    *live = live.saturating_sub(1);
                }
                Err(e)
            }
        }
    }

    /// Returns a channel to the pool. A closed channel is not retained;
    /// its slot is freed instead.
    pub fn release(&self, channel: Channel) {
        let mut inner = self.lock();
        let name = channel.name().to_string();
        if channel.is_connected() {
            inner.idle.entry(name).or_default().push(channel);
        } else if let Some(live) = inner.live.get_mut(&name) {
            *live = live.saturating_sub(1);
        }
    }

    /// Idle channels currently held for `name`.
    pub fn idle_count(&self, name: &str) -> usize {
        self.lock().idle.get(name).map(Vec::len).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_channels, 8);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_acquire_unregistered_name_fails_and_frees_slot() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SocketDirResolver::new(dir.path());
        let pool = ChannelPool::with_resolver(Box::new(resolver), PoolConfig::default());

        for _ in 0..20 {
            let err = pool.acquire("ghost").unwrap_err();
            assert!(matches!(err, PeercallError::EndpointNotFound(_)));
        }
        // failed connects released their reserved slots, so this stayed at 0
        assert_eq!(pool.idle_count("ghost"), 0);
    }

    #[test]
    fn test_idle_count_starts_empty() {
        let pool = ChannelPool::new(PoolConfig::default());
        assert_eq!(pool.idle_count("anything"), 0);
    }
}
