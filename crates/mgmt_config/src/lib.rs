//! Tunables for every coordinator component, each with a documented
//! default and a `dump()` for operator-facing reference output. Actual
//! loading from a config file or CLI flags is an external concern
//! (spec §1 Non-goals) and is not implemented here.

pub mod dumping;

use std::collections::BTreeMap;
use std::time::Duration;

use dumping::{append_sub_config_name, ser_param, ParamPath, SerializeConfig, SerializedParam};
use serde::{Deserialize, Serialize};
use validator::Validate;

const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 180;
const DEFAULT_CHANNEL_CAPACITY: usize = 128;
const DEFAULT_RETRIES: usize = 3;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 3;
const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 30;

/// Tunables for `mgmt_lock::LockService` (spec §4.3, §9 "the implementation
/// must expose it as a tunable").
#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
pub struct LockServiceConfig {
    /// Seconds a lock is held before its auto-release timer fires.
    #[validate(range(min = 1))]
    pub lock_timeout_secs: u64,
}

impl LockServiceConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

impl Default for LockServiceConfig {
    fn default() -> Self {
        Self { lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS }
    }
}

impl SerializeConfig for LockServiceConfig {
    fn dump(&self) -> BTreeMap<ParamPath, SerializedParam> {
        BTreeMap::from_iter([ser_param(
            "lock_timeout_secs",
            &self.lock_timeout_secs,
            "Seconds a granted lock is held before its auto-release timer fires.",
        )])
    }
}

/// Tunables for `mgmt_runtime::Runtime` (spec §4.1).
#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
pub struct RuntimeConfig {
    /// Number of worker threads; `None` defers to the host's parallelism.
    pub worker_threads: Option<usize>,
    #[validate(range(min = 1))]
    pub notify_channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { worker_threads: None, notify_channel_capacity: DEFAULT_CHANNEL_CAPACITY }
    }
}

impl SerializeConfig for RuntimeConfig {
    fn dump(&self) -> BTreeMap<ParamPath, SerializedParam> {
        BTreeMap::from_iter([
            ser_param(
                "worker_threads",
                &self.worker_threads,
                "Number of scheduler worker threads; unset defers to host parallelism.",
            ),
            ser_param(
                "notify_channel_capacity",
                &self.notify_channel_capacity,
                "Buffer size for the task completion notification channel.",
            ),
        ])
    }
}

/// Tunables for `mgmt_rpc` channels and retries.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
pub struct RpcConfig {
    #[validate(range(min = 1))]
    pub channel_capacity: usize,
    pub retries: usize,
    pub retry_interval_secs: u64,
}

impl RpcConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            retries: DEFAULT_RETRIES,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

impl SerializeConfig for RpcConfig {
    fn dump(&self) -> BTreeMap<ParamPath, SerializedParam> {
        BTreeMap::from_iter([
            ser_param(
                "channel_capacity",
                &self.channel_capacity,
                "Buffer size of the request channel backing each loopback peer connection.",
            ),
            ser_param("retries", &self.retries, "Max retries for a single RPC call."),
            ser_param(
                "retry_interval_secs",
                &self.retry_interval_secs,
                "Delay between RPC retries, in seconds.",
            ),
        ])
    }
}

/// Tunables for `mgmt_dispatch::DispatchEngine`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
pub struct DispatchConfig {
    #[validate(range(min = 1))]
    pub phase_timeout_secs: u64,
    #[validate(nested)]
    pub lock_service: LockServiceConfig,
    #[validate(nested)]
    pub rpc: RpcConfig,
}

impl DispatchConfig {
    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            phase_timeout_secs: DEFAULT_PHASE_TIMEOUT_SECS,
            lock_service: LockServiceConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl SerializeConfig for DispatchConfig {
    fn dump(&self) -> BTreeMap<ParamPath, SerializedParam> {
        let mut config = BTreeMap::from_iter([ser_param(
            "phase_timeout_secs",
            &self.phase_timeout_secs,
            "Per-peer timeout for a single remote phase RPC, in seconds.",
        )]);
        config.extend(append_sub_config_name(self.lock_service.dump(), "lock_service"));
        config.extend(append_sub_config_name(self.rpc.dump(), "rpc"));
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lock_timeout_matches_spec() {
        assert_eq!(LockServiceConfig::default().lock_timeout_secs, 180);
    }

    #[test]
    fn dispatch_config_dump_namespaces_sub_configs() {
        let dump = DispatchConfig::default().dump();
        assert!(dump.contains_key("lock_service.lock_timeout_secs"));
        assert!(dump.contains_key("rpc.retries"));
    }

    #[test]
    fn validate_rejects_zero_lock_timeout() {
        let config = LockServiceConfig { lock_timeout_secs: 0 };
        assert!(config.validate().is_err());
    }
}
