use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

/// A flattened parameter path, e.g. `"lock_service.lock_timeout_secs"`.
pub type ParamPath = String;

/// A single documented configuration parameter: its default value and a
/// human-readable description, the way an operator-facing `--help` or
/// generated reference doc would present it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SerializedParam {
    pub description: String,
    pub value: Value,
}

/// Self-documenting configuration, trimmed from the teacher's
/// `apollo_config::dumping::SerializeConfig` down to the flattened
/// name/description/default-value surface the coordinator actually needs.
/// CLI parsing and config-file loading (the rest of `apollo_config`) are out
/// of scope per spec §1.
pub trait SerializeConfig {
    fn dump(&self) -> BTreeMap<ParamPath, SerializedParam>;
}

/// Builds one dumped parameter entry. Mirrors `apollo_config::dumping::ser_param`.
pub fn ser_param<T: Serialize>(name: &str, value: &T, description: &str) -> (ParamPath, SerializedParam) {
    (name.to_string(), SerializedParam { description: description.to_string(), value: json!(value) })
}

/// Prefixes every key of a sub-config's dump with `sub_name.`, mirroring
/// `apollo_config::dumping::append_sub_config_name`, used when a top-level
/// config embeds another `SerializeConfig` (e.g. `DispatchConfig` embedding
/// `LockServiceConfig`).
pub fn append_sub_config_name(
    sub_dump: BTreeMap<ParamPath, SerializedParam>,
    sub_name: &str,
) -> BTreeMap<ParamPath, SerializedParam> {
    sub_dump.into_iter().map(|(key, value)| (format!("{sub_name}.{key}"), value)).collect()
}
