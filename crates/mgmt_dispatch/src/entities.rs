use mgmt_common::{keys, Dict, EntityKey, EntityType};

use crate::error::DispatchError;

const ENTITY_TYPES: [EntityType; 3] = [EntityType::Volume, EntityType::Snapshot, EntityType::Global];

/// Reads the `hold_<type>_locks` / `<type>count` / `<type>name<N>` keys
/// (spec §6) into the set of entities this transaction must lock, honoring
/// each type's default-locked policy unless the dictionary overrides it.
pub fn entities_to_lock(dict: &Dict) -> Result<Vec<EntityKey>, DispatchError> {
    let mut entities = Vec::new();
    for entity_type in ENTITY_TYPES {
        let should_lock =
            dict.get_bool(&keys::hold_locks(entity_type)).unwrap_or_else(|| entity_type.default_locked_per_transaction());
        if !should_lock {
            continue;
        }
        let count = dict.get_i64(&keys::count(entity_type)).unwrap_or(0);
        for index in 1..=count {
            let name = dict.get_str(&keys::name(entity_type, index as usize)).ok_or_else(|| {
                DispatchError::MalformedInput(format!(
                    "{}count={} but {} is missing",
                    entity_type.as_str(),
                    count,
                    keys::name(entity_type, index as usize)
                ))
            })?;
            entities.push(EntityKey::new(entity_type, name));
        }
    }
    Ok(entities)
}
