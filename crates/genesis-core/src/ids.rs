use crate::time::Clock;
use uuid::Uuid;

/// `{prefix}_{unix_millis}_{6 hex chars}`, e.g. `node_1735786800000_3fa9c1`.
pub fn generate_id(prefix: &str, clock: &Clock) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}_{}", clock.unix_millis(), &hex[..6])
}
