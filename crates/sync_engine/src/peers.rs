//! Peer motor drivers the synchronizer advances every tick.

use std::collections::HashMap;

use contracts::{JointSlot, PeerDriver, PeerNames};
use tracing::error;

use crate::SyncError;

/// Drivers available to the deployment, looked up by name.
#[derive(Default)]
pub struct PeerRegistry {
    drivers: HashMap<String, Box<dyn PeerDriver>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its own name, replacing any previous one.
    pub fn register(&mut self, driver: Box<dyn PeerDriver>) -> Option<Box<dyn PeerDriver>> {
        self.drivers.insert(driver.name().to_string(), driver)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn take(&mut self, name: &str) -> Option<Box<dyn PeerDriver>> {
        self.drivers.remove(name)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// The yaw, pitch and roll motor drivers, in slot order.
pub struct PeerSet {
    drivers: [Box<dyn PeerDriver>; 3],
}

impl PeerSet {
    /// Take the three named peers out of `registry`.
    ///
    /// Fails on the first absent peer in yaw, pitch, roll order and leaves
    /// the registry untouched in that case.
    pub fn resolve(registry: &mut PeerRegistry, names: &PeerNames) -> Result<Self, SyncError> {
        for slot in JointSlot::ALL {
            let name = names.get(slot);
            if !registry.contains(name) {
                error!(peer = name, joint = %slot, "No {name} peer");
                return Err(SyncError::missing_peer(name));
            }
        }

        let mut take = |slot: JointSlot| {
            let name = names.get(slot);
            registry
                .take(name)
                .ok_or_else(|| SyncError::missing_peer(name))
        };
        Ok(Self {
            drivers: [
                take(JointSlot::Yaw)?,
                take(JointSlot::Pitch)?,
                take(JointSlot::Roll)?,
            ],
        })
    }

    pub fn from_drivers(drivers: [Box<dyn PeerDriver>; 3]) -> Self {
        Self { drivers }
    }

    /// Advance every peer once.
    pub fn update_all(&mut self) {
        for driver in &mut self.drivers {
            driver.update();
        }
    }

    pub fn names(&self) -> [&str; 3] {
        [
            self.drivers[0].name(),
            self.drivers[1].name(),
            self.drivers[2].name(),
        ]
    }

    pub fn into_drivers(self) -> [Box<dyn PeerDriver>; 3] {
        self.drivers
    }
}

impl std::fmt::Debug for PeerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PeerSet").field(&self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedPeer(&'static str);

    impl PeerDriver for NamedPeer {
        fn name(&self) -> &str {
            self.0
        }

        fn update(&mut self) {}
    }

    fn registry_with(names: &[&'static str]) -> PeerRegistry {
        let mut registry = PeerRegistry::new();
        for name in names {
            registry.register(Box::new(NamedPeer(name)));
        }
        registry
    }

    #[test]
    fn test_resolve_takes_peers_in_slot_order() {
        let mut registry = registry_with(&["roll_motor_r", "yaw_motor_r", "pitch_motor_r", "spare"]);

        let peers = PeerSet::resolve(&mut registry, &PeerNames::default()).unwrap();

        assert_eq!(peers.names(), ["yaw_motor_r", "pitch_motor_r", "roll_motor_r"]);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("spare"));
    }

    #[test]
    fn test_missing_peer_fails_start() {
        let mut registry = registry_with(&["yaw_motor_r", "roll_motor_r"]);

        let err = PeerSet::resolve(&mut registry, &PeerNames::default()).unwrap_err();

        assert!(matches!(&err, SyncError::MissingPeer { name } if name == "pitch_motor_r"));
        assert_eq!(err.to_string(), "no pitch_motor_r peer");
        // Nothing was taken
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_missing_peer_reported() {
        let mut registry = PeerRegistry::new();
        let err = PeerSet::resolve(&mut registry, &PeerNames::default()).unwrap_err();
        assert_eq!(err.to_string(), "no yaw_motor_r peer");
    }
}
