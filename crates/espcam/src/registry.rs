// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! The camera peripheral can only be driven by one device at a time. A
//! [`DeviceRegistry`] hands out a single [`DeviceLease`]; a device must hold
//! it to be active and gives it back on deinit or drop.

use crate::Error;
use std::cell::Cell;

/// Issues at most one outstanding [`DeviceLease`].
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    held: Cell<bool>,
    issued: Cell<u64>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease. Fails with `InvalidState` while another device holds
    /// it.
    pub fn acquire(&self) -> Result<DeviceLease<'_>, Error> {
        if self.held.get() {
            return Err(Error::InvalidState(
                "another camera device is already active".to_string(),
            ));
        }
        let id = self.issued.get() + 1;
        self.issued.set(id);
        self.held.set(true);
        log::debug!("camera lease {} acquired", id);
        Ok(DeviceLease { registry: self, id })
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

/// Proof of being the one active device. Released on drop.
#[derive(Debug)]
pub struct DeviceLease<'r> {
    registry: &'r DeviceRegistry,
    id: u64,
}

impl DeviceLease<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for DeviceLease<'_> {
    fn drop(&mut self) {
        log::debug!("camera lease {} released", self.id);
        self.registry.held.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_lease() {
        let registry = DeviceRegistry::new();
        let lease = registry.acquire().unwrap();
        assert!(registry.is_held());
        assert!(matches!(registry.acquire(), Err(Error::InvalidState(_))));

        drop(lease);
        assert!(!registry.is_held());

        let again = registry.acquire().unwrap();
        assert_eq!(again.id(), 2);
    }
}
