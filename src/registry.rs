//! Routing layer: maps string identifiers to driver instances and forwards
//! high-level calls.
//!
//! Identifiers are validated once, at [`DriverId`] construction — ASCII
//! alphabetic, non-empty — so the registry itself never deals in malformed
//! keys. Lookups against unknown identifiers return an explicit
//! [`RegistryError::DriverNotFound`], never a null capability.

use crate::driver::{DriverError, ImageDriver};
use crate::params::{Constraint, FlipDirection, Offset};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid driver identifier {0:?}: identifiers are alphabetic")]
    InvalidIdentifier(String),
    #[error("no driver registered as {0:?}")]
    DriverNotFound(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// A validated driver identifier: non-empty, ASCII alphabetic only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverId(String);

impl DriverId {
    pub fn new(id: impl Into<String>) -> Result<Self, RegistryError> {
        let id = id.into();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RegistryError::InvalidIdentifier(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds registered drivers and routes operations to them by identifier.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<DriverId, Box<dyn ImageDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under an identifier, replacing any previous entry.
    pub fn register(&mut self, id: DriverId, driver: Box<dyn ImageDriver>) -> &mut Self {
        self.drivers.insert(id, driver);
        self
    }

    pub fn contains(&self, id: &DriverId) -> bool {
        self.drivers.contains_key(id)
    }

    pub fn driver(&self, id: &DriverId) -> Option<&dyn ImageDriver> {
        self.drivers.get(id).map(|driver| driver.as_ref())
    }

    pub fn driver_mut(&mut self, id: &DriverId) -> Option<&mut (dyn ImageDriver + 'static)> {
        self.drivers.get_mut(id).map(|driver| driver.as_mut())
    }

    fn resolve(&mut self, id: &DriverId) -> Result<&mut Box<dyn ImageDriver>, RegistryError> {
        self.drivers
            .get_mut(id)
            .ok_or_else(|| RegistryError::DriverNotFound(id.to_string()))
    }

    // High-level forwarding: resolve the driver, delegate the operation.

    pub fn resize(
        &mut self,
        id: &DriverId,
        width: Option<u32>,
        height: Option<u32>,
        constraint: Constraint,
    ) -> Result<(), RegistryError> {
        self.resolve(id)?.resize(width, height, constraint)?;
        Ok(())
    }

    pub fn crop(
        &mut self,
        id: &DriverId,
        width: u32,
        height: u32,
        offset_x: Offset,
        offset_y: Offset,
    ) -> Result<(), RegistryError> {
        self.resolve(id)?.crop(width, height, offset_x, offset_y)?;
        Ok(())
    }

    pub fn rotate(&mut self, id: &DriverId, degrees: i32) -> Result<(), RegistryError> {
        self.resolve(id)?.rotate(degrees)?;
        Ok(())
    }

    pub fn flip(&mut self, id: &DriverId, direction: FlipDirection) -> Result<(), RegistryError> {
        self.resolve(id)?.flip(direction)?;
        Ok(())
    }

    pub fn save(
        &mut self,
        id: &DriverId,
        path: Option<&Path>,
        quality: u32,
    ) -> Result<(), RegistryError> {
        self.resolve(id)?.save(path, quality)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tests::MockDriver;

    #[test]
    fn identifier_must_be_alphabetic() {
        assert!(DriverId::new("raster").is_ok());
        assert!(DriverId::new("Warp").is_ok());
        assert!(matches!(
            DriverId::new("gd2"),
            Err(RegistryError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            DriverId::new("ras ter"),
            Err(RegistryError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            DriverId::new(""),
            Err(RegistryError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn lookup_unknown_driver_is_explicit() {
        let mut registry = DriverRegistry::new();
        let id = DriverId::new("missing").unwrap();
        assert!(registry.driver(&id).is_none());
        assert!(matches!(
            registry.rotate(&id, 90),
            Err(RegistryError::DriverNotFound(_))
        ));
    }

    #[test]
    fn forwarding_reaches_registered_driver() {
        let mut registry = DriverRegistry::new();
        let id = DriverId::new("mock").unwrap();
        registry.register(id.clone(), Box::new(MockDriver::new(1000, 500)));

        registry
            .resize(&id, Some(100), None, Constraint::Auto)
            .unwrap();
        registry.rotate(&id, 90).unwrap();

        let driver = registry.driver(&id).unwrap();
        assert_eq!(driver.handle().dimensions(), (100, 50));
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = DriverRegistry::new();
        let id = DriverId::new("mock").unwrap();
        registry.register(id.clone(), Box::new(MockDriver::new(10, 10)));
        registry.register(id.clone(), Box::new(MockDriver::new(20, 20)));

        assert_eq!(registry.driver(&id).unwrap().handle().dimensions(), (20, 20));
    }

    #[test]
    fn driver_errors_propagate_through_forwarding() {
        let mut registry = DriverRegistry::new();
        let id = DriverId::new("mock").unwrap();
        registry.register(id.clone(), Box::new(MockDriver::new(10, 10)));

        let result = registry
            .resolve(&id)
            .unwrap()
            .sharpen(50)
            .map_err(RegistryError::from);
        assert!(matches!(
            result,
            Err(RegistryError::Driver(DriverError::Unsupported { .. }))
        ));
    }

    #[test]
    fn forwarded_operations_update_handle() {
        let mut registry = DriverRegistry::new();
        let id = DriverId::new("mock").unwrap();
        registry.register(id.clone(), Box::new(MockDriver::new(100, 100)));

        registry
            .crop(&id, 50, 50, Offset::Center, Offset::Center)
            .unwrap();
        registry.flip(&id, FlipDirection::Vertical).unwrap();
        registry.save(&id, None, 80).unwrap();

        let driver = registry.driver(&id).unwrap();
        assert_eq!(driver.handle().dimensions(), (50, 50));
    }
}
