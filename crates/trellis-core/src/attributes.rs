//! Keyed singleton storage for installed features.
//!
//! Each pipeline owns one [`Attributes`] store mapping a feature's
//! [`AttributeKey`] to its installed instance. A key is an explicit token
//! passed to install/get/remove — store identity is the pair of the value's
//! `TypeId` and the key's name, so two keys that happen to share a name but
//! carry different types never collide, and equality is never decided by the
//! name string alone.
//!
//! Duplicate installation under one key is rejected, not replaced (see
//! DESIGN.md). Entries are removed only when the owning pipeline is torn
//! down, or explicitly via [`Attributes::remove`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{InstallError, InstallResult};

/// A typed, named token identifying one feature slot in an [`Attributes`]
/// store.
///
/// Keys are declared once per feature as `'static` constants and passed
/// explicitly wherever the feature instance is installed or looked up:
///
/// ```rust,ignore
/// static KEY: AttributeKey<CallLogging> = AttributeKey::new("call-logging");
/// ```
pub struct AttributeKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> AttributeKey<T> {
    /// Creates a key with the given human-readable name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key's human-readable name, used in error messages and logs.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn id(&self) -> (TypeId, &'static str) {
        (TypeId::of::<T>(), self.name)
    }
}

impl<T> std::fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AttributeKey").field(&self.name).finish()
    }
}

/// The per-pipeline feature-instance store.
///
/// Reads vastly outnumber writes: the map is populated during installation
/// and read-mostly afterwards, so a `RwLock` over a plain `HashMap` is
/// enough. Lookups and installs for distinct keys are independent.
#[derive(Default)]
pub struct Attributes {
    entries: RwLock<HashMap<(TypeId, &'static str), Arc<dyn Any + Send + Sync>>>,
}

impl Attributes {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`.
    ///
    /// Fails with [`InstallError::DuplicateFeature`] when the key is already
    /// occupied; the existing instance is left untouched.
    pub fn insert<T: Send + Sync + 'static>(
        &self,
        key: &AttributeKey<T>,
        value: Arc<T>,
    ) -> InstallResult<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&key.id()) {
            return Err(InstallError::DuplicateFeature(key.name));
        }
        entries.insert(key.id(), value);
        Ok(())
    }

    /// Returns the instance stored under `key`, if any.
    pub fn get<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let entry = Arc::clone(entries.get(&key.id())?);
        entry.downcast::<T>().ok()
    }

    /// Returns `true` if an instance is stored under `key`.
    pub fn contains<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> bool {
        self.entries.read().contains_key(&key.id())
    }

    /// Removes and returns the instance stored under `key`.
    pub fn remove<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Option<Arc<T>> {
        let entry = self.entries.write().remove(&key.id())?;
        entry.downcast::<T>().ok()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attributes")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Red(u32);
    struct Blue(u32);

    static RED: AttributeKey<Red> = AttributeKey::new("color");
    static BLUE: AttributeKey<Blue> = AttributeKey::new("color");
    static OTHER_RED: AttributeKey<Red> = AttributeKey::new("other");

    #[test]
    fn insert_then_get_round_trips() {
        let attributes = Attributes::new();
        attributes.insert(&RED, Arc::new(Red(7))).unwrap();
        assert_eq!(attributes.get(&RED).unwrap().0, 7);
        assert!(attributes.contains(&RED));
    }

    #[test]
    fn duplicate_key_is_rejected_and_keeps_original() {
        let attributes = Attributes::new();
        attributes.insert(&RED, Arc::new(Red(1))).unwrap();
        let err = attributes.insert(&RED, Arc::new(Red(2))).unwrap_err();
        assert!(matches!(err, InstallError::DuplicateFeature("color")));
        assert_eq!(attributes.get(&RED).unwrap().0, 1);
    }

    #[test]
    fn same_name_different_type_is_a_different_key() {
        let attributes = Attributes::new();
        attributes.insert(&RED, Arc::new(Red(1))).unwrap();
        attributes.insert(&BLUE, Arc::new(Blue(2))).unwrap();
        assert_eq!(attributes.get(&RED).unwrap().0, 1);
        assert_eq!(attributes.get(&BLUE).unwrap().0, 2);
    }

    #[test]
    fn distinct_keys_are_independent() {
        let attributes = Attributes::new();
        attributes.insert(&RED, Arc::new(Red(1))).unwrap();
        attributes.insert(&OTHER_RED, Arc::new(Red(2))).unwrap();

        assert_eq!(attributes.remove(&RED).unwrap().0, 1);
        assert!(!attributes.contains(&RED));
        assert_eq!(attributes.get(&OTHER_RED).unwrap().0, 2);
    }

    #[test]
    fn get_on_missing_key_is_none() {
        let attributes = Attributes::new();
        assert!(attributes.get(&RED).is_none());
        assert!(attributes.remove(&RED).is_none());
    }
}
