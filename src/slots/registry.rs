//! Dispatch registry for magicboot
//!
//! The `SlotRegistry` maps slot names to handler factories. It is built
//! once during discovery, then shared read-only (typically behind an `Arc`)
//! by every component that dispatches commands for the remainder of the
//! process lifetime. Concurrent reads need no synchronization because the
//! registry is never mutated after construction.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{MagicError, Result};
use crate::script::Node;

use super::types::{validate_slot_name, SlotDescriptor, SlotFactory, SlotKind};

struct Registered {
    factory: SlotFactory,
    provider: String,
}

/// Read-only mapping from slot name to handler factory.
///
/// Exactly one factory answers a given name. Registering a name twice is a
/// configuration error, never resolved silently: the registry reports the
/// collision and keeps the first registration.
///
/// # Example
///
/// ```rust
/// use magicboot::script::Node;
/// use magicboot::slots::{Slot, SlotFactory, SlotRegistry};
///
/// struct Ping;
/// impl Slot for Ping {
///     fn execute(&self, args: &mut Node) -> magicboot::error::Result<()> {
///         args.set("pong", true);
///         Ok(())
///     }
/// }
///
/// let mut registry = SlotRegistry::new();
/// registry.register("ping", "core", SlotFactory::sync(|| Ping)).unwrap();
///
/// let mut args = Node::default();
/// registry.signal_sync("ping", &mut args).unwrap();
/// assert_eq!(args.get("pong").unwrap().value_bool(), Some(true));
/// ```
pub struct SlotRegistry {
    slots: HashMap<String, Registered>,
}

impl SlotRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Register a factory under a slot name.
    ///
    /// Validates the name and rejects duplicates. On a collision the
    /// existing registration is kept and an error naming both providers is
    /// returned.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: impl Into<String>,
        factory: SlotFactory,
    ) -> Result<()> {
        let name = name.into();
        let provider = provider.into();
        validate_slot_name(&name)?;

        if let Some(existing) = self.slots.get(&name) {
            return Err(MagicError::Collision(format!(
                "slot '{}' from provider '{}' is already registered by provider '{}'",
                name, provider, existing.provider
            )));
        }

        debug!(slot = %name, provider = %provider, kind = ?factory.kind(), "Registered slot");
        self.slots.insert(name, Registered { factory, provider });
        Ok(())
    }

    /// Dispatch an invocation, awaiting asynchronous handlers.
    ///
    /// A fresh handler instance is created for every call.
    pub async fn signal(&self, name: &str, args: &mut Node) -> Result<()> {
        let registered = self.lookup(name)?;
        match &registered.factory {
            SlotFactory::Sync(make) => make().execute(args),
            SlotFactory::Async(make) => make().execute(args).await,
        }
    }

    /// Dispatch an invocation without awaiting.
    ///
    /// Only synchronous slots can be reached this way; dispatching an
    /// asynchronous slot is a dispatch error.
    pub fn signal_sync(&self, name: &str, args: &mut Node) -> Result<()> {
        let registered = self.lookup(name)?;
        match &registered.factory {
            SlotFactory::Sync(make) => make().execute(args),
            SlotFactory::Async(_) => Err(MagicError::Dispatch(format!(
                "slot '{}' is asynchronous and cannot be signaled synchronously",
                name
            ))),
        }
    }

    /// Whether a slot name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Execution kind of a registered slot.
    pub fn kind_of(&self, name: &str) -> Option<SlotKind> {
        self.slots.get(name).map(|r| r.factory.kind())
    }

    /// Provider that registered a slot.
    pub fn provider_of(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(|r| r.provider.as_str())
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Descriptors for every registered slot, sorted by name.
    pub fn descriptors(&self) -> Vec<SlotDescriptor> {
        let mut out: Vec<SlotDescriptor> = self
            .slots
            .iter()
            .map(|(name, registered)| SlotDescriptor {
                name: name.clone(),
                kind: registered.factory.kind(),
                provider: registered.provider.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn lookup(&self, name: &str) -> Result<&Registered> {
        self.slots
            .get(name)
            .ok_or_else(|| MagicError::NotFound(format!("slot '{}'", name)))
    }

    /// Tear the registry down into its raw entries. Used by discovery to
    /// merge per-provider staging registries into the final one.
    pub(crate) fn into_parts(self) -> Vec<(String, String, SlotFactory)> {
        self.slots
            .into_iter()
            .map(|(name, registered)| (name, registered.provider, registered.factory))
            .collect()
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
