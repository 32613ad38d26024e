//! Slot types for magicboot
//!
//! A slot is a unit of behavior invoked by name through the dispatch
//! registry, analogous to a registered RPC method. Slots come in a
//! synchronous and an asynchronous flavor; both execute against a mutable
//! instruction-tree node and leave their result in it.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{MagicError, Result};
use crate::script::Node;

/// A synchronous command handler.
pub trait Slot: Send + Sync {
    /// Execute against the invocation payload. The slot may rewrite `args`
    /// in place; whatever it leaves behind is the invocation result.
    fn execute(&self, args: &mut Node) -> Result<()>;
}

/// An asynchronous command handler.
#[async_trait]
pub trait AsyncSlot: Send + Sync {
    /// Execute against the invocation payload, awaiting external
    /// collaborators as needed.
    async fn execute(&self, args: &mut Node) -> Result<()>;
}

/// Whether a slot executes synchronously or asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Sync,
    Async,
}

/// Produces a fresh handler instance for every dispatch.
///
/// Handlers are request-scoped: the registry never reuses an instance
/// across invocations, so slot implementations are free to keep per-call
/// state in `&mut self`-less fields without synchronization concerns.
pub enum SlotFactory {
    /// Factory for a synchronous handler.
    Sync(Box<dyn Fn() -> Box<dyn Slot> + Send + Sync>),
    /// Factory for an asynchronous handler.
    Async(Box<dyn Fn() -> Box<dyn AsyncSlot> + Send + Sync>),
}

impl SlotFactory {
    /// Wrap a closure producing a synchronous slot.
    pub fn sync<S, F>(factory: F) -> Self
    where
        S: Slot + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        SlotFactory::Sync(Box::new(move || Box::new(factory())))
    }

    /// Wrap a closure producing an asynchronous slot.
    pub fn asynchronous<S, F>(factory: F) -> Self
    where
        S: AsyncSlot + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        SlotFactory::Async(Box::new(move || Box::new(factory())))
    }

    /// The execution kind of slots this factory produces.
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotFactory::Sync(_) => SlotKind::Sync,
            SlotFactory::Async(_) => SlotKind::Async,
        }
    }
}

impl std::fmt::Debug for SlotFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SlotFactory").field(&self.kind()).finish()
    }
}

/// Identity of a discovered slot: its registered name, execution kind, and
/// the provider module that contributed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotDescriptor {
    /// Name the slot answers to.
    pub name: String,
    /// Synchronous or asynchronous execution.
    pub kind: SlotKind,
    /// Name of the provider that registered the slot.
    pub provider: String,
}

static SLOT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9._-]{0,127}$").expect("valid slot name pattern"));

/// Validate a slot name.
///
/// Names are 1-128 characters, start with a letter, and may contain
/// letters, digits, dots, underscores, and hyphens. Dots conventionally
/// namespace slots by feature (`db.mysql.create`).
pub fn validate_slot_name(name: &str) -> Result<()> {
    if SLOT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(MagicError::Config(format!(
            "Invalid slot name '{}': must be 1-128 characters, start with a letter, \
             and contain only letters, digits, dots, underscores, and hyphens",
            name
        )))
    }
}
