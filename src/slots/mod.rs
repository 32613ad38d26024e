//! Slot system for magicboot
//!
//! This module provides the command-handler ("slot") layer: handler traits,
//! per-dispatch factories, the sealed dispatch registry, and the explicit
//! discovery step that builds the registry from feature-module providers.
//!
//! # Architecture
//!
//! - **types**: `Slot`/`AsyncSlot` traits, `SlotFactory`, `SlotDescriptor`
//! - **registry**: name-to-factory mapping with collision detection
//! - **discovery**: `SlotProvider` enumeration and `ModulePolicy` filtering
//!
//! # Usage
//!
//! ```rust
//! use magicboot::slots::{discover_slots, ModulePolicy, SlotProvider, SlotRegistry, SlotFactory, Slot};
//! use magicboot::script::Node;
//!
//! struct MathModule;
//!
//! struct Add;
//! impl Slot for Add {
//!     fn execute(&self, args: &mut Node) -> magicboot::error::Result<()> {
//!         let sum: i64 = args.children.iter()
//!             .filter_map(|c| c.value.as_ref().and_then(|v| v.as_i64()))
//!             .sum();
//!         args.children.clear();
//!         args.value = Some(sum.into());
//!         Ok(())
//!     }
//! }
//!
//! impl SlotProvider for MathModule {
//!     fn name(&self) -> &str { "math" }
//!     fn register(&self, registry: &mut SlotRegistry) -> magicboot::error::Result<()> {
//!         registry.register("math.add", "math", SlotFactory::sync(|| Add))
//!     }
//! }
//!
//! let report = discover_slots(&[&MathModule], &ModulePolicy::default());
//! assert!(report.registry.contains("math.add"));
//! ```

pub mod discovery;
pub mod registry;
pub mod types;

pub use discovery::{discover_slots, DiscoveryReport, ModulePolicy, SkippedModule, SlotProvider};
pub use registry::SlotRegistry;
pub use types::{validate_slot_name, AsyncSlot, Slot, SlotDescriptor, SlotFactory, SlotKind};
