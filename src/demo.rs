//! Demo slot providers.
//!
//! The real `evaluate` slot belongs to the host runtime's interpreter,
//! which lives outside this crate. For the CLI and for smoke-testing a
//! files hierarchy, this module provides a tracing-only evaluator that
//! logs each top-level instruction of a dispatched script without
//! evaluating anything.

use tracing::info;

use crate::error::Result;
use crate::script::Node;
use crate::slots::{Slot, SlotFactory, SlotProvider, SlotRegistry};

/// `evaluate` implementation that logs instructions instead of running them.
struct TraceEvaluate;

impl Slot for TraceEvaluate {
    fn execute(&self, args: &mut Node) -> Result<()> {
        for child in &args.children {
            match &child.value {
                Some(value) => info!(instruction = %child.name, value = %value, "evaluate"),
                None => info!(instruction = %child.name, "evaluate"),
            }
        }
        args.set("instructions", args.children.len());
        Ok(())
    }
}

/// Provider registering the tracing evaluator under `evaluate`.
pub struct TraceModule;

impl SlotProvider for TraceModule {
    fn name(&self) -> &str {
        "trace"
    }

    fn register(&self, registry: &mut SlotRegistry) -> Result<()> {
        registry.register("evaluate", "trace", SlotFactory::sync(|| TraceEvaluate))
    }
}
