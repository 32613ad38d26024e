//! Slot discovery for magicboot
//!
//! Discovery turns an explicit list of feature-module providers into the
//! process-wide dispatch registry. There is no runtime scanning: every
//! module that contributes slots exposes a [`SlotProvider`], and the host
//! application hands the full provider list to [`discover_slots`] during
//! service wiring, before anything is allowed to dispatch.
//!
//! A provider whose registration fails is skipped with an error-level log;
//! the remaining providers still register. One broken feature module
//! disables its own slots, never the whole process start. Slot-name
//! collisions across providers are reported the same way and the first
//! registration wins.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::registry::SlotRegistry;
use crate::error::Result;

/// A feature module that contributes slots to the dispatch registry.
///
/// Implementations are plain statics or unit structs in each feature
/// module; the host application enumerates them explicitly.
pub trait SlotProvider: Send + Sync {
    /// Module name, used for policy filtering and collision reporting.
    fn name(&self) -> &str;

    /// Register this module's slots. Called once during discovery.
    fn register(&self, registry: &mut SlotRegistry) -> Result<()>;
}

/// Which provider modules are permitted to register slots.
///
/// Framework-internal modules are excluded by prefix; beyond that an
/// optional allow list and a block list apply, with the block list taking
/// precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulePolicy {
    /// Providers whose name starts with any of these prefixes are never
    /// scanned. Defaults to `["host."]`.
    pub blocked_prefixes: Vec<String>,

    /// Allowlist of provider names. If empty, all providers are allowed.
    pub allowed_modules: Vec<String>,

    /// Blocklist of provider names. Takes precedence over the allowlist.
    pub blocked_modules: Vec<String>,
}

impl Default for ModulePolicy {
    fn default() -> Self {
        Self {
            blocked_prefixes: default_blocked_prefixes(),
            allowed_modules: Vec::new(),
            blocked_modules: Vec::new(),
        }
    }
}

impl ModulePolicy {
    /// Check whether a provider name is permitted by this policy.
    pub fn is_module_permitted(&self, name: &str) -> bool {
        if self.blocked_prefixes.iter().any(|p| name.starts_with(p)) {
            return false;
        }
        if self.blocked_modules.iter().any(|m| m == name) {
            return false;
        }
        if self.allowed_modules.is_empty() {
            return true;
        }
        self.allowed_modules.iter().any(|m| m == name)
    }
}

fn default_blocked_prefixes() -> Vec<String> {
    vec!["host.".to_string()]
}

/// A provider that did not make it into the registry, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    /// Provider name.
    pub provider: String,
    /// Failure or policy description.
    pub reason: String,
}

/// Outcome of slot discovery.
pub struct DiscoveryReport {
    /// The populated dispatch registry. Wrap in `Arc` and share; it is
    /// read-only from here on.
    pub registry: SlotRegistry,

    /// Providers that failed to register and were skipped.
    pub skipped: Vec<SkippedModule>,

    /// Collision messages for slots whose name was already taken. The
    /// first registration of each name is the one in the registry.
    pub collisions: Vec<String>,
}

/// Build the dispatch registry from an explicit provider list.
///
/// Providers register in list order into a per-provider staging registry,
/// so a provider that fails halfway leaves nothing behind. Successful
/// staging registries merge into the final one in the same order.
pub fn discover_slots(
    providers: &[&dyn SlotProvider],
    policy: &ModulePolicy,
) -> DiscoveryReport {
    let mut registry = SlotRegistry::new();
    let mut skipped = Vec::new();
    let mut collisions = Vec::new();

    for provider in providers {
        let name = provider.name();

        if !policy.is_module_permitted(name) {
            info!(provider = %name, "Provider excluded by module policy");
            skipped.push(SkippedModule {
                provider: name.to_string(),
                reason: "excluded by module policy".to_string(),
            });
            continue;
        }

        let mut staging = SlotRegistry::new();
        match provider.register(&mut staging) {
            Ok(()) => {
                for (slot, slot_provider, factory) in staging.into_parts() {
                    if let Err(err) = registry.register(slot, slot_provider, factory) {
                        warn!(provider = %name, error = %err, "Slot collision, keeping first registration");
                        collisions.push(err.to_string());
                    }
                }
            }
            Err(err) => {
                error!(provider = %name, error = %err, "Provider registration failed, skipping");
                skipped.push(SkippedModule {
                    provider: name.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        providers = providers.len(),
        slots = registry.len(),
        skipped = skipped.len(),
        collisions = collisions.len(),
        "Slot discovery complete"
    );

    DiscoveryReport {
        registry,
        skipped,
        collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MagicError;
    use crate::script::Node;
    use crate::slots::types::{Slot, SlotFactory};

    struct Noop;

    impl Slot for Noop {
        fn execute(&self, _args: &mut Node) -> Result<()> {
            Ok(())
        }
    }

    /// Provider registering a fixed set of slot names.
    struct FixedProvider {
        name: &'static str,
        slots: Vec<&'static str>,
    }

    impl SlotProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn register(&self, registry: &mut SlotRegistry) -> Result<()> {
            for slot in &self.slots {
                registry.register(*slot, self.name, SlotFactory::sync(|| Noop))?;
            }
            Ok(())
        }
    }

    /// Provider that registers one slot and then fails.
    struct BrokenProvider;

    impl SlotProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn register(&self, registry: &mut SlotRegistry) -> Result<()> {
            registry.register("broken.first", "broken", SlotFactory::sync(|| Noop))?;
            Err(MagicError::Config("simulated init failure".to_string()))
        }
    }

    fn provider(name: &'static str, slots: &[&'static str]) -> FixedProvider {
        FixedProvider {
            name,
            slots: slots.to_vec(),
        }
    }

    #[test]
    fn test_discover_registers_all_permitted_providers() {
        let db = provider("db", &["db.connect", "db.read"]);
        let io = provider("io", &["io.file.load"]);

        let report = discover_slots(&[&db, &io], &ModulePolicy::default());

        assert_eq!(report.registry.len(), 3);
        assert!(report.registry.contains("db.connect"));
        assert!(report.registry.contains("io.file.load"));
        assert!(report.skipped.is_empty());
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn test_blocked_prefix_excluded() {
        let internal = provider("host.reflection", &["internal.slot"]);
        let app = provider("app", &["app.slot"]);

        let report = discover_slots(&[&internal, &app], &ModulePolicy::default());

        assert!(!report.registry.contains("internal.slot"));
        assert!(report.registry.contains("app.slot"));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].provider, "host.reflection");
    }

    #[test]
    fn test_blocklist_takes_precedence_over_allowlist() {
        let policy = ModulePolicy {
            allowed_modules: vec!["db".to_string()],
            blocked_modules: vec!["db".to_string()],
            ..Default::default()
        };
        assert!(!policy.is_module_permitted("db"));
    }

    #[test]
    fn test_allowlist_restricts_when_nonempty() {
        let policy = ModulePolicy {
            allowed_modules: vec!["db".to_string()],
            ..Default::default()
        };
        assert!(policy.is_module_permitted("db"));
        assert!(!policy.is_module_permitted("io"));
    }

    #[test]
    fn test_failing_provider_is_isolated() {
        let broken = BrokenProvider;
        let healthy = provider("healthy", &["healthy.slot"]);

        let report = discover_slots(&[&broken, &healthy], &ModulePolicy::default());

        // The failing provider leaves nothing behind, not even the slot it
        // registered before the failure.
        assert!(!report.registry.contains("broken.first"));
        assert!(report.registry.contains("healthy.slot"));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].provider, "broken");
        assert!(report.skipped[0].reason.contains("simulated init failure"));
    }

    #[test]
    fn test_cross_provider_collision_first_wins() {
        let first = provider("first", &["shared.slot"]);
        let second = provider("second", &["shared.slot", "second.own"]);

        let report = discover_slots(&[&first, &second], &ModulePolicy::default());

        assert_eq!(report.registry.provider_of("shared.slot"), Some("first"));
        // The colliding provider's other slots still land.
        assert!(report.registry.contains("second.own"));
        assert_eq!(report.collisions.len(), 1);
        assert!(report.collisions[0].contains("shared.slot"));
    }

    #[test]
    fn test_descriptors_cover_discovered_slots() {
        let db = provider("db", &["db.connect"]);
        let report = discover_slots(&[&db], &ModulePolicy::default());

        let descriptors = report.registry.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "db.connect");
        assert_eq!(descriptors[0].provider, "db");
    }

    #[test]
    fn test_empty_provider_list() {
        let report = discover_slots(&[], &ModulePolicy::default());
        assert!(report.registry.is_empty());
        assert!(report.skipped.is_empty());
    }
}
