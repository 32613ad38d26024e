//! Startup script execution.
//!
//! Once the dispatch registry is built, the runner walks the dynamic files
//! hierarchy and executes every script found under a reserved
//! `magic.startup` folder. Startup folders are recognized at three depths
//! relative to the `system/` and `modules/` roots:
//!
//! - layer 0: a top-level folder itself named `magic.startup`
//! - layer 1: an immediate child of a top-level folder (module level)
//! - layer 2: an immediate child of a non-reserved child (sub-module level)
//!
//! Executing a folder descends it recursively and dispatches every `.hl`
//! file through the registry under the `evaluate` slot. System folders run
//! before module folders, so foundational slots registered by system
//! scripts are available to module scripts.
//!
//! A failing script is logged and skipped; it never stops sibling scripts
//! or later top-level folders. Scripts already executed keep their effects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::{RootResolver, EVALUATE_SLOT, SCRIPT_EXTENSION, STARTUP_FOLDER};
use crate::error::MagicError;
use crate::files::FileService;
use crate::script::ScriptParser;
use crate::slots::SlotRegistry;

/// A script that failed to parse or execute during startup.
#[derive(Debug)]
pub struct ScriptFailure {
    /// Path of the failing script file.
    pub path: PathBuf,
    /// The failure itself.
    pub error: MagicError,
}

/// Outcome of a startup run.
#[derive(Debug, Default)]
pub struct StartupSummary {
    /// Number of scripts dispatched successfully.
    pub executed: usize,
    /// Scripts that failed, in traversal order.
    pub failures: Vec<ScriptFailure>,
}

impl StartupSummary {
    /// Whether every discovered script executed cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks the layered startup-folder hierarchy and executes scripts.
pub struct StartupRunner<F: FileService> {
    files: F,
    parser: Arc<dyn ScriptParser>,
    registry: Arc<SlotRegistry>,
}

impl<F: FileService> StartupRunner<F> {
    /// Create a runner. Taking the registry here is what guarantees it is
    /// fully populated before any script executes.
    pub fn new(files: F, parser: Arc<dyn ScriptParser>, registry: Arc<SlotRegistry>) -> Self {
        Self {
            files,
            parser,
            registry,
        }
    }

    /// Execute all startup scripts under the resolver's `system/` and
    /// `modules/` roots, system first.
    pub async fn run(&self, resolver: &RootResolver) -> StartupSummary {
        let mut summary = StartupSummary::default();

        let mut top_folders = self.list_folders_logged(&resolver.system(), &mut summary);
        top_folders.extend(self.list_folders_logged(&resolver.modules(), &mut summary));

        info!(folders = top_folders.len(), "Executing startup scripts");

        for top in &top_folders {
            self.run_top_folder(top, &mut summary).await;
        }

        info!(
            executed = summary.executed,
            failures = summary.failures.len(),
            "Startup script execution complete"
        );
        summary
    }

    /// All three layers beneath one top-level folder.
    async fn run_top_folder(&self, top: &Path, summary: &mut StartupSummary) {
        if is_startup_folder(top) {
            // Layer 0: the top-level folder is itself a startup folder.
            self.execute_folder(top, summary).await;
            return;
        }

        for child in self.list_folders_logged(top, summary) {
            if is_startup_folder(&child) {
                // Layer 1: module-level startup folder.
                self.execute_folder(&child, summary).await;
                continue;
            }

            // Layer 2: sub-module-level startup folders.
            for grandchild in self.list_folders_logged(&child, summary) {
                if is_startup_folder(&grandchild) {
                    self.execute_folder(&grandchild, summary).await;
                }
            }
        }
    }

    /// Execute every script file beneath `folder`, descending its whole
    /// subtree. Parent folders run before their subfolders.
    async fn execute_folder(&self, folder: &Path, summary: &mut StartupSummary) {
        debug!(folder = %folder.display(), "Executing startup folder");

        let mut queue = std::collections::VecDeque::from([folder.to_path_buf()]);
        while let Some(dir) = queue.pop_front() {
            match self.files.list_files(&dir, SCRIPT_EXTENSION) {
                Ok(scripts) => {
                    for script in scripts {
                        match self.execute_script(&script).await {
                            Ok(()) => summary.executed += 1,
                            Err(err) => {
                                report_failure(&script, &err);
                                summary.failures.push(ScriptFailure { path: script, error: err });
                            }
                        }
                    }
                }
                Err(err) => {
                    report_failure(&dir, &err);
                    summary.failures.push(ScriptFailure {
                        path: dir.clone(),
                        error: err,
                    });
                }
            }

            queue.extend(self.list_folders_logged(&dir, summary));
        }
    }

    /// Read, parse, and dispatch one script under the `evaluate` slot.
    async fn execute_script(&self, path: &Path) -> crate::error::Result<()> {
        debug!(script = %path.display(), "Dispatching startup script");
        let text = self.files.read_to_string(path)?;
        let mut root = self.parser.parse(&text)?;
        self.registry.signal(EVALUATE_SLOT, &mut root).await
    }

    /// Folder listing that records failures instead of propagating them.
    fn list_folders_logged(&self, path: &Path, summary: &mut StartupSummary) -> Vec<PathBuf> {
        match self.files.list_folders(path) {
            Ok(folders) => folders,
            Err(err) => {
                report_failure(path, &err);
                summary.failures.push(ScriptFailure {
                    path: path.to_path_buf(),
                    error: err,
                });
                Vec::new()
            }
        }
    }
}

/// A startup folder located during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFolder {
    /// Nesting depth the folder was recognized at (0, 1, or 2).
    pub layer: u8,
    /// Absolute path of the folder.
    pub path: PathBuf,
}

/// Locate every startup folder under the resolver's roots without
/// executing anything. System folders come first, mirroring execution
/// order.
pub fn scan_startup_folders<F: FileService>(
    files: &F,
    resolver: &RootResolver,
) -> crate::error::Result<Vec<ScannedFolder>> {
    let mut found = Vec::new();

    let mut top_folders = files.list_folders(&resolver.system())?;
    top_folders.extend(files.list_folders(&resolver.modules())?);

    for top in top_folders {
        if is_startup_folder(&top) {
            found.push(ScannedFolder { layer: 0, path: top });
            continue;
        }

        for child in files.list_folders(&top)? {
            if is_startup_folder(&child) {
                found.push(ScannedFolder { layer: 1, path: child });
                continue;
            }

            for grandchild in files.list_folders(&child)? {
                if is_startup_folder(&grandchild) {
                    found.push(ScannedFolder {
                        layer: 2,
                        path: grandchild,
                    });
                }
            }
        }
    }

    Ok(found)
}

fn is_startup_folder(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case(STARTUP_FOLDER))
}

/// Log a startup failure through tracing, or stderr when no subscriber has
/// been installed yet, so failures are never silently dropped.
fn report_failure(path: &Path, err: &MagicError) {
    if tracing::dispatcher::has_been_set() {
        error!(path = %path.display(), error = %err, "Startup script failure");
    } else {
        eprintln!("magicboot: startup failure at {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Result;
    use crate::files::LocalFiles;
    use crate::script::{Node, PlainParser};
    use crate::slots::{Slot, SlotFactory};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// `evaluate` slot that records the `log` marker of each script and
    /// fails when the marker is `boom`.
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Slot for Recorder {
        fn execute(&self, args: &mut Node) -> Result<()> {
            let marker = args.child_str("log").unwrap_or("<none>").to_string();
            self.0.lock().unwrap().push(marker.clone());
            if marker == "boom" {
                return Err(MagicError::script("requested failure", 500, false));
            }
            Ok(())
        }
    }

    struct Fixture {
        tmp: TempDir,
        resolver: RootResolver,
        recorded: Arc<Mutex<Vec<String>>>,
        runner: StartupRunner<LocalFiles>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            fs::create_dir_all(tmp.path().join("system")).unwrap();
            fs::create_dir_all(tmp.path().join("modules")).unwrap();

            let recorded = Arc::new(Mutex::new(Vec::new()));
            let handle = recorded.clone();
            let mut registry = SlotRegistry::new();
            registry
                .register(
                    EVALUATE_SLOT,
                    "test",
                    SlotFactory::sync(move || Recorder(handle.clone())),
                )
                .unwrap();

            let config = Config {
                root_folder: tmp.path().to_string_lossy().to_string(),
                ..Default::default()
            };
            let resolver = RootResolver::new(&config);
            let runner =
                StartupRunner::new(LocalFiles::new(), Arc::new(PlainParser::new()), Arc::new(registry));

            Self {
                tmp,
                resolver,
                recorded,
                runner,
            }
        }

        fn script(&self, rel_dir: &str, file: &str, marker: &str) {
            let dir = self.tmp.path().join(rel_dir);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(file), format!("log:{marker}\n")).unwrap();
        }

        async fn run(&self) -> StartupSummary {
            self.runner.run(&self.resolver).await
        }

        fn markers(&self) -> Vec<String> {
            self.recorded.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_layer0_top_level_startup_folder() {
        let fx = Fixture::new();
        fx.script("system/magic.startup", "init.hl", "layer0");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(fx.markers(), vec!["layer0"]);
    }

    #[tokio::test]
    async fn test_layer1_module_level_startup_folder() {
        let fx = Fixture::new();
        fx.script("modules/invoices/magic.startup", "init.hl", "layer1");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(fx.markers(), vec!["layer1"]);
    }

    #[tokio::test]
    async fn test_layer2_sub_module_level_startup_folder() {
        let fx = Fixture::new();
        fx.script("modules/crm/backend/magic.startup", "init.hl", "layer2");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(fx.markers(), vec!["layer2"]);
    }

    #[tokio::test]
    async fn test_layer3_is_not_scanned() {
        let fx = Fixture::new();
        fx.script("modules/crm/backend/deep/magic.startup", "init.hl", "too-deep");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 0);
        assert!(fx.markers().is_empty());
    }

    #[tokio::test]
    async fn test_scripts_outside_startup_folders_never_dispatch() {
        let fx = Fixture::new();
        fx.script("modules/crm", "loose.hl", "loose");
        fx.script("modules/crm/magic.startup", "init.hl", "wanted");

        fx.run().await;
        assert_eq!(fx.markers(), vec!["wanted"]);
    }

    #[tokio::test]
    async fn test_non_script_files_are_ignored() {
        let fx = Fixture::new();
        fx.script("modules/crm/magic.startup", "init.hl", "wanted");
        fs::write(
            fx.tmp.path().join("modules/crm/magic.startup/notes.md"),
            "log:never\n",
        )
        .unwrap();

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(fx.markers(), vec!["wanted"]);
    }

    #[tokio::test]
    async fn test_startup_folder_descends_recursively() {
        let fx = Fixture::new();
        fx.script("modules/crm/magic.startup", "top.hl", "top");
        fx.script("modules/crm/magic.startup/tables", "nested.hl", "nested");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 2);
        assert_eq!(fx.markers(), vec!["top", "nested"]);
    }

    #[tokio::test]
    async fn test_system_scripts_run_before_module_scripts() {
        let fx = Fixture::new();
        fx.script("modules/zzz-app/magic.startup", "init.hl", "app");
        fx.script("system/auth/magic.startup", "init.hl", "system");

        fx.run().await;
        assert_eq!(fx.markers(), vec!["system", "app"]);
    }

    #[tokio::test]
    async fn test_failing_script_does_not_stop_sibling_folder() {
        let fx = Fixture::new();
        fx.script("modules/aaa/magic.startup", "bad.hl", "boom");
        fx.script("modules/bbb/magic.startup", "good.hl", "survived");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].path.ends_with("bad.hl"));
        assert_eq!(fx.markers(), vec!["boom", "survived"]);
    }

    #[tokio::test]
    async fn test_failing_script_does_not_stop_sibling_script() {
        let fx = Fixture::new();
        fx.script("modules/crm/magic.startup", "a.hl", "boom");
        fx.script("modules/crm/magic.startup", "b.hl", "second");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(fx.markers(), vec!["boom", "second"]);
    }

    #[tokio::test]
    async fn test_unparseable_script_is_recorded_and_isolated() {
        let fx = Fixture::new();
        let dir = fx.tmp.path().join("modules/crm/magic.startup");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.hl"), "   badly indented\n").unwrap();
        fx.script("modules/crm/magic.startup", "good.hl", "fine");

        let summary = fx.run().await;
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(summary.failures[0].error, MagicError::Parse(_)));
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_empty_roots_run_clean() {
        let fx = Fixture::new();
        let summary = fx.run().await;
        assert_eq!(summary.executed, 0);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_scan_reports_layers_without_executing() {
        let fx = Fixture::new();
        fx.script("system/magic.startup", "a.hl", "l0");
        fx.script("modules/crm/magic.startup", "b.hl", "l1");
        fx.script("modules/crm/backend/magic.startup", "c.hl", "l2");
        fx.script("modules/crm/backend/deep/magic.startup", "d.hl", "l3");

        let found = scan_startup_folders(&LocalFiles::new(), &fx.resolver).unwrap();
        let layers: Vec<u8> = found.iter().map(|f| f.layer).collect();
        assert_eq!(layers, vec![0, 2, 1]);
        assert!(found[0].path.starts_with(fx.tmp.path().join("system")));
        assert!(fx.markers().is_empty());
    }
}
