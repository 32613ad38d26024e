//! Layered startup-script execution.

mod runner;

pub use runner::{
    scan_startup_folders, ScannedFolder, ScriptFailure, StartupRunner, StartupSummary,
};
