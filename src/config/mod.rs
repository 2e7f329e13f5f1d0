//! Configuration management for portsweep.
//!
//! [`AppSettings`] carries user defaults from an XDG-compliant settings
//! file; [`ScanConfiguration`] is the immutable per-run view handed to the
//! scan engine.

mod scan;
mod settings;

pub use scan::ScanConfiguration;
pub use settings::{default_settings_file, AppSettings};
