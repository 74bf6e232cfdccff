//! `[serve]` section configuration.
//!
//! Contains development server, live reload and watcher settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in sitesmith.toml - development server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 8080
/// reload_port = 35729
/// watch = true           # Re-run tasks on file changes
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 3000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// WebSocket port for the live-reload channel (default: 35729).
    #[serde(default = "defaults::serve::reload_port")]
    #[educe(Default = defaults::serve::reload_port())]
    pub reload_port: u16,

    /// Enable file watcher for live reload on changes.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// Globs (relative to the source dir) that re-run the `style` task.
    #[serde(default = "defaults::serve::watch_style")]
    #[educe(Default = defaults::serve::watch_style())]
    pub watch_style: Vec<String>,

    /// Globs (relative to the source dir) that re-run the `content` task.
    #[serde(default = "defaults::serve::watch_content")]
    #[educe(Default = defaults::serve::watch_content())]
    pub watch_content: Vec<String>,
}
