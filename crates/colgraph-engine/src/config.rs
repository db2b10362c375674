//! Graph store configuration.

use std::time::Duration;

/// Default graph name.
pub const DEFAULT_GRAPH_NAME: &str = "graph";

/// Default bound on row-lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`GraphStore`](crate::GraphStore).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use colgraph_engine::Config;
///
/// let config = Config::new("social")
///     .with_lock_timeout(Duration::from_millis(500));
/// assert_eq!(config.graph_name, "social");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Graph name; every table and family name is derived from it.
    pub graph_name: String,
    /// Bound on every row-lock acquisition made by edge creation and removal.
    pub lock_timeout: Duration,
    /// Create the vertex table and the index registry table if absent.
    pub bootstrap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_name: DEFAULT_GRAPH_NAME.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            bootstrap: true,
        }
    }
}

impl Config {
    /// Creates a default configuration for the named graph.
    #[must_use]
    pub fn new(graph_name: impl Into<String>) -> Self {
        Self::default().with_graph_name(graph_name)
    }

    /// Sets the graph name.
    #[must_use]
    pub fn with_graph_name(mut self, graph_name: impl Into<String>) -> Self {
        self.graph_name = graph_name.into();
        self
    }

    /// Sets the row-lock acquisition bound.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Enables or disables table bootstrap.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }
}
