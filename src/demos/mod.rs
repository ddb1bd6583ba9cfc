//! Runnable walkthroughs of the feedback patterns, one per route.

pub mod presenter;
pub mod scenarios;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Toast,
    Persistent,
    AutoClear,
    Host,
    Scaffold,
}

impl Demo {
    pub const ALL: [Demo; 5] = [
        Demo::Toast,
        Demo::Persistent,
        Demo::AutoClear,
        Demo::Host,
        Demo::Scaffold,
    ];

    pub fn route(self) -> &'static str {
        match self {
            Demo::Toast => "toast",
            Demo::Persistent => "persistent",
            Demo::AutoClear => "auto-clear",
            Demo::Host => "host",
            Demo::Scaffold => "scaffold",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|demo| demo.route() == route)
    }

    pub fn description(self) -> &'static str {
        match self {
            Demo::Toast => "fire-and-forget toast with a fixed short duration",
            Demo::Persistent => "snackbar that stays until it is hidden explicitly",
            Demo::AutoClear => "single slot cleared after a delay that restarts on every update",
            Demo::Host => "queued snackbars: one timed, one indefinite with an action",
            Demo::Scaffold => "snackbars raised by an event and by a state change",
        }
    }

    pub async fn run(self, config: &Config) -> anyhow::Result<()> {
        tracing::info!(event = "demo_started", demo = self.route(), "{}", self.description());
        match self {
            Demo::Toast => scenarios::toast(config).await,
            Demo::Persistent => scenarios::persistent(config).await,
            Demo::AutoClear => scenarios::auto_clear(config).await,
            Demo::Host => scenarios::host(config).await,
            Demo::Scaffold => scenarios::scaffold(config).await,
        }
    }
}

pub fn format_routes() -> String {
    Demo::ALL
        .iter()
        .map(|demo| format!("  {:<12} {}", demo.route(), demo.description()))
        .collect::<Vec<_>>()
        .join("\n")
}
