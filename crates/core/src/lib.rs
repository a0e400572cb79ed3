//! Callsite tree model and interaction engine for flamegraph panels.
//!
//! ```text
//!   samples ─▶ Snapshot ─▶ Tree ─▶ expand ─▶ merge ─▶ highlight ─▶ layout ─▶ RenderCommand[]
//!                                   ▲                    ▲
//!                           click ──┘        focus query ┘ (debounced)
//! ```
//!
//! [`panel::ProfilePanel`] owns the interaction state and reruns only the
//! stages whose inputs changed.

pub mod config;
pub mod debounce;
pub mod model;
pub mod panel;
pub mod parsers;
pub mod views;

pub use config::{ConfigError, PanelConfig};
pub use panel::{PanelView, PipelineStats, ProfilePanel};
