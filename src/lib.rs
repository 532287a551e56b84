//! # pipeview: Hierarchical Dataflow Graph Viewer Core
//!
//! The model, layout and live-status core of a visual debugger for
//! hierarchical hardware designs. A circuit is a tree of units connected by
//! handshake interfaces; pipeview turns it into a graph of nodes, ports and
//! pipes, lays it out level by level, and paints activity onto it as the
//! simulation time moves.
//!
//! ## Architecture
//!
//! - **Graph**: Arena-backed node/port/pipe model built from a [`CircuitHierarchy`]
//! - **Layout**: Layered (Sugiyama-style) layout, one frame per expanded node
//! - **View**: Expand/collapse, selection and navigation, publishing [`GraphEvent`]s
//! - **Sync**: In-process and waveform-backed activity status, with coalesced
//!   round trips to the waveform service on a worker thread
//! - **Communication**: Crossbeam channels for events and waveform requests
//!
//! ## Configuration
//!
//! Layout spacing and synchronizer settings are read from a TOML file; see
//! [`config`] for the default location.
//!
//! ## Example
//!
//! ```ignore
//! use pipeview::{
//!     config::ViewerConfig,
//!     graph::{CircuitNode, GraphModel},
//!     sync::{ActivitySynchronizer, InProcessActivity, SimulationContext},
//!     view::GraphView,
//! };
//!
//! let config = ViewerConfig::load_user_config();
//! let circuit = CircuitNode::load("design.json")?;
//! let (mut view, events) = GraphView::new(GraphModel::build(&circuit), config.layout);
//!
//! let activity = InProcessActivity::new();
//! let mut sync = ActivitySynchronizer::new(SimulationContext::detached().with_activity(activity));
//!
//! let changed = sync.on_time_advanced(view.model_mut(), 42);
//! view.publish_status(&changed);
//! for event in events.drain() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod sync;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use config::{LayoutSettings, SyncSettings, ViewerConfig};
pub use error::{PipeViewError, Result, ResultExt};
pub use graph::{CircuitHierarchy, CircuitNode, GraphModel, NodeId, PipeId, PortId};
pub use layout::{GeometrySnapshot, LayoutEngine};
pub use sync::{ActivitySynchronizer, SimulationContext, WaveformBridge, WaveformClient};
pub use types::{GraphItem, Point, Rect, Size, Status};
pub use view::{GraphEvent, GraphView};
