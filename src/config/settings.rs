//! Tunable settings for the layout engine and the activity synchronizer
//!
//! Every field carries a serde default so a configuration file only needs
//! to mention the values it overrides.
//!
//! # Main Types
//!
//! - [`LayoutSettings`] - Spacing, padding and minimum sizes used by the layered layout
//! - [`SyncSettings`] - Waveform batching and signal naming conventions

use crate::error::{PipeViewError, Result};
use serde::{Deserialize, Serialize};

/// Default padding around the contents of an expanded node
pub const DEFAULT_PADDING: f64 = 20.0;

/// Default number of signals per waveform round trip
pub const DEFAULT_MAX_BATCH_SIGNALS: usize = 20;

/// Smallest usable batch: one valid/ready pair
pub const MIN_BATCH_SIGNALS: usize = 2;

/// Geometry settings for the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Padding added around the contents of every node box
    pub padding: f64,

    /// Horizontal gap between consecutive ranks
    pub rank_separation: f64,

    /// Vertical gap between vertices of the same rank
    pub node_separation: f64,

    /// Minimum width of a leaf or collapsed node (before padding)
    pub min_node_width: f64,

    /// Minimum height of a leaf or collapsed node (before padding)
    pub min_node_height: f64,

    /// Vertical distance between neighbouring ports on a collapsed box
    pub port_spacing: f64,

    /// Approximate width of one label character, used to size boxes by name
    pub char_width: f64,

    /// Side length of the box used by minimized node kinds
    pub minimized_size: f64,

    /// Upper bound on barycenter sweeps during crossing minimization
    pub crossing_passes: usize,

    /// Number of vertical alignment passes after ordering
    pub alignment_passes: usize,

    /// Horizontal tangent length of routed pipe curves (fraction of segment dx)
    pub bezier_tangent: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            rank_separation: 60.0,
            node_separation: 30.0,
            min_node_width: 60.0,
            min_node_height: 40.0,
            port_spacing: 16.0,
            char_width: 7.0,
            minimized_size: 12.0,
            crossing_passes: 24,
            alignment_passes: 4,
            bezier_tangent: 0.5,
        }
    }
}

/// Settings for the activity status synchronizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum number of signals requested in a single waveform round trip
    pub max_batch_signals: usize,

    /// Suffix of the handshake "valid" signal
    pub valid_suffix: String,

    /// Suffix of the handshake "ready" signal
    pub ready_suffix: String,

    /// Suffix of the data signal
    pub data_suffix: String,

    /// Infix placed between a producer stem and the consumer index for fan-out pipes
    pub broadcast_infix: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_batch_signals: DEFAULT_MAX_BATCH_SIGNALS,
            valid_suffix: "_valid".to_string(),
            ready_suffix: "_ready".to_string(),
            data_suffix: "_data".to_string(),
            broadcast_infix: "_bc_".to_string(),
        }
    }
}

impl SyncSettings {
    /// Number of pipes that fit in one round trip (two handshake signals each).
    ///
    /// Never below one pipe; settings loaded through
    /// [`ViewerConfig::load`](super::ViewerConfig::load) are validated so the
    /// floor is never hit.
    pub fn pipes_per_batch(&self) -> usize {
        (self.max_batch_signals / 2).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_signals < MIN_BATCH_SIGNALS {
            return Err(PipeViewError::Config(format!(
                "max_batch_signals must be at least {}, got {}",
                MIN_BATCH_SIGNALS, self.max_batch_signals
            )));
        }
        Ok(())
    }
}
