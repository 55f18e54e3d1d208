//! Configuration types for the layout engine.
//!
//! All types implement [`serde::Deserialize`] so an embedding editor can load
//! them from its own settings file. Every section and field falls back to the
//! editor's historical defaults when omitted.
//!
//! # Overview
//!
//! - [`LayoutConfig`] - Top-level configuration combining every section.
//! - [`EdgeConfig`] - Docker sizes and hit-test tolerances.
//! - [`ContainerConfig`] - Pool and lane geometry.
//! - [`LabelConfig`] - Offsets for keyword-positioned edge labels.
//! - [`FlushConfig`] - Limits for cascading layout passes.
//!
//! # Example
//!
//! ```
//! # use swimlane::config::LayoutConfig;
//! let config = LayoutConfig::default();
//! assert_eq!(config.container().lane_indent(), 30.0);
//! assert_eq!(config.edge().collinear_tolerance(), 1.0);
//! ```

use serde::Deserialize;

/// Top-level layout configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    edge: EdgeConfig,

    #[serde(default)]
    container: ContainerConfig,

    #[serde(default)]
    label: LabelConfig,

    #[serde(default)]
    flush: FlushConfig,
}

impl LayoutConfig {
    /// Creates a new [`LayoutConfig`] from its sections.
    pub fn new(
        edge: EdgeConfig,
        container: ContainerConfig,
        label: LabelConfig,
        flush: FlushConfig,
    ) -> Self {
        Self {
            edge,
            container,
            label,
            flush,
        }
    }

    pub fn edge(&self) -> &EdgeConfig {
        &self.edge
    }

    pub fn container(&self) -> &ContainerConfig {
        &self.container
    }

    pub fn label(&self) -> &LabelConfig {
        &self.label
    }

    pub fn flush(&self) -> &FlushConfig {
        &self.flush
    }
}

/// Edge and docker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Side length of the square hit area around a docker.
    docker_size: f32,

    /// Maximum distance from a segment at which a new docker may be inserted.
    docker_hit_tolerance: f32,

    /// Maximum distance from the line through its neighbors at which an
    /// interior docker is considered redundant.
    collinear_tolerance: f32,
}

impl EdgeConfig {
    pub fn new(docker_size: f32, docker_hit_tolerance: f32, collinear_tolerance: f32) -> Self {
        Self {
            docker_size,
            docker_hit_tolerance,
            collinear_tolerance,
        }
    }

    pub fn docker_size(&self) -> f32 {
        self.docker_size
    }

    pub fn docker_hit_tolerance(&self) -> f32 {
        self.docker_hit_tolerance
    }

    pub fn collinear_tolerance(&self) -> f32 {
        self.collinear_tolerance
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self::new(16.0, 10.0, 1.0)
    }
}

/// Pool and lane settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Horizontal indent of a lane inside its parent, applied per nesting level.
    lane_indent: f32,
}

impl ContainerConfig {
    pub fn new(lane_indent: f32) -> Self {
        Self { lane_indent }
    }

    pub fn lane_indent(&self) -> f32 {
        self.lane_indent
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new(30.0)
    }
}

/// Offsets used by keyword-positioned edge labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    offset_top: f32,
    offset_bottom: f32,
}

impl LabelConfig {
    pub fn new(offset_top: f32, offset_bottom: f32) -> Self {
        Self {
            offset_top,
            offset_bottom,
        }
    }

    /// Distance between the anchor docker and a `*top` label.
    pub fn offset_top(&self) -> f32 {
        self.offset_top
    }

    /// Distance between the anchor docker and a `*bottom` label.
    pub fn offset_bottom(&self) -> f32 {
        self.offset_bottom
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::new(8.0, 8.0)
    }
}

/// Limits for [`Diagram::flush`](crate::diagram::Diagram::flush).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Maximum number of edge/container rounds run by a single flush.
    max_passes: usize,
}

impl FlushConfig {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self::new(8)
    }
}
