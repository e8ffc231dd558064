//! This module contains the layout engine for the execution forest.
//!
//! Laying out a tree happens in two steps. First, chains of nodes that have
//! only one way forward are collapsed, so that what remains are the points at
//! which execution split and the outcomes it reached. Second, each node is
//! sized in grid cells: a node is as wide as all of its children side by side
//! (and at least one cell), and one row taller than its tallest child.
//!
//! Each node is drawn as a circular marker centered horizontally over its
//! width in the top row of its area, with its children laid out left to right
//! in the rows below. The same rule is used in reverse by
//! [`Config::hit_test`] to find the node under a point.

use tracing::debug;

use crate::{
    constant::{DEFAULT_CELL_PADDING, DEFAULT_DOT_DIAMETER},
    forest::{ForestNode, NodeKind},
};

/// Lays out each of the top-level `trees`.
///
/// The top-level nodes themselves are kept as they are, as they are what the
/// trees are listed by. Everything below them is collapsed.
#[must_use]
pub fn layout(trees: &[ForestNode]) -> Vec<LayoutNode> {
    let laid_out: Vec<LayoutNode> = trees.iter().map(LayoutNode::new).collect();
    debug!(trees = laid_out.len(), "Laid out execution forest");

    laid_out
}

/// Finds the node that `node` is displayed as.
///
/// A node with a single child is skipped in favour of that child whenever the
/// node is an exec node or the child is, so runs of exec nodes (and branch
/// nodes that lead only to an exec node) are compressed to the first point
/// where execution splits or ends.
#[must_use]
pub fn collapse(node: &ForestNode) -> &ForestNode {
    match node.children.as_slice() {
        [only] if node.kind.is_exec() || only.kind.is_exec() => collapse(only),
        _ => node,
    }
}

/// A forest node together with the size of the area that it and its
/// descendants occupy, in grid cells.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayoutNode {
    pub kind: NodeKind,

    /// The width of the node's area in cells. Always at least 1.
    pub width: usize,

    /// The height of the node's area in cells. Always at least 1.
    pub height: usize,

    /// The displayed children, left to right.
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    /// Lays out `node`, collapsing each of its children before sizing them.
    #[must_use]
    pub fn new(node: &ForestNode) -> Self {
        let children: Vec<LayoutNode> = node
            .children
            .iter()
            .map(|child| LayoutNode::new(collapse(child)))
            .collect();
        let width = children.iter().map(|child| child.width).sum::<usize>().max(1);
        let height = 1 + children.iter().map(|child| child.height).max().unwrap_or(0);

        Self {
            kind: node.kind.clone(),
            width,
            height,
            children,
        }
    }

    /// Lists where each node of the tree rooted at `self` is drawn.
    ///
    /// The placements are in pre-order, with `self` first, and are in canvas
    /// units relative to the top left corner of `self`'s area.
    #[must_use]
    pub fn placements(&self, config: &Config) -> Vec<Placement<'_>> {
        let mut placements = Vec::new();
        self.place(config, (0.0, 0.0), None, &mut placements);

        placements
    }

    fn place<'a>(
        &'a self,
        config: &Config,
        origin: (f64, f64),
        parent_center: Option<(f64, f64)>,
        placements: &mut Vec<Placement<'a>>,
    ) {
        let cell = config.cell_size();
        let (local_x, local_y) = config.marker_center(self);
        let center = (origin.0 + local_x, origin.1 + local_y);
        placements.push(Placement {
            node: self,
            center,
            parent_center,
        });

        let mut child_x = origin.0;
        for child in &self.children {
            child.place(config, (child_x, origin.1 + cell), Some(center), placements);
            child_x += cells(child.width) * cell;
        }
    }
}

/// Where a node of a laid out tree is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement<'a> {
    pub node: &'a LayoutNode,

    /// The center of the node's marker.
    pub center: (f64, f64),

    /// The center of the parent's marker, which the edge to this node starts
    /// from, or [`None`] for the root.
    pub parent_center: Option<(f64, f64)>,
}

/// The geometry used to draw and hit-test laid out trees.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The diameter of the circular marker drawn for each node.
    ///
    /// Defaults to [`DEFAULT_DOT_DIAMETER`].
    pub dot_diameter: f64,

    /// The space between a marker and the edge of its cell.
    ///
    /// Defaults to [`DEFAULT_CELL_PADDING`].
    pub padding: f64,
}

impl Config {
    /// Sets the `dot_diameter` config parameter to `value`.
    #[must_use]
    pub fn with_dot_diameter(mut self, value: f64) -> Self {
        self.dot_diameter = value;
        self
    }

    /// Sets the `padding` config parameter to `value`.
    #[must_use]
    pub fn with_padding(mut self, value: f64) -> Self {
        self.padding = value;
        self
    }

    /// Gets the side length of a grid cell in canvas units.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.dot_diameter + 2.0 * self.padding
    }

    /// Gets the size of the canvas needed to draw the tree rooted at `node`.
    #[must_use]
    pub fn canvas_size(&self, node: &LayoutNode) -> (f64, f64) {
        let cell = self.cell_size();
        (cells(node.width) * cell, cells(node.height) * cell)
    }

    /// Gets the center of `node`'s marker relative to the top left corner of
    /// its area.
    #[must_use]
    pub fn marker_center(&self, node: &LayoutNode) -> (f64, f64) {
        let cell = self.cell_size();
        (cells(node.width) * cell / 2.0, cell / 2.0)
    }

    /// Finds the node of the tree rooted at `node` whose marker contains the
    /// point (`x`, `y`), given relative to the top left corner of `node`'s
    /// area.
    ///
    /// Points in the top row hit `node` only if they fall within its marker.
    /// Points below it are passed on to the child whose columns contain `x`.
    #[must_use]
    pub fn hit_test<'a>(&self, node: &'a LayoutNode, x: f64, y: f64) -> Option<&'a LayoutNode> {
        if x < 0.0 || y < 0.0 {
            return None;
        }

        let cell = self.cell_size();
        if y < cell {
            let (center_x, center_y) = self.marker_center(node);
            let radius = self.dot_diameter / 2.0;
            let distance_squared = (x - center_x).powi(2) + (y - center_y).powi(2);

            return (distance_squared < radius * radius).then_some(node);
        }

        let mut child_x = 0.0;
        for child in &node.children {
            let next_child_x = child_x + cells(child.width) * cell;
            if x < next_child_x {
                return self.hit_test(child, x - child_x, y - cell);
            }
            child_x = next_child_x;
        }

        None
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dot_diameter: DEFAULT_DOT_DIAMETER,
            padding:      DEFAULT_CELL_PADDING,
        }
    }
}

/// Converts a number of grid cells to a floating point multiplier.
#[allow(clippy::cast_precision_loss)] // Trees are never 2^52 cells across.
fn cells(count: usize) -> f64 {
    count as f64
}
