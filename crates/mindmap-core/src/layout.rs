//! Layout Engine
//!
//! A pure function from (forest, visibility state, text-measurement
//! capability) to 2-D node positions. No hidden state: two passes over an
//! unchanged forest with the same measure produce identical output, which
//! is what makes the layout testable.
//!
//! The algorithm is a depth-first recursive assignment. Each visible node
//! gets a height of `max(measured wrapped-text height, MIN_NODE_HEIGHT)`.
//! Children stack vertically starting at the parent's own y, each offset
//! by the previous child's *subtree* height plus [`CHILD_GAP`]; a node's
//! subtree height is the larger of its own height and the sum of its
//! children's subtree heights minus the trailing gap, so a tall single
//! node and a deep narrow stack of children coexist without collapsing
//! each other. X grows by [`LEVEL_X_STEP`] per depth level; whole root
//! subtrees stack with [`ROOT_GAP`] between them. Collapsed subtrees
//! contribute nothing — their descendants are skipped entirely, not merely
//! hidden.

use crate::forest::Forest;
use crate::node::NodeId;
use std::collections::HashMap;
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Width of a node's on-screen box, in layout units.
pub const NODE_BOX_WIDTH: f64 = 150.0;
/// Wrap width for node text (the box minus inner padding).
pub const TEXT_WRAP_WIDTH: f64 = 140.0;
/// Minimum height of a node, regardless of its text.
pub const MIN_NODE_HEIGHT: f64 = 30.0;
/// Horizontal increment per depth level.
pub const LEVEL_X_STEP: f64 = 200.0;
/// Vertical gap between adjacent child subtrees.
pub const CHILD_GAP: f64 = 5.0;
/// Vertical gap between whole root subtrees.
pub const ROOT_GAP: f64 = 50.0;
/// X coordinate of root-level nodes.
pub const ORIGIN_X: f64 = 100.0;
/// Y coordinate of the first root.
pub const ORIGIN_Y: f64 = 50.0;

/// Weight applied to horizontal distance in spatial arrow-key navigation.
const NAV_X_WEIGHT: f64 = 10.0;

/// Fraction of a node box's height forming each edge drop zone.
const DROP_EDGE_FRACTION: f64 = 0.3;

/// Text-measurement capability: maps text to a height in layout units,
/// given a wrap width. Provided by the rendering collaborator (which knows
/// the font); [`MonospaceMeasure`] is a font-free stand-in.
pub trait TextMeasure {
    /// Height of `text` wrapped at `wrap_width` layout units.
    fn text_height(&self, text: &str, wrap_width: f64) -> f64;
}

/// Fixed-cell text measurement based on UAX #11 display widths.
///
/// Wraps greedily at word boundaries (falling back to per-grapheme breaks
/// for words wider than a whole line) and charges [`MonospaceMeasure::line_height`]
/// per resulting line. Deterministic, which is all the layout tests need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    /// Width of one character cell in layout units.
    pub cell_width: f64,
    /// Height of one wrapped line in layout units.
    pub line_height: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 15.0,
        }
    }
}

impl MonospaceMeasure {
    fn columns(&self, wrap_width: f64) -> usize {
        ((wrap_width / self.cell_width).floor() as usize).max(1)
    }

    fn line_count(&self, text: &str, columns: usize) -> usize {
        let mut lines = 1usize;
        let mut used = 0usize;
        for word in text.split_word_bounds() {
            let width = UnicodeWidthStr::width(word);
            if width == 0 {
                continue;
            }
            if used + width <= columns {
                used += width;
            } else if width <= columns {
                // Word fits on a line of its own; wrap before it. A leading
                // whitespace word is swallowed by the break instead.
                if word.trim().is_empty() {
                    used = 0;
                } else {
                    lines += 1;
                    used = width;
                }
            } else {
                // Word wider than a whole line: break it per grapheme.
                for grapheme in word.graphemes(true) {
                    let grapheme_width = UnicodeWidthStr::width(grapheme).max(1);
                    if used + grapheme_width > columns {
                        lines += 1;
                        used = 0;
                    }
                    used += grapheme_width;
                }
            }
        }
        lines
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_height(&self, text: &str, wrap_width: f64) -> f64 {
        let columns = self.columns(wrap_width);
        self.line_count(text, columns) as f64 * self.line_height
    }
}

/// Position assigned to one visible node during a layout pass.
///
/// `y` is the vertical center of the node's box. Ephemeral: recomputed in
/// full on every structural or visibility change, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePosition {
    /// Horizontal center of the node box.
    pub x: f64,
    /// Vertical center of the node box.
    pub y: f64,
    /// Height of the node box.
    pub height: f64,
}

/// Output of one layout pass: positions for every visible node, plus the
/// depth-first draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: HashMap<NodeId, NodePosition>,
    order: Vec<NodeId>,
}

impl Layout {
    /// Position of a node, or `None` if it was not visible in this pass.
    pub fn position(&self, id: &NodeId) -> Option<&NodePosition> {
        self.positions.get(id)
    }

    /// Whether the node received a position in this pass.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.positions.contains_key(id)
    }

    /// Number of positioned nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the pass positioned no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Visible nodes in depth-first draw order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Iterate over all positioned nodes in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodePosition)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.positions.get(id).map(|position| (id, position)))
    }
}

/// The layout engine. Holds the spacing parameters; computing a layout
/// borrows the forest and a measure and mutates nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    /// Wrap width handed to the text measure.
    pub wrap_width: f64,
    /// Minimum node height.
    pub min_node_height: f64,
    /// Horizontal increment per depth level.
    pub level_x_step: f64,
    /// Vertical gap between adjacent child subtrees.
    pub child_gap: f64,
    /// Vertical gap between whole root subtrees.
    pub root_gap: f64,
    /// X coordinate of root-level nodes.
    pub origin_x: f64,
    /// Y coordinate of the first root.
    pub origin_y: f64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            wrap_width: TEXT_WRAP_WIDTH,
            min_node_height: MIN_NODE_HEIGHT,
            level_x_step: LEVEL_X_STEP,
            child_gap: CHILD_GAP,
            root_gap: ROOT_GAP,
            origin_x: ORIGIN_X,
            origin_y: ORIGIN_Y,
        }
    }
}

impl LayoutEngine {
    /// Create an engine with the default spacing parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one layout pass over the forest.
    ///
    /// Deterministic: identical forest + identical measure gives identical
    /// output.
    pub fn compute(&self, forest: &Forest, measure: &dyn TextMeasure) -> Layout {
        let mut layout = Layout {
            positions: HashMap::new(),
            order: Vec::new(),
        };
        let mut y = self.origin_y;
        for root in forest.roots() {
            let subtree_height =
                self.place_subtree(forest, measure, root, self.origin_x, y, &mut layout);
            y += subtree_height + self.root_gap;
        }
        trace!(nodes = layout.len(), "layout pass complete");
        layout
    }

    /// Assign positions for `id` and its visible descendants; returns the
    /// subtree height.
    fn place_subtree(
        &self,
        forest: &Forest,
        measure: &dyn TextMeasure,
        id: &NodeId,
        x: f64,
        y: f64,
        layout: &mut Layout,
    ) -> f64 {
        let Some(node) = forest.get(id) else {
            return 0.0;
        };
        let text_height = measure.text_height(&node.name, self.wrap_width);
        let node_height = text_height.max(self.min_node_height);
        layout.positions.insert(
            id.clone(),
            NodePosition {
                x,
                y,
                height: node_height,
            },
        );
        layout.order.push(id.clone());

        if node.children.is_empty() || !node.expanded {
            return node_height;
        }

        let child_x = x + self.level_x_step;
        let mut child_y = y;
        let mut stacked = 0.0;
        for child in &node.children {
            let child_height = self.place_subtree(forest, measure, child, child_x, child_y, layout);
            child_y += child_height + self.child_gap;
            stacked += child_height + self.child_gap;
        }
        // The trailing gap is not part of the subtree extent.
        node_height.max(stacked - self.child_gap)
    }
}

/// Nearest visible node strictly above `from`, weighting horizontal
/// distance [`NAV_X_WEIGHT`]× so navigation prefers the same column.
pub fn nearest_above(layout: &Layout, from: &NodeId) -> Option<NodeId> {
    nearest_vertical(layout, from, |candidate, current| current - candidate)
}

/// Nearest visible node strictly below `from`, with the same weighting.
pub fn nearest_below(layout: &Layout, from: &NodeId) -> Option<NodeId> {
    nearest_vertical(layout, from, |candidate, current| candidate - current)
}

/// How a drag-release against a target node is interpreted.
///
/// Frontends classify the pointer position against the target's box with
/// [`drop_zone`] and translate the result into the matching move
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    /// Released in the top 30% of the box: insert before the target.
    Before,
    /// Released in the middle of the box: reparent under the target.
    Child,
    /// Released in the bottom 30% of the box: insert after the target.
    After,
}

/// Classify a drop at `pointer_y` against a target node's box.
///
/// The box is centered on the target's `y` and spans its `height`; the
/// top and bottom [`DROP_EDGE_FRACTION`] of it map to sibling insertion,
/// the remainder to reparenting.
pub fn drop_zone(target: &NodePosition, pointer_y: f64) -> DropZone {
    let top = target.y - target.height / 2.0;
    let bottom = target.y + target.height / 2.0;
    let edge = target.height * DROP_EDGE_FRACTION;
    if pointer_y < top + edge {
        DropZone::Before
    } else if pointer_y > bottom - edge {
        DropZone::After
    } else {
        DropZone::Child
    }
}

fn nearest_vertical(
    layout: &Layout,
    from: &NodeId,
    signed_dy: impl Fn(f64, f64) -> f64,
) -> Option<NodeId> {
    let current = layout.position(from)?;
    let mut best: Option<(&NodeId, f64)> = None;
    for (id, position) in layout.iter() {
        if id == from {
            continue;
        }
        let dy = signed_dy(position.y, current.y);
        if dy <= 0.0 {
            continue;
        }
        let distance = dy + (position.x - current.x).abs() * NAV_X_WEIGHT;
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id.clone())
}
