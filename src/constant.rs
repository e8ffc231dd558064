//! This module contains constants that are needed throughout the codebase.

/// The default diameter of the circular marker drawn for each forest node, in
/// canvas units.
pub const DEFAULT_DOT_DIAMETER: f64 = 15.0;

/// The default padding between a node's marker and the edge of its grid cell,
/// in canvas units.
///
/// A grid cell is therefore `DEFAULT_DOT_DIAMETER + 2 * DEFAULT_CELL_PADDING`
/// units wide and high.
pub const DEFAULT_CELL_PADDING: f64 = 4.0;

/// The label given to the step created for a `LeftBranch` event.
pub const LEFT_BRANCH_STEP_LABEL: &str = "Executing left branch";

/// The label given to the step created for a `RightBranch` event.
pub const RIGHT_BRANCH_STEP_LABEL: &str = "Executing right branch";

/// The heap coefficient denoting a full permission.
///
/// Chunks held with this coefficient are rendered without a coefficient
/// prefix.
pub const FULL_COEFFICIENT: &str = "1";

/// The separator placed between the indices of a path when it is rendered as a
/// replay token.
pub const PATH_TOKEN_SEPARATOR: &str = ",";

/// The display label of a branch node in the execution forest.
pub const BRANCH_NODE_LABEL: &str = "Branch";

/// The display label of a success node in the execution forest.
pub const SUCCESS_NODE_LABEL: &str = "Success";

/// The display label of an error node in the execution forest.
pub const ERROR_NODE_LABEL: &str = "Failure";

/// The deepest that nodes may nest in an execution forest, counting each
/// top-level node as the first level.
///
/// Decoding, layout, and hit-testing all descend one level at a time, so this
/// bounds how deep they can recurse.
pub const MAX_FOREST_DEPTH: usize = 256;
