//! This module contains the state that a viewer keeps for the most recent
//! verifier result.
//!
//! Nothing else in the library is stateful between calls. A [`Session`] holds
//! the [`TraceView`], [`ForestView`], and [`UseSiteIndex`] built from the last
//! result, and each new result replaces them wholesale, so there is never any
//! need to update them incrementally.

use derivative::Derivative;
use tracing::debug;

use crate::{
    context::{ContextEvent, Executing, LineColumn, SourceRange},
    error,
    forest::{
        layout::{self, Config, LayoutNode},
        ExecutionForest,
        PathToken,
    },
    trace::{
        call_stack::project_call_stack,
        steps::{build_steps, Step, StepId, StepInspection, StepTree},
    },
    use_site::{UseSiteFile, UseSiteIndex},
};

/// The views of the most recent verifier result.
#[derive(Clone, Debug, Default)]
pub struct Session {
    trace: Option<TraceView>,

    forest: Option<ForestView>,

    use_sites: UseSiteIndex,
}

impl Session {
    /// Constructs a session that has not seen any result yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the shown trace with the reconstruction of `events`.
    ///
    /// # Errors
    ///
    /// If the log is malformed, in which case no trace is shown.
    pub fn show_trace(&mut self, events: &[ContextEvent]) -> error::Result<&mut TraceView> {
        self.trace = None;
        Ok(self.trace.insert(TraceView::new(events)?))
    }

    /// Replaces the shown execution forest with `forest`, drawn with `config`.
    ///
    /// # Errors
    ///
    /// If the forest is malformed, in which case no forest is shown.
    pub fn show_forest(
        &mut self,
        forest: &ExecutionForest,
        config: Config,
    ) -> error::Result<&mut ForestView> {
        self.forest = None;
        Ok(self.forest.insert(ForestView::new(forest, config)?))
    }

    /// Replaces the known use sites with those reported in `files`.
    ///
    /// # Errors
    ///
    /// If the use sites are malformed, in which case none are known.
    pub fn load_use_sites(&mut self, files: Vec<UseSiteFile>) -> error::Result<()> {
        self.use_sites = UseSiteIndex::default();
        self.use_sites = UseSiteIndex::new(files)?;

        Ok(())
    }

    #[must_use]
    pub fn trace(&self) -> Option<&TraceView> {
        self.trace.as_ref()
    }

    pub fn trace_mut(&mut self) -> Option<&mut TraceView> {
        self.trace.as_mut()
    }

    #[must_use]
    pub fn forest(&self) -> Option<&ForestView> {
        self.forest.as_ref()
    }

    pub fn forest_mut(&mut self) -> Option<&mut ForestView> {
        self.forest.as_mut()
    }

    #[must_use]
    pub fn use_sites(&self) -> &UseSiteIndex {
        &self.use_sites
    }

    /// Finds the definition of the symbol used at the 0-based `position` in
    /// the file at `path`, according to the most recent result.
    #[must_use]
    pub fn definition(&self, path: &str, position: LineColumn) -> Option<&SourceRange> {
        self.use_sites.definition(path, position)
    }
}

/// The navigable reconstruction of a failed verification's context log.
#[derive(Derivative)]
#[derivative(Clone, Debug)]
pub struct TraceView {
    /// The reconstructed steps.
    #[derivative(Debug = "ignore")]
    tree: StepTree,

    /// The call stack at the point where the verifier stopped, innermost
    /// first.
    call_stack: Vec<Executing>,

    /// The step currently being shown.
    current: StepId,
}

impl TraceView {
    /// Reconstructs the context log `events` (most recent event first),
    /// showing the last step.
    ///
    /// # Errors
    ///
    /// If the log is malformed, in which case the viewer can only show the
    /// verifier's top-level message.
    pub fn new(events: &[ContextEvent]) -> error::Result<Self> {
        let tree = build_steps(events)?;
        let call_stack = project_call_stack(events)?;
        let current = tree.last();

        Ok(Self {
            tree,
            call_stack,
            current,
        })
    }

    #[must_use]
    pub fn tree(&self) -> &StepTree {
        &self.tree
    }

    /// Gets the call stack at the point where the verifier stopped, innermost
    /// frame first.
    #[must_use]
    pub fn call_stack(&self) -> &[Executing] {
        &self.call_stack
    }

    /// Gets the identifier of the step currently being shown.
    #[must_use]
    pub fn current(&self) -> StepId {
        self.current
    }

    /// Gets the step currently being shown.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.tree.get(self.current)
    }

    /// Shows the step `id`, returning what should be displayed for it.
    ///
    /// If `id` does not belong to this trace, the current step is left
    /// unchanged and [`None`] is returned.
    pub fn show(&mut self, id: StepId) -> Option<StepInspection<'_>> {
        self.tree.get(id)?;
        self.current = id;
        debug!(step = id.index(), "Showing step");

        self.tree.inspect(id)
    }
}

/// The laid out execution forest of a verification, with one of its trees
/// selected for display.
#[derive(Clone, Debug)]
pub struct ForestView {
    /// The geometry that the trees are drawn with.
    config: Config,

    /// The laid out top-level trees.
    trees: Vec<LayoutNode>,

    /// The index of the tree being displayed, if there are any trees.
    selected: Option<usize>,
}

impl ForestView {
    /// Decodes and lays out `forest` for drawing with `config`, selecting its
    /// first tree.
    ///
    /// # Errors
    ///
    /// If the forest is malformed.
    pub fn new(forest: &ExecutionForest, config: Config) -> error::Result<Self> {
        let trees = layout::layout(&forest.decode()?);
        let selected = (!trees.is_empty()).then_some(0);

        Ok(Self {
            config,
            trees,
            selected,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn trees(&self) -> &[LayoutNode] {
        &self.trees
    }

    /// Gets the labels that the top-level trees are listed by.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.trees.iter().map(|tree| tree.kind.label()).collect()
    }

    /// Selects the tree at `index` for display.
    ///
    /// If there is no such tree, the selection is left unchanged and [`None`]
    /// is returned.
    pub fn select(&mut self, index: usize) -> Option<&LayoutNode> {
        let tree = self.trees.get(index)?;
        self.selected = Some(index);

        Some(tree)
    }

    /// Gets the tree currently selected for display.
    #[must_use]
    pub fn selected(&self) -> Option<&LayoutNode> {
        self.selected.and_then(|index| self.trees.get(index))
    }

    /// Resolves a click at (`x`, `y`) on the selected tree's canvas.
    ///
    /// Only clicks on the marker of an exec node select anything, in which
    /// case the returned token asks the verifier to replay up to that node.
    #[must_use]
    pub fn click(&self, x: f64, y: f64) -> Option<PathToken> {
        let tree = self.selected()?;
        let hit = self.config.hit_test(tree, x, y)?;
        let token = hit.kind.path()?.token();
        debug!(%token, "Selected execution forest node");

        Some(token)
    }
}
