//! Compositor lifecycle.
//!
//! The post-process graph bakes the viewport size and the blend and bloom
//! parameters into its targets and uniforms. [`Compositor`] owns the current
//! graph and replaces it as a unit: input changes only mark it stale, and the
//! next [`Compositor::prepare`] disposes the old graph completely before
//! building a new one. However many changes arrive between two frames, at
//! most one build runs and only the latest inputs are used.
//!
//! ```text
//! Uninitialized --prepare--> Built --resize/settings--> NeedsRebuild --prepare--> Built
//!                              |                                         \
//!                              +--dispose--> Disposed                     +--alloc error--> Degraded
//! ```
//!
//! The graph itself is produced by a [`GraphFactory`], which keeps this state
//! machine independent of wgpu.

use crate::config::CompositorSettings;
use crate::error::SwarmError;

/// A built graph. Consumed on disposal so it can never be used afterwards.
pub trait PassGraph {
    fn dispose(self);
}

/// Builds graphs from inputs.
pub trait GraphFactory {
    type Graph: PassGraph;

    fn build(&mut self, inputs: &GraphInputs) -> Result<Self::Graph, SwarmError>;
}

/// Everything baked into a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphInputs {
    pub width: u32,
    pub height: u32,
    pub settings: CompositorSettings,
}

impl GraphInputs {
    fn same_graph(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.settings.same_graph(&other.settings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorState {
    Uninitialized,
    Built,
    NeedsRebuild,
    /// The last build failed to allocate. Retried when inputs change.
    Degraded,
    Disposed,
}

pub struct Compositor<G: PassGraph> {
    state: CompositorState,
    graph: Option<G>,
    inputs: GraphInputs,
    enabled: bool,
    rebuild_count: u32,
    degraded_warned: bool,
}

impl<G: PassGraph> Compositor<G> {
    pub fn new(width: u32, height: u32, settings: CompositorSettings) -> Self {
        Self {
            state: CompositorState::Uninitialized,
            graph: None,
            inputs: GraphInputs {
                width,
                height,
                settings,
            },
            enabled: settings.enabled,
            rebuild_count: 0,
            degraded_warned: false,
        }
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn inputs(&self) -> &GraphInputs {
        &self.inputs
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of graphs built so far.
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild_count
    }

    /// Skip the graph without disposing it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.inputs.settings.enabled = enabled;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let inputs = GraphInputs {
            width,
            height,
            ..self.inputs
        };
        self.update_inputs(inputs);
    }

    pub fn set_settings(&mut self, settings: CompositorSettings) {
        self.enabled = settings.enabled;
        let inputs = GraphInputs {
            settings,
            ..self.inputs
        };
        self.update_inputs(inputs);
    }

    fn update_inputs(&mut self, inputs: GraphInputs) {
        let changed = !self.inputs.same_graph(&inputs);
        self.inputs = inputs;
        if !changed {
            return;
        }
        match self.state {
            CompositorState::Built | CompositorState::Degraded => {
                self.state = CompositorState::NeedsRebuild;
                self.degraded_warned = false;
            }
            CompositorState::Uninitialized
            | CompositorState::NeedsRebuild
            | CompositorState::Disposed => {}
        }
    }

    /// Bring the graph up to date with the latest inputs.
    ///
    /// Builds only while enabled and with a non-empty viewport. Allocation
    /// failures leave the compositor degraded and are reported once; other
    /// errors are returned.
    pub fn prepare<F>(&mut self, factory: &mut F) -> Result<(), SwarmError>
    where
        F: GraphFactory<Graph = G>,
    {
        if !self.enabled || self.inputs.width == 0 || self.inputs.height == 0 {
            return Ok(());
        }
        match self.state {
            CompositorState::Uninitialized | CompositorState::NeedsRebuild => {}
            CompositorState::Built | CompositorState::Degraded | CompositorState::Disposed => {
                return Ok(())
            }
        }

        if let Some(old) = self.graph.take() {
            old.dispose();
        }

        match factory.build(&self.inputs) {
            Ok(graph) => {
                self.graph = Some(graph);
                self.state = CompositorState::Built;
                self.rebuild_count += 1;
                tracing::debug!(
                    width = self.inputs.width,
                    height = self.inputs.height,
                    builds = self.rebuild_count,
                    "compositor graph built"
                );
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                self.state = CompositorState::Degraded;
                if !self.degraded_warned {
                    tracing::warn!(error = %e, "compositor unavailable, presenting the scene directly");
                    self.degraded_warned = true;
                }
                Ok(())
            }
            Err(e) => {
                self.state = CompositorState::Degraded;
                Err(e)
            }
        }
    }

    /// The graph to run this frame, if any.
    pub fn graph(&self) -> Option<&G> {
        match (self.enabled, self.state) {
            (true, CompositorState::Built) => self.graph.as_ref(),
            _ => None,
        }
    }

    pub fn graph_mut(&mut self) -> Option<&mut G> {
        match (self.enabled, self.state) {
            (true, CompositorState::Built) => self.graph.as_mut(),
            _ => None,
        }
    }

    /// Tear down for good.
    pub fn dispose(&mut self) {
        if let Some(graph) = self.graph.take() {
            graph.dispose();
        }
        self.state = CompositorState::Disposed;
    }
}

impl<G: PassGraph> Drop for Compositor<G> {
    fn drop(&mut self) {
        if let Some(graph) = self.graph.take() {
            graph.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Three "targets" per graph, tracked in a shared live count.
    struct CountingGraph {
        live: Rc<Cell<i32>>,
        inputs: GraphInputs,
    }

    impl PassGraph for CountingGraph {
        fn dispose(self) {
            self.live.set(self.live.get() - 3);
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        live: Rc<Cell<i32>>,
        builds: u32,
        fail: bool,
    }

    impl GraphFactory for CountingFactory {
        type Graph = CountingGraph;

        fn build(&mut self, inputs: &GraphInputs) -> Result<CountingGraph, SwarmError> {
            if self.fail {
                return Err(SwarmError::ResourceAllocation {
                    resource: "test target",
                    message: "out of memory".into(),
                });
            }
            self.builds += 1;
            self.live.set(self.live.get() + 3);
            Ok(CountingGraph {
                live: self.live.clone(),
                inputs: *inputs,
            })
        }
    }

    fn compositor() -> Compositor<CountingGraph> {
        Compositor::new(800, 600, CompositorSettings::default())
    }

    #[test]
    fn test_first_prepare_builds_once() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        assert_eq!(compositor.state(), CompositorState::Uninitialized);
        assert!(compositor.graph().is_none());

        compositor.prepare(&mut factory).unwrap();
        compositor.prepare(&mut factory).unwrap();

        assert_eq!(compositor.state(), CompositorState::Built);
        assert_eq!(factory.builds, 1);
        assert_eq!(factory.live.get(), 3);
        assert!(compositor.graph().is_some());
    }

    #[test]
    fn test_resize_storm_leaves_one_graph() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();
        let clean = factory.live.get();

        for i in 0..50 {
            compositor.resize(800 + i, 600 + i);
        }
        assert_eq!(compositor.state(), CompositorState::NeedsRebuild);
        // Marking stale never builds.
        assert_eq!(factory.builds, 1);

        compositor.prepare(&mut factory).unwrap();
        assert_eq!(factory.builds, 2);
        assert_eq!(factory.live.get(), clean);

        let graph = compositor.graph().unwrap();
        assert_eq!((graph.inputs.width, graph.inputs.height), (849, 649));
    }

    #[test]
    fn test_same_size_does_not_rebuild() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();
        compositor.resize(800, 600);
        assert_eq!(compositor.state(), CompositorState::Built);
    }

    #[test]
    fn test_baked_settings_trigger_rebuild() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();

        let mut settings = CompositorSettings::default();
        settings.mix_ratio = 0.2;
        compositor.set_settings(settings);
        assert_eq!(compositor.state(), CompositorState::NeedsRebuild);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.graph().unwrap().inputs.settings.mix_ratio, 0.2);
        assert_eq!(compositor.rebuild_count(), 2);
    }

    #[test]
    fn test_disable_skips_without_disposing() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();

        compositor.set_enabled(false);
        assert!(compositor.graph().is_none());
        assert_eq!(compositor.state(), CompositorState::Built);
        assert_eq!(factory.live.get(), 3);

        compositor.set_enabled(true);
        compositor.prepare(&mut factory).unwrap();
        assert!(compositor.graph().is_some());
        assert_eq!(factory.builds, 1);
    }

    #[test]
    fn test_disabled_compositor_defers_build() {
        let mut factory = CountingFactory::default();
        let mut settings = CompositorSettings::default();
        settings.enabled = false;
        let mut compositor: Compositor<CountingGraph> = Compositor::new(800, 600, settings);

        compositor.prepare(&mut factory).unwrap();
        assert_eq!(factory.builds, 0);

        compositor.set_enabled(true);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(factory.builds, 1);
    }

    #[test]
    fn test_zero_viewport_defers_build() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.resize(0, 600);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.state(), CompositorState::Uninitialized);

        compositor.resize(640, 480);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.state(), CompositorState::Built);
    }

    #[test]
    fn test_allocation_failure_degrades_until_inputs_change() {
        let mut factory = CountingFactory {
            fail: true,
            ..Default::default()
        };
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.state(), CompositorState::Degraded);
        assert!(compositor.graph().is_none());

        factory.fail = false;
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.state(), CompositorState::Degraded);

        compositor.resize(1024, 768);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(compositor.state(), CompositorState::Built);
    }

    #[test]
    fn test_failed_rebuild_releases_old_graph() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();

        factory.fail = true;
        compositor.resize(1024, 768);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(factory.live.get(), 0);
    }

    #[test]
    fn test_dispose_and_drop_release_targets() {
        let mut factory = CountingFactory::default();
        let mut compositor = compositor();
        compositor.prepare(&mut factory).unwrap();
        compositor.dispose();
        assert_eq!(compositor.state(), CompositorState::Disposed);
        assert_eq!(factory.live.get(), 0);

        compositor.resize(10, 10);
        compositor.prepare(&mut factory).unwrap();
        assert_eq!(factory.builds, 1);

        let mut other = Compositor::new(800, 600, CompositorSettings::default());
        other.prepare(&mut factory).unwrap();
        assert_eq!(factory.live.get(), 3);
        drop(other);
        assert_eq!(factory.live.get(), 0);
    }
}
