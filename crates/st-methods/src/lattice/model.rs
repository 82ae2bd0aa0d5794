//! Forward propagation of an asset lattice.
//!
//! [`StochasticTreeModel`] owns a [`Propagator`] and the [`BinomialTree`] it
//! fills. Each call to [`propagate`](StochasticTreeModel::propagate)
//! regenerates the time grid from the propagator's volatility surface,
//! re-shapes the tree, fills every node and bumps the model's [`Revision`].
//! Changing an input marks the model stale; derivatives priced on it compare
//! revisions to decide whether to re-price.

use std::sync::Arc;

use st_core::{LatticeSettings, Real, Revision, Time};
use st_math::TimeGrid;
use st_termstructures::VolatilitySurface;

use super::{BinomialTree, Propagator};

/// An asset lattice and the rule that fills it.
#[derive(Debug)]
pub struct StochasticTreeModel<P: Propagator> {
    propagator: P,
    duration: Time,
    initial_step: Time,
    settings: LatticeSettings,
    tree: BinomialTree,
    revision: Revision,
    stale: bool,
}

impl<P: Propagator> StochasticTreeModel<P> {
    /// Create a model covering `[0, duration]` whose first step is
    /// `initial_step`.
    ///
    /// The tree holds only the root until [`propagate`](Self::propagate) is
    /// called.
    pub fn new(propagator: P, duration: Time, initial_step: Time, settings: LatticeSettings) -> Self {
        Self {
            propagator,
            duration,
            initial_step,
            settings,
            tree: BinomialTree::new(TimeGrid::origin()),
            revision: Revision::new(),
            stale: true,
        }
    }

    /// Order in which the nodes of row `t` are filled.
    ///
    /// Ascending for state-independent rules. For state-dependent rules the
    /// spine `t / 2` comes first, then the nodes above it in ascending order,
    /// then the nodes below it in descending order.
    pub fn fill_order(t: usize, state_dependent: bool) -> Vec<usize> {
        if !state_dependent {
            return (0..=t).collect();
        }
        let spine = t / 2;
        std::iter::once(spine)
            .chain(spine + 1..=t)
            .chain((0..spine).rev())
            .collect()
    }

    /// Rebuild the grid and fill every node of the tree.
    ///
    /// Propagating twice with unchanged inputs yields identical node values.
    pub fn propagate(&mut self) -> &BinomialTree {
        let grid = self
            .propagator
            .volatility()
            .time_grid(self.duration, self.initial_step, &self.settings);
        self.tree.resize(grid);

        let state_dependent = self.propagator.is_state_dependent();
        for t in 0..self.tree.num_timesteps() {
            for i in Self::fill_order(t, state_dependent) {
                let value = self.propagator.value_at(&self.tree, t, i);
                self.tree.set_node_value(t, i, value);
            }
        }

        self.revision.bump();
        self.stale = false;
        tracing::debug!(
            rows = self.tree.num_timesteps(),
            revision = self.revision.value(),
            state_dependent,
            "asset lattice propagated"
        );
        &self.tree
    }

    /// The asset lattice as last propagated.
    pub fn tree(&self) -> &BinomialTree {
        &self.tree
    }

    /// Revision of the last propagation, unique to this model; a fresh
    /// revision is issued at construction.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// `true` if an input changed since the last propagation.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The propagator.
    pub fn propagator(&self) -> &P {
        &self.propagator
    }

    /// Lattice settings.
    pub fn settings(&self) -> &LatticeSettings {
        &self.settings
    }

    /// Time covered by the lattice.
    pub fn duration(&self) -> Time {
        self.duration
    }

    /// First step of the time grid.
    pub fn initial_step(&self) -> Time {
        self.initial_step
    }

    /// Replace the root value; takes effect on the next propagation.
    pub fn set_spot(&mut self, spot: Real) {
        self.propagator.set_spot(spot);
        self.stale = true;
    }

    /// Replace the volatility surface; takes effect on the next propagation.
    pub fn set_volatility(&mut self, volatility: Arc<dyn VolatilitySurface>) {
        self.propagator.set_volatility(volatility);
        self.stale = true;
    }

    /// Replace the lattice duration; takes effect on the next propagation.
    pub fn set_duration(&mut self, duration: Time) {
        self.duration = duration;
        self.stale = true;
    }
}
