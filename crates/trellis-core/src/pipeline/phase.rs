//! Phase graph: named ordering slots and their interceptor lists.
//!
//! A pipeline's phases form an ordered sequence supporting relative insertion
//! — `insert_before`/`insert_after` an existing anchor — so independently
//! authored features can place themselves without renumbering anything.
//! Phases are never deleted and their interceptor lists only grow.
//!
//! # Tie-break for same-anchor insertions
//!
//! Each phase records the anchor it was inserted relative to. When two phases
//! are inserted relative to the same anchor, they keep their insertion order
//! reading *outward* from the anchor: the first-inserted phase stays adjacent
//! to the anchor and later insertions land on the far side of earlier ones.
//!
//! ```text
//! insert_before("y", "x");   // [x, y]
//! insert_before("y", "z");   // [z, x, y]  — x keeps its place next to y
//! insert_after("y", "a");    // [z, x, y, a]
//! insert_after("y", "b");    // [z, x, y, a, b]
//! ```

use tracing::debug;

use super::chain::Interceptor;
use crate::error::PipelineError;

/// How a phase entered the graph; drives the same-anchor tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Relation {
    /// Registered at the end of the sequence.
    Terminal,
    /// Inserted relative to the named anchor phase.
    Before(String),
    After(String),
}

/// A named ordering slot holding zero or more interceptors.
pub struct Phase {
    name: String,
    relation: Relation,
    interceptors: Vec<Interceptor>,
}

impl Phase {
    /// The phase's unique name within its graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of interceptors installed into this phase.
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// The ordered sequence of phases making up a pipeline.
#[derive(Debug, Default)]
pub struct PhaseGraph {
    phases: Vec<Phase>,
}

impl PhaseGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == name)
    }

    fn check_new(&self, name: &str) -> Result<(), PipelineError> {
        if self.position(name).is_some() {
            return Err(PipelineError::DuplicatePhase(name.to_string()));
        }
        Ok(())
    }

    /// Returns `true` if a phase with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Phase names in execution order.
    pub fn phase_names(&self) -> Vec<String> {
        self.phases.iter().map(|p| p.name.clone()).collect()
    }

    /// Registers a phase at the end of the sequence.
    pub fn register(&mut self, name: impl Into<String>) -> Result<(), PipelineError> {
        let name = name.into();
        self.check_new(&name)?;
        debug!(phase = %name, "Phase registered");
        self.phases.push(Phase {
            name,
            relation: Relation::Terminal,
            interceptors: Vec::new(),
        });
        Ok(())
    }

    /// Inserts `new` before `existing`.
    ///
    /// Among several phases inserted before the same anchor, the
    /// first-inserted stays adjacent to the anchor (module docs).
    pub fn insert_before(
        &mut self,
        existing: &str,
        new: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let new = new.into();
        self.check_new(&new)?;
        let Some(anchor) = self.position(existing) else {
            return Err(PipelineError::PhaseNotFound(existing.to_string()));
        };

        let before_anchor = Relation::Before(existing.to_string());
        let mut index = anchor;
        while index > 0 && self.phases[index - 1].relation == before_anchor {
            index -= 1;
        }

        debug!(phase = %new, anchor = existing, "Phase inserted before anchor");
        self.phases.insert(
            index,
            Phase {
                name: new,
                relation: before_anchor,
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Inserts `new` after `existing`.
    ///
    /// Among several phases inserted after the same anchor, the
    /// first-inserted stays adjacent to the anchor (module docs).
    pub fn insert_after(
        &mut self,
        existing: &str,
        new: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let new = new.into();
        self.check_new(&new)?;
        let Some(anchor) = self.position(existing) else {
            return Err(PipelineError::PhaseNotFound(existing.to_string()));
        };

        let after_anchor = Relation::After(existing.to_string());
        let mut index = anchor + 1;
        while index < self.phases.len() && self.phases[index].relation == after_anchor {
            index += 1;
        }

        debug!(phase = %new, anchor = existing, "Phase inserted after anchor");
        self.phases.insert(
            index,
            Phase {
                name: new,
                relation: after_anchor,
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Appends an interceptor to the named phase.
    pub fn intercept(&mut self, phase: &str, interceptor: Interceptor) -> Result<(), PipelineError> {
        let Some(index) = self.position(phase) else {
            return Err(PipelineError::PhaseNotFound(phase.to_string()));
        };
        self.phases[index].interceptors.push(interceptor);
        debug!(
            phase = phase,
            total = self.phases[index].interceptors.len(),
            "Interceptor installed"
        );
        Ok(())
    }

    /// Produces the full interceptor sequence: phase order, then per-phase
    /// insertion order. Read-only; calling it twice without intervening
    /// mutation yields identical sequences.
    pub fn concatenate(&self) -> Vec<Interceptor> {
        self.phases
            .iter()
            .flat_map(|p| p.interceptors.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn noop() -> Interceptor {
        Arc::new(|call, next| Box::pin(async move { next.proceed(call).await }))
    }

    fn graph_with(names: &[&str]) -> PhaseGraph {
        let mut graph = PhaseGraph::new();
        for name in names {
            graph.register(*name).unwrap();
        }
        graph
    }

    #[test]
    fn insert_before_lands_adjacent_to_anchor() {
        let mut graph = graph_with(&["first", "anchor", "last"]);
        graph.insert_before("anchor", "new").unwrap();
        assert_eq!(graph.phase_names(), ["first", "new", "anchor", "last"]);
    }

    #[test]
    fn insert_after_lands_adjacent_to_anchor() {
        let mut graph = graph_with(&["first", "anchor", "last"]);
        graph.insert_after("anchor", "new").unwrap();
        assert_eq!(graph.phase_names(), ["first", "anchor", "new", "last"]);
    }

    #[test]
    fn same_anchor_ties_keep_first_inserted_adjacent() {
        let mut graph = graph_with(&["y"]);
        graph.insert_before("y", "x").unwrap();
        graph.insert_before("y", "z").unwrap();
        assert_eq!(graph.phase_names(), ["z", "x", "y"]);

        graph.insert_after("y", "a").unwrap();
        graph.insert_after("y", "b").unwrap();
        assert_eq!(graph.phase_names(), ["z", "x", "y", "a", "b"]);
    }

    #[test]
    fn earlier_insertions_keep_relative_order_across_later_ones() {
        let mut graph = graph_with(&["hub", "tail"]);
        graph.insert_before("tail", "x").unwrap();
        graph.insert_after("hub", "m").unwrap();
        graph.insert_before("tail", "z").unwrap();
        // x and z stay ordered outward from "tail"; m is untouched.
        assert_eq!(graph.phase_names(), ["hub", "m", "z", "x", "tail"]);
    }

    #[test]
    fn missing_anchor_is_rejected() {
        let mut graph = graph_with(&["only"]);
        assert_eq!(
            graph.insert_before("absent", "new"),
            Err(PipelineError::PhaseNotFound("absent".to_string()))
        );
        assert_eq!(
            graph.insert_after("absent", "new"),
            Err(PipelineError::PhaseNotFound("absent".to_string()))
        );
        assert_eq!(
            graph.intercept("absent", noop()),
            Err(PipelineError::PhaseNotFound("absent".to_string()))
        );
    }

    #[test]
    fn duplicate_phase_is_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        assert_eq!(
            graph.register("a"),
            Err(PipelineError::DuplicatePhase("a".to_string()))
        );
        assert_eq!(
            graph.insert_before("b", "a"),
            Err(PipelineError::DuplicatePhase("a".to_string()))
        );
        // The failed insertion left the graph untouched.
        assert_eq!(graph.phase_names(), ["a", "b"]);
    }

    #[test]
    fn concatenate_follows_phase_then_insertion_order() {
        let mut graph = graph_with(&["early", "late"]);
        graph.intercept("late", noop()).unwrap();
        graph.intercept("early", noop()).unwrap();
        graph.intercept("early", noop()).unwrap();

        let chain = graph.concatenate();
        assert_eq!(chain.len(), 3);
        // early's two interceptors come first, in insertion order.
        assert!(Arc::ptr_eq(&chain[2], &graph.phases[1].interceptors[0]));
        assert!(Arc::ptr_eq(&chain[0], &graph.phases[0].interceptors[0]));
        assert!(Arc::ptr_eq(&chain[1], &graph.phases[0].interceptors[1]));
    }

    #[test]
    fn concatenate_is_pure() {
        let mut graph = graph_with(&["p"]);
        graph.intercept("p", noop()).unwrap();
        graph.intercept("p", noop()).unwrap();

        let first = graph.concatenate();
        let second = graph.concatenate();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}
