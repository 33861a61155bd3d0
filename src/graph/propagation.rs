use super::circuit::{CircuitState, Connection};
use super::handles::ComponentId;
use crate::error::StabilizeError;
use indexmap::IndexSet;
use log::{debug, warn};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

#[cfg(feature = "debug_gates")]
use log::trace;

/// Order in which [CircuitState::propagate] visits the connections.
///
/// Computed lazily after every structural mutation.
#[derive(Debug, Clone)]
pub(super) struct EvaluationOrder {
    connections: Vec<Connection>,
    acyclic: bool,
}

impl EvaluationOrder {
    /// Sorts the connections by the topological rank of their source, keeping creation order
    /// between connections with the same source. A graph with a cycle has no such rank,
    /// it keeps plain creation order.
    fn compute(circuit: &CircuitState) -> EvaluationOrder {
        let graph = circuit.dependency_graph();
        let mut connections: Vec<Connection> = circuit.connections.values().copied().collect();

        let acyclic = match toposort(&graph, None) {
            Ok(sorted) => {
                let rank: HashMap<ComponentId, usize> =
                    sorted.into_iter().enumerate().map(|(i, id)| (id, i)).collect();
                connections.sort_by_key(|c| rank.get(&c.source).copied().unwrap_or(0));
                true
            }
            Err(cycle) => {
                debug!("circuit has a cycle through {}", cycle.node_id());
                false
            }
        };
        debug!(
            "evaluation order of {} connections, acyclic: {}",
            connections.len(),
            acyclic
        );
        EvaluationOrder {
            connections,
            acyclic,
        }
    }
}

impl CircuitState {
    /// Returns the wiring as a graph with an edge from the source to the target of every connection.
    fn dependency_graph(&self) -> DiGraphMap<ComponentId, ()> {
        let mut graph = DiGraphMap::with_capacity(self.components.len(), self.connections.len());
        for id in self.components.keys() {
            graph.add_node(*id);
        }
        for connection in self.connections.values() {
            graph.add_edge(connection.source, connection.target.component, ());
        }
        graph
    }

    fn take_order(&mut self) -> EvaluationOrder {
        match self.order.take() {
            Some(order) => order,
            None => EvaluationOrder::compute(self),
        }
    }

    /// Runs one settling pass: every connection copies the output of its source into its
    /// target slot, gates recompute their output as soon as one of their slots is written.
    ///
    /// Connections are visited in topological order when the circuit has no feedback loops,
    /// so one pass is enough to settle any acyclic circuit.
    /// Returns the components whose stored bits changed, in the order they changed.
    ///
    /// # Example
    /// ```
    /// # use circuitsim::{CircuitState, Slot};
    /// let mut c = CircuitState::new();
    /// let a = c.input();
    /// let o = c.output();
    /// c.connect(a, o, Slot::A).unwrap();
    ///
    /// assert!(c.propagate().contains(&o));
    /// assert!(c.propagate().is_empty());
    /// ```
    pub fn propagate(&mut self) -> IndexSet<ComponentId> {
        let order = self.take_order();
        let mut changed = IndexSet::new();

        for connection in &order.connections {
            let bits = match self.components.get(&connection.source) {
                Some(source) => source.output_bits().clone(),
                None => continue,
            };
            let target = match self.components.get_mut(&connection.target.component) {
                Some(target) => target,
                None => continue,
            };
            if target.write_slot(connection.target.slot, &bits) {
                #[cfg(feature = "debug_gates")]
                trace!(
                    "{}:{} <- {} slot {}, output {}",
                    target.kind(),
                    target.label(),
                    bits,
                    connection.target.slot,
                    target.output_bits()
                );
                changed.insert(target.id());
            }
        }

        self.order = Some(order);
        changed
    }

    /// Calls [CircuitState::propagate] until a pass changes nothing, a maximum of `max` times.
    /// Returns Ok(number of passes that changed something) if the circuit stabilized.
    ///
    /// Circuits might not stabilize if they have feedback loops like a ring of 3 not gates.
    ///
    /// # Example
    /// ```
    /// # use circuitsim::{CircuitState, Slot};
    /// let mut c = CircuitState::new();
    /// let a = c.input();
    /// let n1 = c.not1(a).unwrap();
    /// let n2 = c.not1(n1).unwrap();
    /// let n3 = c.not1(n2).unwrap();
    /// assert_eq!(c.stabilize(10), Ok(1));
    ///
    /// // Close the ring.
    /// c.connect(n3, n1, Slot::A).unwrap();
    /// assert!(c.stabilize(10).is_err());
    /// ```
    pub fn stabilize(&mut self, max: usize) -> Result<usize, StabilizeError> {
        for passes in 0..max {
            if self.propagate().is_empty() {
                return Ok(passes);
            }
        }
        warn!("circuit didn't stabilize after {} passes", max);
        Err(StabilizeError::NonConvergence { iterations: max })
    }

    /// [Stabilizes](CircuitState::stabilize) with the configured maximum number of passes.
    pub fn settle(&mut self) -> Result<usize, StabilizeError> {
        self.stabilize(self.config.max_stabilize_iterations)
    }

    /// Returns the components of one feedback loop, or None if the circuit is acyclic.
    pub fn find_cycle(&self) -> Option<Vec<ComponentId>> {
        let graph = self.dependency_graph();
        tarjan_scc(&graph).into_iter().find(|scc| match scc.as_slice() {
            [single] => graph.contains_edge(*single, *single),
            _ => true,
        })
    }

    /// Returns true if the circuit has no feedback loops.
    pub fn is_acyclic(&mut self) -> bool {
        let order = self.take_order();
        let acyclic = order.acyclic;
        self.order = Some(order);
        acyclic
    }
}

/// Asserts that the circuit stabilizes after exactly `expected` passes that changed something.
#[macro_export]
macro_rules! assert_stabilizes {
    ($c:expr, $expected:expr) => {
        let actual = $c
            .stabilize(1000)
            .expect("Circuit didn't stabilize after 1000 passes");

        assert!(
            actual == $expected,
            "Circuit stabilized after {} passes, expected: {}",
            actual,
            $expected
        );
    };
}
