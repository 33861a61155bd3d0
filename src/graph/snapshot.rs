use super::circuit::{CircuitState, LabelCounters};
use super::component::{Body, Component, ComponentKind, Position};
use super::gate::GateType;
use super::handles::{ComponentId, Slot};
use crate::data_structures::BitVector;
use crate::error::{ConfigurationError, SnapshotError, ValidationError};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Saved state of one component. `key` identifies it inside the snapshot, labels don't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotComponent {
    pub key: u64,
    pub kind: ComponentKind,
    pub label: String,
    pub bit_width: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_type: Option<GateType>,
    /// Value of inputs, clocks and outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BitVector>,
    /// Slot A, slot B and output of gates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_state: Option<[BitVector; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Clock period, serialized as seconds and nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Duration>,
}

/// Saved connection between the components with keys `source` and `target`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConnection {
    pub source: u64,
    pub target: u64,
    pub slot: Slot,
}

/// Self contained copy of the components and connections of a circuit, used to
/// save, undo and redo without depending on the engine's internals.
///
/// # Example
/// ```
/// # use circuitsim::{CircuitState, Snapshot};
/// let mut c = CircuitState::new();
/// let a = c.input();
/// let not = c.not1(a).unwrap();
///
/// let json = c.snapshot().to_json().unwrap();
/// c.delete(not).unwrap();
///
/// c.restore(&Snapshot::from_json(&json).unwrap()).unwrap();
/// assert_eq!(c.component(not).unwrap().label(), "NOT1");
/// assert_eq!(c.connections().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub components: Vec<SnapshotComponent>,
    pub connections: Vec<SnapshotConnection>,
    #[serde(default)]
    pub counters: LabelCounters,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Snapshot, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl SnapshotComponent {
    fn save(component: &Component) -> Self {
        let gate_state = match &component.body {
            Body::Gate { a, b, output, .. } => Some([a.clone(), b.clone(), output.clone()]),
            _ => None,
        };
        SnapshotComponent {
            key: component.id.key(),
            kind: component.kind(),
            label: component.label.clone(),
            bit_width: component.bit_width,
            gate_type: component.gate_type(),
            value: component.value().cloned(),
            gate_state,
            position: component.position,
            period: component.period(),
        }
    }

    /// Rebuilds the component, every vector is normalized to `bit_width`.
    fn load(&self, default_period: Duration) -> Result<Component, SnapshotError> {
        let width = self.bit_width;
        let value = || {
            self.value
                .as_ref()
                .map_or_else(|| BitVector::zeros(width), |v| v.resized(width))
        };
        let body = match self.kind {
            ComponentKind::Input => Body::Input { value: value() },
            ComponentKind::Output => Body::Output { value: value() },
            ComponentKind::Clock => {
                let period = self.period.unwrap_or(default_period);
                if period.is_zero() {
                    return Err(ValidationError::ZeroPeriod.into());
                }
                Body::Clock {
                    value: value(),
                    period,
                }
            }
            ComponentKind::Gate => {
                let ty = self.gate_type.ok_or(ConfigurationError::MissingGateType)?;
                let [a, b, output] = match &self.gate_state {
                    Some(state) => state.clone().map(|v| v.resized(width)),
                    None => [
                        BitVector::zeros(width),
                        BitVector::zeros(width),
                        BitVector::zeros(width),
                    ],
                };
                Body::Gate { ty, a, b, output }
            }
        };
        Ok(Component {
            id: ComponentId(self.key),
            label: self.label.clone(),
            bit_width: width,
            position: self.position,
            body,
        })
    }
}

impl CircuitState {
    /// Returns a copy of every component and connection, including gate state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            components: self
                .components
                .values()
                .map(SnapshotComponent::save)
                .collect(),
            connections: self
                .connections
                .values()
                .map(|c| SnapshotConnection {
                    source: c.source.key(),
                    target: c.target.component.key(),
                    slot: c.target.slot,
                })
                .collect(),
            counters: self.counters.clone(),
        }
    }

    /// Replaces the whole circuit with `snapshot`, clock timers restart.
    ///
    /// Components get back the ids they had when the snapshot was taken, connections get new ids.
    /// Nothing is propagated. On error the circuit is left untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let mut restored = CircuitState::with_config(self.config.clone())?;
        restored.next_component = self.next_component;
        restored.next_connection = self.next_connection;
        restored.counters = snapshot.counters.clone();

        let default_period = self.config.clock_period();
        let mut keys = HashSet::new();
        for saved in &snapshot.components {
            if !keys.insert(saved.key) {
                return Err(SnapshotError::DuplicateKey(saved.key));
            }
            restored.check_width(saved.bit_width)?;
            restored.insert_restored(saved.load(default_period)?);
        }
        for connection in &snapshot.connections {
            for key in [connection.source, connection.target] {
                if !keys.contains(&key) {
                    return Err(SnapshotError::DanglingKey(key));
                }
            }
            restored.connect(
                ComponentId(connection.source),
                ComponentId(connection.target),
                connection.slot,
            )?;
        }

        info!(
            "restored {} components and {} connections",
            restored.components.len(),
            restored.connections.len()
        );
        *self = restored;
        Ok(())
    }
}
