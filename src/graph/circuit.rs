use super::clock::ClockTimers;
use super::component::{Body, Component, ComponentKind, Position};
use super::gate::GateType;
use super::handles::*;
use super::propagation::EvaluationOrder;
use crate::config::Config;
use crate::data_structures::BitVector;
use crate::error::{ConfigurationError, ConnectionError, Result, ValidationError};
use casey::pascal;
use concat_idents::concat_idents;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::time::Duration;

use GateType::*;

/// Creates gatename and gatename2 constructors for every gate type with two inputs.
/// The constructors create gates with 0 and 2 connected inputs respectively.
macro_rules! gate_constructors {
    ($name:ident,$($rest:ident),*) => {
        gate_constructors!($name);
        gate_constructors!($($rest),*);
    };
    ($name:ident) => {
        #[doc = concat!(
            "Returns the [ComponentId] of a new unconnected `",
            stringify!($name),
            "` gate of the default width."
        )]
        pub fn $name(&mut self) -> ComponentId {
            self.gate(pascal!($name))
        }

        concat_idents!(name2 = $name, 2 {
            /// Returns the [ComponentId] of a new gate of the default width,
            /// with the outputs of `a` and `b` wired into slots A and B.
            ///
            /// Nothing is created if `a` or `b` doesn't exist.
            pub fn name2(&mut self, a: ComponentId, b: ComponentId) -> Result<ComponentId, ConnectionError> {
                self.gate2(pascal!($name), a, b)
            }
        });
    };
}

/// Directed edge from the single output of `source` into one slot of another component.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Connection {
    pub(super) id: ConnectionId,
    pub(super) source: ComponentId,
    pub(super) target: Port,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
    pub fn source(&self) -> ComponentId {
        self.source
    }
    pub fn target(&self) -> ComponentId {
        self.target.component
    }
    pub fn slot(&self) -> Slot {
        self.target.slot
    }
}

/// Optional attributes of a new component, anything left out gets a default.
///
/// # Example
/// ```
/// # use circuitsim::{CircuitState, ComponentKind, GateType, SpawnOptions};
/// let mut c = CircuitState::new();
/// let xor = c
///     .spawn(ComponentKind::Gate, SpawnOptions::default().gate(GateType::Xor).bit_width(8))
///     .unwrap();
///
/// assert_eq!(c.component(xor).unwrap().label(), "XOR1");
/// assert_eq!(c.component(xor).unwrap().bit_width(), 8);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnOptions {
    pub label: Option<String>,
    pub bit_width: Option<usize>,
    pub value: Option<String>,
    pub gate_type: Option<GateType>,
    pub position: Option<Position>,
    pub period: Option<Duration>,
}

impl SpawnOptions {
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
    pub fn bit_width(mut self, width: usize) -> Self {
        self.bit_width = Some(width);
        self
    }
    pub fn value<S: Into<String>>(mut self, value: S) -> Self {
        self.value = Some(value.into());
        self
    }
    pub fn gate(mut self, ty: GateType) -> Self {
        self.gate_type = Some(ty);
        self
    }
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }
    pub fn period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Returns the name of the first option set that components of `kind` don't have.
    fn inapplicable(&self, kind: ComponentKind) -> Option<&'static str> {
        if self.gate_type.is_some() && kind != ComponentKind::Gate {
            Some("gate_type")
        } else if self.value.is_some() && kind == ComponentKind::Gate {
            Some("value")
        } else if self.period.is_some() && kind != ComponentKind::Clock {
            Some("period")
        } else {
            None
        }
    }
}

/// Per category counters used to give new components their `Input1`, `AND2`... labels.
/// Gates of every type share one counter.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LabelCounters {
    pub input: u64,
    pub clock: u64,
    pub gate: u64,
    pub output: u64,
}

impl LabelCounters {
    fn next_label(&mut self, kind: ComponentKind, gate_type: Option<GateType>) -> String {
        let (counter, prefix) = match kind {
            ComponentKind::Input => (&mut self.input, "Input".to_string()),
            ComponentKind::Clock => (&mut self.clock, "Clock".to_string()),
            ComponentKind::Output => (&mut self.output, "Output".to_string()),
            ComponentKind::Gate => (
                &mut self.gate,
                gate_type.map_or_else(|| "Gate".to_string(), |ty| ty.to_string()),
            ),
        };
        *counter += 1;
        format!("{}{}", prefix, counter)
    }
}

/// A whole circuit: the component registry, the connection graph and everything
/// needed to evaluate them.
///
/// Components and connections keep their creation order, which is the declaration order
/// of the truth table columns.
///
/// # Examples
/// A one bit inverter.
/// ```
/// # use circuitsim::{CircuitState, SpawnOptions, ComponentKind};
/// let mut c = CircuitState::new();
///
/// let a = c.spawn(ComponentKind::Input, SpawnOptions::default().bit_width(1).value("0")).unwrap();
/// let not = c.not1(a).unwrap();
/// c.set_bit_width(not, 1).unwrap();
/// let o = c.spawn(ComponentKind::Output, SpawnOptions::default().bit_width(1)).unwrap();
/// c.connect_slot(not, o, 1).unwrap();
///
/// c.propagate();
/// assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "1");
///
/// c.toggle_value(a).unwrap();
/// c.propagate();
/// assert_eq!(c.component(o).unwrap().is_lit(), false);
/// ```
///
/// Gates can be wired while they are created.
/// ```
/// # use circuitsim::CircuitState;
/// let mut c = CircuitState::new();
/// let a = c.input();
/// let b = c.input();
/// c.set_value(a, "0011").unwrap();
/// c.set_value(b, "0101").unwrap();
///
/// let xor = c.xor2(a, b).unwrap();
/// let o = c.output();
/// c.connect_slot(xor, o, 1).unwrap();
///
/// c.stabilize(10).unwrap();
/// assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "0110");
/// ```
#[derive(Debug, Clone)]
pub struct CircuitState {
    pub(super) config: Config,
    pub(super) components: IndexMap<ComponentId, Component>,
    pub(super) connections: IndexMap<ConnectionId, Connection>,
    slots: HashMap<Port, ConnectionId>,
    pub(super) counters: LabelCounters,
    pub(super) next_component: u64,
    pub(super) next_connection: u64,
    pub(super) order: Option<EvaluationOrder>,
    pub(super) timers: ClockTimers,
}

impl CircuitState {
    /// Returns an empty circuit with the default [Config].
    pub fn new() -> CircuitState {
        Self::from_valid_config(Config::default())
    }

    /// Returns an empty circuit using `config`.
    pub fn with_config(config: Config) -> Result<CircuitState, ConfigurationError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: Config) -> CircuitState {
        CircuitState {
            config,
            components: Default::default(),
            connections: Default::default(),
            slots: Default::default(),
            counters: Default::default(),
            next_component: 0,
            next_connection: 0,
            order: None,
            timers: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Removes every component, connection and clock timer and restarts the labels.
    pub fn clear(&mut self) {
        debug!("clearing {} components", self.components.len());
        self.components.clear();
        self.connections.clear();
        self.slots.clear();
        self.counters = Default::default();
        self.timers.clear();
        self.invalidate_order();
    }

    /// Creates a new component of `kind`.
    ///
    /// New inputs and clocks hold the value 1 (`0…01`), gates and outputs start at 0.
    /// A [ComponentKind::Gate] needs [SpawnOptions::gate_type], options that `kind`
    /// doesn't have are rejected.
    pub fn spawn(&mut self, kind: ComponentKind, options: SpawnOptions) -> Result<ComponentId> {
        if let Some(option) = options.inapplicable(kind) {
            return Err(ValidationError::OptionNotApplicable { kind, option }.into());
        }
        let SpawnOptions {
            label,
            bit_width,
            value,
            gate_type,
            position,
            period,
        } = options;

        let width = bit_width.unwrap_or(self.config.default_bit_width);
        self.check_width(width)?;
        if period == Some(Duration::ZERO) {
            return Err(ValidationError::ZeroPeriod.into());
        }
        let value = match value {
            Some(value) => Some(self.parse_bits(&value, width)?),
            None => None,
        };
        let body = self.new_body(kind, gate_type, width, value, period)?;
        let label = label.unwrap_or_else(|| self.counters.next_label(kind, gate_type));
        Ok(self.insert_component(label, width, position, body))
    }

    /// Builds the state of a new component, anything left out gets its default.
    fn new_body(
        &self,
        kind: ComponentKind,
        gate_type: Option<GateType>,
        width: usize,
        value: Option<BitVector>,
        period: Option<Duration>,
    ) -> Result<Body, ConfigurationError> {
        let value = value.unwrap_or_else(|| match kind {
            ComponentKind::Input | ComponentKind::Clock => BitVector::from_u64(1, width),
            ComponentKind::Gate | ComponentKind::Output => BitVector::zeros(width),
        });
        Ok(match kind {
            ComponentKind::Input => Body::Input { value },
            ComponentKind::Clock => Body::Clock {
                value,
                period: period.unwrap_or_else(|| self.config.clock_period()),
            },
            ComponentKind::Output => Body::Output { value },
            ComponentKind::Gate => Body::Gate {
                ty: gate_type.ok_or(ConfigurationError::MissingGateType)?,
                a: BitVector::zeros(width),
                b: BitVector::zeros(width),
                output: BitVector::zeros(width),
            },
        })
    }

    fn insert_component(
        &mut self,
        label: String,
        bit_width: usize,
        position: Option<Position>,
        body: Body,
    ) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;

        let component = Component {
            id,
            label,
            bit_width,
            position,
            body,
        };
        if let Some(period) = component.period() {
            self.timers.arm(id, period);
        }
        debug!("spawned {} {} {}", component.kind(), component.label, id);
        self.components.insert(id, component);
        self.invalidate_order();
        id
    }

    /// Inserts a component that already has an id, later ids are allocated past it.
    pub(super) fn insert_restored(&mut self, component: Component) {
        self.next_component = self.next_component.max(component.id.0 + 1);
        if let Some(period) = component.period() {
            self.timers.arm(component.id, period);
        }
        self.components.insert(component.id, component);
        self.invalidate_order();
    }

    /// Spawns a component of `kind` with the defaults.
    fn spawn_default(&mut self, kind: ComponentKind, gate_type: Option<GateType>) -> ComponentId {
        let width = self.config.default_bit_width;
        let body = match self.new_body(kind, gate_type, width, None, None) {
            Ok(body) => body,
            // Only reachable for a gate without a type.
            Err(_) => Body::Gate {
                ty: And,
                a: BitVector::zeros(width),
                b: BitVector::zeros(width),
                output: BitVector::zeros(width),
            },
        };
        let label = self.counters.next_label(kind, gate_type);
        self.insert_component(label, width, None, body)
    }

    /// Returns the [ComponentId] of a new input switch with the default options.
    pub fn input(&mut self) -> ComponentId {
        self.spawn_default(ComponentKind::Input, None)
    }

    /// Returns the [ComponentId] of a new clock with the default options.
    pub fn clock(&mut self) -> ComponentId {
        self.spawn_default(ComponentKind::Clock, None)
    }

    /// Returns the [ComponentId] of a new output indicator with the default options.
    pub fn output(&mut self) -> ComponentId {
        self.spawn_default(ComponentKind::Output, None)
    }

    /// Returns the [ComponentId] of a new unconnected `ty` gate of the default width.
    pub fn gate(&mut self, ty: GateType) -> ComponentId {
        self.spawn_default(ComponentKind::Gate, Some(ty))
    }

    fn gate2(
        &mut self,
        ty: GateType,
        a: ComponentId,
        b: ComponentId,
    ) -> Result<ComponentId, ConnectionError> {
        self.get_connectable(a)?;
        self.get_connectable(b)?;
        let gate = self.gate(ty);
        self.connect(a, gate, Slot::A)?;
        self.connect(b, gate, Slot::B)?;
        Ok(gate)
    }

    /// Returns the [ComponentId] of a new unconnected not gate of the default width.
    pub fn not(&mut self) -> ComponentId {
        self.gate(Not)
    }

    /// Returns the [ComponentId] of a new not gate of the default width with the output of `a` wired into it.
    ///
    /// Nothing is created if `a` doesn't exist.
    pub fn not1(&mut self, a: ComponentId) -> Result<ComponentId, ConnectionError> {
        self.get_connectable(a)?;
        let gate = self.gate(Not);
        self.connect(a, gate, Slot::A)?;
        Ok(gate)
    }

    // Create constructors for all gate types with two inputs.
    gate_constructors!(and, or, nand, nor, xor, xnor);

    fn get_connectable(&self, id: ComponentId) -> Result<&Component, ConnectionError> {
        self.components
            .get(&id)
            .ok_or(ConnectionError::UnknownComponent(id))
    }

    /// Wires the output of `source` into `slot` of `target`.
    ///
    /// A slot holds at most one connection: if `slot` is already wired, the old connection
    /// is replaced. Fails if `target` has no such slot, like slot B of a not gate or
    /// any slot of an input.
    pub fn connect(
        &mut self,
        source: ComponentId,
        target: ComponentId,
        slot: Slot,
    ) -> Result<ConnectionId, ConnectionError> {
        self.get_connectable(source)?;
        let target_component = self.get_connectable(target)?;
        if !target_component.accepts(slot) {
            return Err(ConnectionError::SlotUnavailable {
                kind: target_component.kind(),
                label: target_component.label.clone(),
                slot,
            });
        }

        let port = Port {
            component: target,
            slot,
        };
        if let Some(old) = self.slots.get(&port).copied() {
            debug!("{} replaces {} into {} slot {}", source, old, target, slot);
            self.connections.shift_remove(&old);
        }

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        self.connections.insert(
            id,
            Connection {
                id,
                source,
                target: port,
            },
        );
        self.slots.insert(port, id);
        self.invalidate_order();
        debug!("connected {} -> {} slot {} as {}", source, target, slot, id);
        Ok(id)
    }

    /// [Connects](CircuitState::connect) using the slot number shown in the editor, 1 or 2.
    pub fn connect_slot(
        &mut self,
        source: ComponentId,
        target: ComponentId,
        slot: u8,
    ) -> Result<ConnectionId, ConnectionError> {
        let slot = Slot::try_from(slot).map_err(|_| ConnectionError::InvalidSlot(slot))?;
        self.connect(source, target, slot)
    }

    /// Removes the connection `id`, the values already written through it stay where they are.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<Connection, ConnectionError> {
        let connection = self
            .connections
            .shift_remove(&id)
            .ok_or(ConnectionError::UnknownConnection(id))?;
        self.slots.remove(&connection.target);
        self.invalidate_order();
        debug!("disconnected {}", id);
        Ok(connection)
    }

    /// Removes `id` and every connection from or to it, cancelling its timer if it is a clock.
    ///
    /// Nothing is propagated, components downstream keep their last values.
    pub fn delete(&mut self, id: ComponentId) -> Result<Component, ValidationError> {
        let component = self
            .components
            .shift_remove(&id)
            .ok_or(ValidationError::UnknownComponent(id))?;

        let attached: SmallVec<[ConnectionId; 4]> = self
            .connections
            .values()
            .filter(|c| c.source == id || c.target.component == id)
            .map(|c| c.id)
            .collect();
        for connection in attached {
            if let Some(connection) = self.connections.shift_remove(&connection) {
                self.slots.remove(&connection.target);
            }
        }
        self.timers.cancel(id);
        self.invalidate_order();
        debug!("deleted {} {}", component.kind(), component.label);
        Ok(component)
    }

    fn get_mut(&mut self, id: ComponentId) -> Result<&mut Component, ValidationError> {
        self.components
            .get_mut(&id)
            .ok_or(ValidationError::UnknownComponent(id))
    }

    pub(super) fn check_width(&self, width: usize) -> Result<(), ValidationError> {
        if width == 0 || width > self.config.max_bit_width {
            return Err(ValidationError::InvalidBitWidth {
                width,
                max: self.config.max_bit_width,
            });
        }
        Ok(())
    }

    /// Parses `bits` for a `width` bit value according to [Config::strict_bits].
    fn parse_bits(&self, bits: &str, width: usize) -> Result<BitVector, ValidationError> {
        if self.config.strict_bits {
            BitVector::strict(bits, width)
        } else {
            Ok(BitVector::normalized(bits, width))
        }
    }

    /// Changes the width of `id`, every value it holds is padded with zeros on the right or truncated.
    pub fn set_bit_width(&mut self, id: ComponentId, width: usize) -> Result<(), ValidationError> {
        self.check_width(width)?;
        self.get_mut(id)?.resize(width);
        Ok(())
    }

    fn value_mut(&mut self, id: ComponentId) -> Result<&mut BitVector, ValidationError> {
        let component = self.get_mut(id)?;
        let kind = component.kind();
        let label = component.label.clone();
        component
            .value_mut()
            .ok_or(ValidationError::NoValue { kind, label })
    }

    /// Sets the value of an input, clock or output from a string of bits.
    pub fn set_value(&mut self, id: ComponentId, bits: &str) -> Result<(), ValidationError> {
        let width = self.get(id)?.bit_width;
        let bits = self.parse_bits(bits, width)?;
        *self.value_mut(id)? = bits;
        Ok(())
    }

    /// Sets the value of an input, clock or output, `bits` is resized to the width of `id`.
    pub fn set_value_bits(
        &mut self,
        id: ComponentId,
        bits: &BitVector,
    ) -> Result<(), ValidationError> {
        let width = self.get(id)?.bit_width;
        *self.value_mut(id)? = bits.resized(width);
        Ok(())
    }

    /// Flips every bit of the value of an input, clock or output.
    pub fn toggle_value(&mut self, id: ComponentId) -> Result<(), ValidationError> {
        self.value_mut(id)?.toggle();
        Ok(())
    }

    /// Changes the display label of `id`. Labels are never used to identify components.
    pub fn set_label<S: Into<String>>(
        &mut self,
        id: ComponentId,
        label: S,
    ) -> Result<(), ValidationError> {
        self.get_mut(id)?.label = label.into();
        Ok(())
    }

    pub fn set_position(&mut self, id: ComponentId, x: f32, y: f32) -> Result<(), ValidationError> {
        self.get_mut(id)?.position = Some(Position { x, y });
        Ok(())
    }

    /// Changes the period of clock `id`, its timer restarts.
    pub fn set_period(&mut self, id: ComponentId, period: Duration) -> Result<(), ValidationError> {
        if period.is_zero() {
            return Err(ValidationError::ZeroPeriod);
        }
        if !self.get_mut(id)?.set_period(period) {
            return Err(ValidationError::NotAClock(id));
        }
        self.timers.arm(id, period);
        Ok(())
    }

    fn get(&self, id: ComponentId) -> Result<&Component, ValidationError> {
        self.components
            .get(&id)
            .ok_or(ValidationError::UnknownComponent(id))
    }

    /// Returns the component `id` if it exists.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Returns the first component labelled `label`, labels aren't guaranteed to be unique.
    pub fn component_by_label(&self, label: &str) -> Option<&Component> {
        self.components.values().find(|c| c.label == label)
    }

    /// Returns every component in creation order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Returns the connection `id` if it exists.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Returns every connection in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the connection wired into `slot` of `target`.
    pub fn incoming(&self, target: ComponentId, slot: Slot) -> Option<&Connection> {
        let port = Port {
            component: target,
            slot,
        };
        self.slots.get(&port).and_then(|id| self.connections.get(id))
    }

    /// Returns the connections driven by `source`.
    pub fn outgoing(&self, source: ComponentId) -> SmallVec<[ConnectionId; 4]> {
        self.connections
            .values()
            .filter(|c| c.source == source)
            .map(|c| c.id)
            .collect()
    }

    /// Returns the components of `kind` in creation order.
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.components.values().filter(move |c| c.kind() == kind)
    }

    /// Returns the number of components in the circuit.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(super) fn invalidate_order(&mut self) {
        self.order = None;
    }

    /// Returns the "full name" of `id` in format "TYPE:LABEL", where TYPE is the gate type
    /// of gates and the kind of anything else.
    fn full_name(&self, component: &Component) -> String {
        match component.gate_type() {
            Some(ty) => format!("{}:{}", ty, component.label),
            None => format!("{}:{}", component.kind(), component.label),
        }
    }

    /// Returns the wiring in [dot](https://en.wikipedia.org/wiki/DOT_(graph_description_language)) format,
    /// edges are labelled with the slot they end in.
    pub fn to_dot(&self) -> String {
        use petgraph::dot::Dot;
        let mut graph = petgraph::Graph::<String, Slot>::new();
        let mut index = HashMap::new();
        for (id, component) in &self.components {
            index.insert(*id, graph.add_node(self.full_name(component)));
        }
        for connection in self.connections.values() {
            graph.add_edge(
                index[&connection.source],
                index[&connection.target.component],
                connection.target.slot,
            );
        }
        format!("{}", Dot::new(&graph))
    }

    /// Dumps [CircuitState::to_dot] to `path`, to be visualized by many supported tools.
    pub fn dump_dot<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_dot())
    }
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::new()
    }
}
