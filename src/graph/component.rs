use super::gate::{evaluate, GateType};
use super::handles::{ComponentId, Slot};
use crate::data_structures::BitVector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumIter};

/// The four categories of components a circuit is made of.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum ComponentKind {
    Input,
    Clock,
    Gate,
    Output,
}

/// Where the editor placed a component, the engine only stores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Kind specific state of a component. Every [BitVector] is exactly as wide as the component.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum Body {
    Input {
        value: BitVector,
    },
    Clock {
        value: BitVector,
        period: Duration,
    },
    Gate {
        ty: GateType,
        a: BitVector,
        b: BitVector,
        output: BitVector,
    },
    Output {
        value: BitVector,
    },
}

/// A node of the circuit: an input switch, a clock, a gate or an output indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub(super) id: ComponentId,
    pub(super) label: String,
    pub(super) bit_width: usize,
    pub(super) position: Option<Position>,
    pub(super) body: Body,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ComponentKind {
        match self.body {
            Body::Input { .. } => ComponentKind::Input,
            Body::Clock { .. } => ComponentKind::Clock,
            Body::Gate { .. } => ComponentKind::Gate,
            Body::Output { .. } => ComponentKind::Output,
        }
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns the gate type if `self` is a gate.
    pub fn gate_type(&self) -> Option<GateType> {
        match &self.body {
            Body::Gate { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    /// Returns the value of inputs, clocks and outputs, None for gates.
    pub fn value(&self) -> Option<&BitVector> {
        match &self.body {
            Body::Input { value } | Body::Clock { value, .. } | Body::Output { value } => {
                Some(value)
            }
            Body::Gate { .. } => None,
        }
    }

    /// Returns the value written into `slot` if `self` is a gate.
    pub fn gate_input(&self, slot: Slot) -> Option<&BitVector> {
        match (&self.body, slot) {
            (Body::Gate { a, .. }, Slot::A) => Some(a),
            (Body::Gate { b, .. }, Slot::B) => Some(b),
            _ => None,
        }
    }

    /// Returns the bits this component drives into its outgoing connections,
    /// the output of a gate or the value of anything else.
    pub fn output_bits(&self) -> &BitVector {
        match &self.body {
            Body::Gate { output, .. } => output,
            Body::Input { value } | Body::Clock { value, .. } | Body::Output { value } => value,
        }
    }

    /// Returns the clock period if `self` is a clock.
    pub fn period(&self) -> Option<Duration> {
        match &self.body {
            Body::Clock { period, .. } => Some(*period),
            _ => None,
        }
    }

    /// Returns true if `self` is an output whose value has at least one bit set,
    /// this is the state of its LED.
    pub fn is_lit(&self) -> bool {
        matches!(&self.body, Body::Output { value } if value.any())
    }

    /// Returns true if a connection can end in `slot` of `self`.
    pub fn accepts(&self, slot: Slot) -> bool {
        match &self.body {
            Body::Input { .. } | Body::Clock { .. } => false,
            Body::Output { .. } => slot == Slot::A,
            Body::Gate { ty, .. } => slot == Slot::A || !ty.is_not(),
        }
    }

    pub(super) fn value_mut(&mut self) -> Option<&mut BitVector> {
        match &mut self.body {
            Body::Input { value } | Body::Clock { value, .. } | Body::Output { value } => {
                Some(value)
            }
            Body::Gate { .. } => None,
        }
    }

    /// Writes `bits` into `slot`, normalized to the width of `self`, gates recompute their output.
    ///
    /// Returns true if any stored bit changed. Slots that [aren't accepted](Component::accepts)
    /// are ignored.
    pub(super) fn write_slot(&mut self, slot: Slot, bits: &BitVector) -> bool {
        if !self.accepts(slot) {
            return false;
        }
        let width = self.bit_width;
        let bits = bits.resized(width);
        match &mut self.body {
            Body::Gate { ty, a, b, output } => {
                let target = if slot == Slot::A { &mut *a } else { &mut *b };
                let mut changed = *target != bits;
                *target = bits;

                let new_output = evaluate(*ty, a, b, width);
                changed |= *output != new_output;
                *output = new_output;
                changed
            }
            Body::Output { value } => {
                let changed = *value != bits;
                *value = bits;
                changed
            }
            Body::Input { .. } | Body::Clock { .. } => false,
        }
    }

    /// Re-pads or truncates every vector to `width`, gates recompute their output.
    pub(super) fn resize(&mut self, width: usize) {
        self.bit_width = width;
        match &mut self.body {
            Body::Input { value } | Body::Clock { value, .. } | Body::Output { value } => {
                value.resize(width)
            }
            Body::Gate { ty, a, b, output } => {
                a.resize(width);
                b.resize(width);
                *output = evaluate(*ty, a, b, width);
            }
        }
    }

    /// Zeroes the derived state: gate inputs and output, output values.
    pub(super) fn reset(&mut self) {
        match &mut self.body {
            Body::Gate { a, b, output, .. } => {
                a.clear();
                b.clear();
                output.clear();
            }
            Body::Output { value } => value.clear(),
            Body::Input { .. } | Body::Clock { .. } => {}
        }
    }

    pub(super) fn set_period(&mut self, new_period: Duration) -> bool {
        match &mut self.body {
            Body::Clock { period, .. } => {
                *period = new_period;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(ty: GateType, width: usize) -> Component {
        Component {
            id: ComponentId(0),
            label: "g".into(),
            bit_width: width,
            position: None,
            body: Body::Gate {
                ty,
                a: BitVector::zeros(width),
                b: BitVector::zeros(width),
                output: BitVector::zeros(width),
            },
        }
    }

    fn output(width: usize) -> Component {
        Component {
            id: ComponentId(1),
            label: "o".into(),
            bit_width: width,
            position: None,
            body: Body::Output {
                value: BitVector::zeros(width),
            },
        }
    }

    #[test]
    fn test_accepts() {
        assert!(gate(GateType::And, 1).accepts(Slot::B));
        assert!(!gate(GateType::Not, 1).accepts(Slot::B));
        assert!(gate(GateType::Not, 1).accepts(Slot::A));
        assert!(!output(1).accepts(Slot::B));
    }

    #[test]
    fn test_write_slot_evaluates_gate() {
        let mut g = gate(GateType::Or, 4);
        assert_eq!(g.write_slot(Slot::A, &"1".parse().unwrap()), true);
        assert_eq!(g.gate_input(Slot::A).unwrap().to_string(), "1000");
        assert_eq!(g.output_bits().to_string(), "1000");

        // Same bits again, nothing changes.
        assert_eq!(g.write_slot(Slot::A, &"1000".parse().unwrap()), false);

        assert_eq!(g.write_slot(Slot::B, &"010011".parse().unwrap()), true);
        assert_eq!(g.output_bits().to_string(), "1100");
    }

    #[test]
    fn test_write_rejected_slot() {
        let mut g = gate(GateType::Not, 2);
        assert_eq!(g.write_slot(Slot::B, &"11".parse().unwrap()), false);
        assert_eq!(g.gate_input(Slot::B).unwrap().to_string(), "00");
    }

    #[test]
    fn test_lit() {
        let mut o = output(3);
        assert_eq!(o.is_lit(), false);
        o.write_slot(Slot::A, &"001".parse().unwrap());
        assert_eq!(o.is_lit(), true);
        assert_eq!(gate(GateType::Nor, 1).is_lit(), false);
    }

    #[test]
    fn test_resize_and_reset() {
        let mut g = gate(GateType::Nand, 2);
        g.write_slot(Slot::A, &"11".parse().unwrap());
        g.resize(3);
        assert_eq!(g.bit_width(), 3);
        assert_eq!(g.gate_input(Slot::A).unwrap().to_string(), "110");
        assert_eq!(g.output_bits().to_string(), "111");

        g.resize(1);
        assert_eq!(g.output_bits().to_string(), "0");

        g.reset();
        assert_eq!(g.gate_input(Slot::A).unwrap(), &BitVector::zeros(1));
        assert_eq!(g.output_bits(), &BitVector::zeros(1));
    }
}
