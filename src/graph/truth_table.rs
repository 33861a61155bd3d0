use super::circuit::CircuitState;
use super::component::ComponentKind;
use super::handles::ComponentId;
use crate::config::DEFAULT_MAX_TRUTH_TABLE_BITS;
use crate::data_structures::BitVector;
use crate::error::ValidationError;
use log::{info, warn};
use std::fmt::{self, Display, Formatter};

/// One input assignment and the state of every output LED once the circuit settled.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TruthTableRow {
    /// Bits of every non clock input, concatenated in declaration order.
    pub inputs: BitVector,
    /// One bit per output, 1 if any bit of its value was set.
    pub outputs: BitVector,
    /// False if the circuit didn't reach a fixed point for this assignment.
    pub settled: bool,
}

impl TruthTableRow {
    /// Returns the input bits followed by the output bits.
    pub fn bits(&self) -> String {
        format!("{}{}", self.inputs, self.outputs)
    }
}

/// Every input assignment of a circuit in ascending order together with its outputs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TruthTable {
    /// Label and width of every non clock input.
    pub input_columns: Vec<(String, usize)>,
    pub output_labels: Vec<String>,
    pub rows: Vec<TruthTableRow>,
}

impl TruthTable {
    /// Returns true if the circuit settled for every assignment.
    pub fn settled(&self) -> bool {
        self.rows.iter().all(|row| row.settled)
    }

    pub fn input_bits(&self) -> usize {
        self.input_columns.iter().map(|(_, width)| width).sum()
    }
}

impl Display for TruthTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let input_widths: Vec<usize> = self
            .input_columns
            .iter()
            .map(|(label, width)| label.chars().count().max(*width))
            .collect();
        let output_widths: Vec<usize> = self
            .output_labels
            .iter()
            .map(|label| label.chars().count().max(1))
            .collect();

        let inputs: Vec<String> = self
            .input_columns
            .iter()
            .zip(&input_widths)
            .map(|((label, _), w)| format!("{:<w$}", label, w = *w))
            .collect();
        let outputs: Vec<String> = self
            .output_labels
            .iter()
            .zip(&output_widths)
            .map(|(label, w)| format!("{:<w$}", label, w = *w))
            .collect();
        writeln!(f, "{} | {}", inputs.join(" "), outputs.join(" "))?;

        for row in &self.rows {
            let mut offset = 0;
            let mut inputs = Vec::with_capacity(self.input_columns.len());
            for ((_, width), w) in self.input_columns.iter().zip(&input_widths) {
                let bits = row.inputs.slice(offset..offset + width);
                offset += width;
                inputs.push(format!("{:<w$}", bits.to_string(), w = *w));
            }
            let outputs: Vec<String> = row
                .outputs
                .iter()
                .zip(&output_widths)
                .map(|(bit, w)| format!("{:<w$}", u8::from(bit), w = *w))
                .collect();
            write!(f, "{} | {}", inputs.join(" "), outputs.join(" "))?;
            if !row.settled {
                write!(f, " (unsettled)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl CircuitState {
    /// Enumerates every assignment of the non clock inputs and records which outputs light up.
    ///
    /// For every assignment the gates and outputs are zeroed and the circuit is
    /// [settled](CircuitState::settle) from scratch, so rows don't depend on each other.
    /// The values of inputs and clocks are restored afterwards.
    ///
    /// Fails without touching the circuit if there are no inputs, no outputs or
    /// more input bits than [Config::max_truth_table_bits](crate::Config::max_truth_table_bits).
    ///
    /// # Example
    /// ```
    /// # use circuitsim::{CircuitState, ComponentKind, SpawnOptions, Slot};
    /// let mut c = CircuitState::new();
    /// let bit = || SpawnOptions::default().bit_width(1);
    /// let a = c.spawn(ComponentKind::Input, bit().label("A")).unwrap();
    /// let b = c.spawn(ComponentKind::Input, bit().label("B")).unwrap();
    /// let or = c.or2(a, b).unwrap();
    /// let o = c.spawn(ComponentKind::Output, bit().label("O")).unwrap();
    /// c.connect(or, o, Slot::A).unwrap();
    ///
    /// let table = c.generate_truth_table().unwrap();
    /// let rows: Vec<_> = table.rows.iter().map(|row| row.bits()).collect();
    /// assert_eq!(rows, ["000", "011", "101", "111"]);
    /// ```
    pub fn generate_truth_table(&mut self) -> Result<TruthTable, ValidationError> {
        let inputs: Vec<(ComponentId, usize)> = self
            .components_of(ComponentKind::Input)
            .map(|c| (c.id(), c.bit_width()))
            .collect();
        let outputs: Vec<ComponentId> = self
            .components_of(ComponentKind::Output)
            .map(|c| c.id())
            .collect();
        if inputs.is_empty() {
            return Err(ValidationError::MissingInputs);
        }
        if outputs.is_empty() {
            return Err(ValidationError::MissingOutputs);
        }
        let bits: usize = inputs.iter().map(|(_, width)| width).sum();
        if bits > self.config.max_truth_table_bits {
            return Err(ValidationError::TooManyInputBits {
                bits,
                max: self.config.max_truth_table_bits,
            });
        }

        let input_columns = inputs
            .iter()
            .filter_map(|(id, width)| Some((self.component(*id)?.label().to_string(), *width)))
            .collect();
        let output_labels = outputs
            .iter()
            .filter_map(|id| Some(self.component(*id)?.label().to_string()))
            .collect();
        let saved: Vec<(ComponentId, BitVector)> = self
            .components()
            .filter(|c| matches!(c.kind(), ComponentKind::Input | ComponentKind::Clock))
            .filter_map(|c| Some((c.id(), c.value()?.clone())))
            .collect();

        let row_count = 1u64 << bits;
        info!("generating a truth table of {} rows", row_count);
        let mut rows =
            Vec::with_capacity(row_count.min(1u64 << DEFAULT_MAX_TRUTH_TABLE_BITS) as usize);
        for assignment in 0..row_count {
            let assignment = BitVector::from_u64(assignment, bits);
            let mut offset = 0;
            for (id, width) in &inputs {
                if let Some(value) = self.components.get_mut(id).and_then(|c| c.value_mut()) {
                    *value = assignment.slice(offset..offset + width);
                }
                offset += width;
            }
            for component in self.components.values_mut() {
                component.reset();
            }

            let settled = self.settle().is_ok();
            let lit = outputs
                .iter()
                .map(|id| self.component(*id).map_or(false, |o| o.is_lit()))
                .collect();
            rows.push(TruthTableRow {
                inputs: assignment,
                outputs: lit,
                settled,
            });
        }

        for (id, value) in saved {
            if let Some(v) = self.components.get_mut(&id).and_then(|c| c.value_mut()) {
                *v = value;
            }
        }
        if self.settle().is_err() {
            warn!("circuit didn't settle after restoring its inputs");
        }
        info!("generated a truth table of {} rows", rows.len());

        Ok(TruthTable {
            input_columns,
            output_labels,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::graph::{Slot, SpawnOptions};

    fn bit_input(c: &mut CircuitState, label: &str) -> ComponentId {
        c.spawn(
            ComponentKind::Input,
            SpawnOptions::default().bit_width(1).label(label),
        )
        .unwrap()
    }

    fn bit_output(c: &mut CircuitState, label: &str) -> ComponentId {
        c.spawn(
            ComponentKind::Output,
            SpawnOptions::default().bit_width(1).label(label),
        )
        .unwrap()
    }

    fn inverter() -> CircuitState {
        let mut c = CircuitState::new();
        let a = bit_input(&mut c, "A");
        let not = c.not1(a).unwrap();
        c.set_bit_width(not, 1).unwrap();
        let o = bit_output(&mut c, "O");
        c.connect(not, o, Slot::A).unwrap();
        c
    }

    fn rows(table: &TruthTable) -> Vec<String> {
        table.rows.iter().map(|row| row.bits()).collect()
    }

    #[test]
    fn test_not() {
        let mut c = inverter();
        let table = c.generate_truth_table().unwrap();
        assert_eq!(rows(&table), ["01", "10"]);
        assert!(table.settled());
    }

    #[test]
    fn test_and() {
        let mut c = CircuitState::new();
        let a = bit_input(&mut c, "A");
        let b = bit_input(&mut c, "B");
        let and = c.and2(a, b).unwrap();
        let o = bit_output(&mut c, "O");
        c.connect(and, o, Slot::A).unwrap();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(rows(&table), ["000", "010", "100", "111"]);
    }

    #[test]
    fn test_row_count_and_order() {
        let mut c = CircuitState::new();
        let a = c
            .spawn(ComponentKind::Input, SpawnOptions::default().bit_width(2))
            .unwrap();
        let b = bit_input(&mut c, "B");
        let xor = c.xor2(a, b).unwrap();
        let o = c.output();
        c.connect(xor, o, Slot::A).unwrap();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(table.input_bits(), 3);
        assert_eq!(table.rows.len(), 8);
        for (i, row) in table.rows.iter().enumerate() {
            assert_eq!(row.inputs.to_u64(), i as u64);
        }
        // a is 2 bits wide and b only drives the first bit of the xor.
        assert_eq!(table.rows[0b100].outputs.to_string(), "1");
        assert_eq!(table.rows[0b101].outputs.to_string(), "0");
        assert_eq!(table.rows[0b011].outputs.to_string(), "1");
    }

    #[test]
    fn test_outputs_in_declaration_order() {
        let mut c = CircuitState::new();
        let a = bit_input(&mut c, "A");
        let not = c.not1(a).unwrap();
        let o1 = bit_output(&mut c, "NotA");
        let o2 = bit_output(&mut c, "A");
        c.connect(not, o1, Slot::A).unwrap();
        c.connect(a, o2, Slot::A).unwrap();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(table.output_labels, ["NotA", "A"]);
        assert_eq!(rows(&table), ["010", "101"]);
    }

    #[test]
    fn test_restores_inputs_and_clocks() {
        let mut c = CircuitState::new();
        let a = c.input();
        let b = c.input();
        let k = c.clock();
        c.set_value(a, "1010").unwrap();
        c.set_value(b, "0111").unwrap();
        c.set_value(k, "1111").unwrap();
        let and = c.and2(a, b).unwrap();
        let or = c.or2(and, k).unwrap();
        let o = c.output();
        c.connect(or, o, Slot::A).unwrap();
        c.settle().unwrap();
        let before: Vec<_> = c.components().cloned().collect();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(table.rows.len(), 256);
        // The clock stays high while the inputs are enumerated.
        assert!(table.rows.iter().all(|row| row.outputs.to_string() == "1"));

        let after: Vec<_> = c.components().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_components() {
        let mut c = CircuitState::new();
        c.clock();
        c.output();
        assert_eq!(
            c.generate_truth_table(),
            Err(ValidationError::MissingInputs)
        );

        let mut c = CircuitState::new();
        let a = c.input();
        c.set_value(a, "1100").unwrap();
        assert_eq!(
            c.generate_truth_table(),
            Err(ValidationError::MissingOutputs)
        );
        assert_eq!(c.component(a).unwrap().value().unwrap().to_string(), "1100");
    }

    #[test]
    fn test_too_many_bits() {
        let config = Config {
            max_truth_table_bits: 4,
            ..Default::default()
        };
        let mut c = CircuitState::with_config(config).unwrap();
        let a = c.input();
        c.input();
        let o = c.output();
        c.connect(a, o, Slot::A).unwrap();
        assert_eq!(
            c.generate_truth_table(),
            Err(ValidationError::TooManyInputBits { bits: 8, max: 4 })
        );
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "0000");
    }

    #[test]
    fn test_bits_at_the_limit() {
        let config = Config {
            max_truth_table_bits: 4,
            ..Default::default()
        };
        let mut c = CircuitState::with_config(config).unwrap();
        let bits = || SpawnOptions::default().bit_width(2);
        let a = c.spawn(ComponentKind::Input, bits()).unwrap();
        let b = c.spawn(ComponentKind::Input, bits()).unwrap();
        let and = c.and2(a, b).unwrap();
        let o = c.output();
        c.connect(and, o, Slot::A).unwrap();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(table.input_bits(), 4);
        assert_eq!(table.rows.len(), 16);
        assert_eq!(table.rows[0b1111].outputs.to_string(), "1");
        assert_eq!(table.rows[0b1001].outputs.to_string(), "0");
    }

    #[test]
    fn test_limit_above_the_cap_is_refused() {
        let config = Config {
            max_truth_table_bits: 63,
            ..Default::default()
        };
        assert!(CircuitState::with_config(config).is_err());
    }

    #[test]
    fn test_unsettled_rows() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut c = inverter();
        let n1 = c.not();
        let n2 = c.not1(n1).unwrap();
        let n3 = c.not1(n2).unwrap();
        c.connect(n3, n1, Slot::A).unwrap();

        let table = c.generate_truth_table().unwrap();
        assert_eq!(rows(&table), ["01", "10"]);
        assert!(table.rows.iter().all(|row| !row.settled));
        assert!(!table.settled());
    }

    #[test]
    fn test_deterministic() {
        let mut c = inverter();
        let first = c.generate_truth_table().unwrap();
        let second = c.generate_truth_table().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_display() {
        let mut c = inverter();
        let table = c.generate_truth_table().unwrap();
        assert_eq!(table.to_string(), "A | O\n0 | 1\n1 | 0\n");

        let mut c = CircuitState::new();
        let a = c
            .spawn(
                ComponentKind::Input,
                SpawnOptions::default().bit_width(2).label("A"),
            )
            .unwrap();
        let o = bit_output(&mut c, "Carry");
        c.connect(a, o, Slot::A).unwrap();
        let table = c.generate_truth_table().unwrap();
        assert_eq!(
            table.to_string(),
            "A  | Carry\n00 | 0    \n01 | 0    \n10 | 1    \n11 | 1    \n"
        );
    }
}
