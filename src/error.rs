use crate::graph::{ComponentId, ComponentKind, ConnectionId, Slot};
use thiserror::Error;

/// Invalid request that was rejected without modifying the circuit.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("at least one non-clock input is required")]
    MissingInputs,
    #[error("at least one output is required")]
    MissingOutputs,
    #[error("invalid bit width {width}, expected 1..={max}")]
    InvalidBitWidth { width: usize, max: usize },
    #[error("{bits} input bits would need {} truth table rows, the limit is {max} bits", rows_for(.bits))]
    TooManyInputBits { bits: usize, max: usize },
    #[error("malformed bits {bits:?} for a {width} bit value")]
    MalformedBits { bits: String, width: usize },
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
    #[error("{kind} {label} has no value")]
    NoValue { kind: ComponentKind, label: String },
    #[error("only clocks have a period, {0} is not a clock")]
    NotAClock(ComponentId),
    #[error("a clock period must be longer than zero")]
    ZeroPeriod,
    #[error("{kind} components have no {option} option")]
    OptionNotApplicable {
        kind: ComponentKind,
        option: &'static str,
    },
}

fn rows_for(bits: &usize) -> String {
    match 1u128.checked_shl(*bits as u32) {
        Some(rows) => rows.to_string(),
        None => format!("2^{}", bits),
    }
}

/// Wiring request that can't be honoured.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ConnectionError {
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    #[error("invalid slot number {0}, slots are 1 and 2")]
    InvalidSlot(u8),
    #[error("{kind} {label} has no input slot {slot}")]
    SlotUnavailable {
        kind: ComponentKind,
        label: String,
        slot: Slot,
    },
}

/// Unusable configuration: unknown gate names or bad configuration documents.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown gate type {0:?}")]
    UnknownGateType(String),
    #[error("a gate needs a gate type")]
    MissingGateType,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The circuit kept changing after the allowed number of propagation passes.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum StabilizeError {
    #[error("circuit didn't stabilize after {iterations} passes")]
    NonConvergence { iterations: usize },
}

/// Snapshot that can't be encoded, decoded or restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot references unknown component key {0}")]
    DanglingKey(u64),
    #[error("duplicate component key {0} in snapshot")]
    DuplicateKey(u64),
    #[error("snapshot contains an invalid component: {0}")]
    Validation(#[from] ValidationError),
    #[error("snapshot contains an invalid connection: {0}")]
    Connection(#[from] ConnectionError),
    #[error("snapshot contains an invalid gate: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Any error returned by the engine. None of them leave the circuit in an unusable state.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Stabilize(#[from] StabilizeError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::TooManyInputBits { bits: 20, max: 16 }.to_string(),
            "20 input bits would need 1048576 truth table rows, the limit is 16 bits"
        );
        assert_eq!(
            ConnectionError::SlotUnavailable {
                kind: ComponentKind::Output,
                label: "Output1".into(),
                slot: Slot::B,
            }
            .to_string(),
            "Output Output1 has no input slot B"
        );
        assert_eq!(
            Error::from(ConfigurationError::UnknownGateType("MUX".into())).to_string(),
            "unknown gate type \"MUX\""
        );
    }

    #[test]
    fn test_huge_row_count() {
        assert_eq!(rows_for(&200), "2^200");
    }
}
