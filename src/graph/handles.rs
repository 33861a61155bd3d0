use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use strum_macros::{Display as StrumDisplay, EnumIter};

/// Immutable opaque identifier of a component in a [CircuitState](super::CircuitState).
///
/// Ids are handed out sequentially and never reused by the same circuit,
/// so a stale id simply stops resolving once its component is deleted.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ComponentId(pub(super) u64);

/// Identifier of a connection in a [CircuitState](super::CircuitState).
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConnectionId(pub(super) u64);

impl ComponentId {
    /// Returns the inner key, stable for the lifetime of the component.
    pub fn key(&self) -> u64 {
        self.0
    }
}

impl ConnectionId {
    /// Returns the inner key.
    pub fn key(&self) -> u64 {
        self.0
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// Numbered input terminal of a component.
///
/// Gates have two slots, except NOT which only has [Slot::A]. Outputs only have [Slot::A].
///
/// # Example
/// ```
/// # use circuitsim::Slot;
/// assert_eq!(Slot::try_from(2u8).unwrap(), Slot::B);
/// assert!(Slot::try_from(3u8).is_err());
/// assert_eq!(u8::from(Slot::A), 1);
/// ```
#[repr(u8)]
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    IntoPrimitive,
    TryFromPrimitive,
    StrumDisplay,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Slot {
    A = 1,
    B = 2,
}

/// Target end of a connection: a component and one of its slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Port {
    pub component: ComponentId,
    pub slot: Slot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_slot_numbers() {
        let numbers: Vec<u8> = Slot::iter().map(u8::from).collect();
        assert_eq!(numbers, [1, 2]);
        assert!(Slot::try_from(0u8).is_err());
    }

    #[test]
    fn test_slot_json() {
        assert_eq!(serde_json::to_string(&Slot::B).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Slot>("1").unwrap(), Slot::A);
        assert!(serde_json::from_str::<Slot>("7").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ComponentId(3).to_string(), "#3");
        assert_eq!(ConnectionId(4).to_string(), "~4");
        assert_eq!(Slot::A.to_string(), "A");
    }
}
