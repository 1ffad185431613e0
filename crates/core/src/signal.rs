//! Event signals.

use core::fmt;

/// Identifies the meaning of an event.
///
/// The first four values are reserved for the lifecycle pseudo-signals the
/// state-machine engine synthesises itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal(pub u16);

impl Signal {
    /// Empty signal, used to probe a state without side effects.
    pub const EMPTY: Signal = Signal(0);
    /// State entry action.
    pub const ENTRY: Signal = Signal(1);
    /// State exit action.
    pub const EXIT: Signal = Signal(2);
    /// Nested initial transition.
    pub const INIT: Signal = Signal(3);
    /// First application signal.
    pub const USER: Signal = Signal(4);

    pub const fn new(raw: u16) -> Self {
        Signal(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Signal `offset` places after [`Signal::USER`].
    pub const fn user(offset: u16) -> Self {
        Signal(Self::USER.0 + offset)
    }

    pub const fn is_reserved(self) -> bool {
        self.0 < Self::USER.0
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EMPTY => f.write_str("EMPTY"),
            Self::ENTRY => f.write_str("ENTRY"),
            Self::EXIT => f.write_str("EXIT"),
            Self::INIT => f.write_str("INIT"),
            Signal(raw) => write!(f, "Signal({raw})"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Signal {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Signal({})", self.0);
    }
}

impl From<u16> for Signal {
    fn from(raw: u16) -> Self {
        Signal(raw)
    }
}
