//! keyslot: the twelve function-key slots a binding can occupy.
//!
//! - `KeySlot`: F1 through F12, with a 1-based ordinal and a label.
//! - `Scancode`: the macOS hardware virtual keycode (`kVK_F*`) for each slot.
//!
//! Slots are fixed at compile time. They parse from their label (`"F5"`,
//! case-insensitive) or from their ordinal (`"5"`), and serialize as the
//! ordinal so persisted tables stay compact and stable.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// macOS hardware virtual keycode (`kVK_*`, `NSEvent.keyCode`).
pub type Scancode = u16;

/// Error returned when a value does not name one of the twelve slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSlotError {
    /// Ordinal outside `1..=12`.
    #[error("no function key with ordinal {0} (expected 1-12)")]
    Ordinal(u32),
    /// Text that is neither a label nor an ordinal.
    #[error("unknown function key {0:?} (expected F1-F12)")]
    Label(String),
}

// Central table of slot variants, ordinals and HIToolbox keycodes.
macro_rules! slots {
    ( $( $v:ident = $ord:literal => $code:literal, )* ) => {
        /// One of the twelve function keys.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        #[repr(u8)]
        pub enum KeySlot {
            $(
                #[doc = concat!("The ", stringify!($v), " key.")]
                $v = $ord,
            )*
        }

        impl KeySlot {
            /// Every slot in ordinal order.
            pub const ALL: [Self; 12] = [ $( Self::$v, )* ];

            /// Look up a slot by its 1-based ordinal.
            pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
                match ordinal {
                    $( $ord => Some(Self::$v), )*
                    _ => None,
                }
            }

            /// The macOS virtual keycode for this slot.
            pub const fn scancode(self) -> Scancode {
                match self {
                    $( Self::$v => $code, )*
                }
            }

            /// Human label, e.g. `"F5"`.
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$v => stringify!($v), )*
                }
            }
        }
    };
}

slots! {
    F1 = 1 => 0x7A,
    F2 = 2 => 0x78,
    F3 = 3 => 0x63,
    F4 = 4 => 0x76,
    F5 = 5 => 0x60,
    F6 = 6 => 0x61,
    F7 = 7 => 0x62,
    F8 = 8 => 0x64,
    F9 = 9 => 0x65,
    F10 = 10 => 0x6D,
    F11 = 11 => 0x67,
    F12 = 12 => 0x6F,
}

impl KeySlot {
    /// The 1-based ordinal of this slot.
    pub const fn ordinal(self) -> u32 {
        self as u32
    }
}

impl Display for KeySlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl From<KeySlot> for u32 {
    fn from(slot: KeySlot) -> Self {
        slot.ordinal()
    }
}

impl TryFrom<u32> for KeySlot {
    type Error = ParseSlotError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or(ParseSlotError::Ordinal(value))
    }
}

impl FromStr for KeySlot {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let digits = t
            .strip_prefix('F')
            .or_else(|| t.strip_prefix('f'))
            .unwrap_or(t);
        match digits.parse::<u32>() {
            Ok(n) => Self::from_ordinal(n).ok_or(ParseSlotError::Ordinal(n)),
            Err(_) => Err(ParseSlotError::Label(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_contiguous() {
        for (i, slot) in KeySlot::ALL.iter().enumerate() {
            assert_eq!(slot.ordinal() as usize, i + 1);
            assert_eq!(KeySlot::from_ordinal(slot.ordinal()), Some(*slot));
        }
        assert_eq!(KeySlot::from_ordinal(0), None);
        assert_eq!(KeySlot::from_ordinal(13), None);
    }

    #[test]
    fn labels_and_scancodes() {
        assert_eq!(KeySlot::F1.label(), "F1");
        assert_eq!(KeySlot::F12.to_string(), "F12");
        assert_eq!(KeySlot::F1.scancode(), 0x7A);
        assert_eq!(KeySlot::F5.scancode(), 0x60);
        assert_eq!(KeySlot::F12.scancode(), 0x6F);
    }

    #[test]
    fn scancodes_are_unique() {
        let mut codes: Vec<Scancode> = KeySlot::ALL.iter().map(|s| s.scancode()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 12);
    }

    #[test]
    fn parse_accepts_labels_and_ordinals() {
        assert_eq!("F5".parse::<KeySlot>(), Ok(KeySlot::F5));
        assert_eq!("f11".parse::<KeySlot>(), Ok(KeySlot::F11));
        assert_eq!(" 3 ".parse::<KeySlot>(), Ok(KeySlot::F3));
        assert_eq!("F13".parse::<KeySlot>(), Err(ParseSlotError::Ordinal(13)));
        assert!(matches!(
            "escape".parse::<KeySlot>(),
            Err(ParseSlotError::Label(_))
        ));
    }

    #[test]
    fn serde_uses_ordinal() {
        let json = serde_json::to_string(&KeySlot::F7).unwrap();
        assert_eq!(json, "7");
        let back: KeySlot = serde_json::from_str("7").unwrap();
        assert_eq!(back, KeySlot::F7);
        assert!(serde_json::from_str::<KeySlot>("0").is_err());
    }
}
