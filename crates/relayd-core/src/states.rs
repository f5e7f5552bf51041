//! Relay output intents and the overlay-biased merge.
//!
//! A `RelayStates` value asserts opinions about a subset of the relays: the
//! `modified` byte records which relay indices the value speaks for, the
//! `desired` byte carries the asserted on/off bit for each of them. Bits in
//! `desired` outside `modified` carry no meaning and every consumer masks
//! them off.

use crate::constants::NUM_RELAYS;

/// A partial snapshot of desired relay outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStates {
    /// Which relay indices this value asserts an opinion about.
    modified: u8,
    /// Desired output bit for each index in `modified`.
    desired: u8,
}

impl RelayStates {
    /// Create a value with no opinion about any relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the desired state for one relay, overwriting any prior
    /// intent for that index within this value.
    pub fn set(&mut self, index: usize, on: bool) {
        debug_assert!(index < NUM_RELAYS);
        let bit = 1u8 << index;
        self.modified |= bit;
        if on {
            self.desired |= bit;
        } else {
            self.desired &= !bit;
        }
    }

    /// The asserted state for one relay, or `None` if this value has no
    /// opinion about it.
    pub fn get(&self, index: usize) -> Option<bool> {
        debug_assert!(index < NUM_RELAYS);
        let bit = 1u8 << index;
        if self.modified & bit != 0 {
            Some(self.desired & bit != 0)
        } else {
            None
        }
    }

    /// Overlay-biased merge: for every index named by `overlay` the result
    /// takes the overlay's bit, every other index keeps this value's.
    pub fn merge(&self, overlay: &RelayStates) -> RelayStates {
        RelayStates {
            modified: self.modified | overlay.modified,
            desired: (self.desired & !overlay.modified) | (overlay.desired & overlay.modified),
        }
    }

    /// The full bitmask for the writeall command. Indices never named by
    /// any request come out as 0 (off).
    pub fn writeall_bitmask(&self) -> u8 {
        self.desired & self.modified
    }

    /// True if this value asserts an opinion about at least one relay.
    pub fn names_any(&self) -> bool {
        self.modified != 0
    }
}

impl std::fmt::Display for RelayStates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mask {:02x} desired {:02x}",
            self.modified,
            self.writeall_bitmask()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(pairs: &[(usize, bool)]) -> RelayStates {
        let mut s = RelayStates::new();
        for &(index, on) in pairs {
            s.set(index, on);
        }
        s
    }

    #[test]
    fn empty_has_no_opinion() {
        let s = RelayStates::new();
        assert!(!s.names_any());
        assert_eq!(s.writeall_bitmask(), 0);
        for index in 0..NUM_RELAYS {
            assert_eq!(s.get(index), None);
        }
    }

    #[test]
    fn set_marks_mask_and_value() {
        let s = states(&[(3, true)]);
        assert_eq!(s.get(3), Some(true));
        assert_eq!(s.get(2), None);
        assert_eq!(s.writeall_bitmask(), 0x08);
    }

    #[test]
    fn set_overwrites_prior_intent() {
        let s = states(&[(5, true), (5, false)]);
        assert_eq!(s.get(5), Some(false));
        assert_eq!(s.writeall_bitmask(), 0x00);
    }

    #[test]
    fn merge_is_overlay_biased() {
        let base = states(&[(0, true), (1, true)]);
        let overlay = states(&[(1, false), (2, true)]);
        let combined = base.merge(&overlay);

        assert_eq!(combined.get(0), Some(true));
        assert_eq!(combined.get(1), Some(false));
        assert_eq!(combined.get(2), Some(true));
        assert_eq!(combined.writeall_bitmask(), 0b101);
    }

    #[test]
    fn merge_identity_both_sides() {
        let a = states(&[(2, true), (6, false)]);
        let empty = RelayStates::new();

        assert_eq!(a.merge(&empty), a);
        assert_eq!(empty.merge(&a), a);
    }

    #[test]
    fn merge_is_associative() {
        let a = states(&[(0, true)]);
        let b = states(&[(0, false), (1, true)]);
        let c = states(&[(1, false), (2, true)]);

        assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn merge_idempotent_on_self() {
        let a = states(&[(1, true), (4, false)]);
        assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn unnamed_indices_stay_off() {
        let s = states(&[(7, true)]);
        let bitmask = s.writeall_bitmask();
        for index in 0..NUM_RELAYS - 1 {
            assert_eq!(bitmask & (1 << index), 0);
        }
    }
}
