//! Two-slot rotation.
//!
//! Both the simulation field and the shadow pass keep a pair of resources
//! where one is read while the other is written, then the roles swap.
//! [`PingPong`] owns the pair and tracks which slot is which, so the swap is
//! an index flip and no resource ever moves.

/// Slot index into a [`PingPong`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// A pair of resources with a front (read) and back (write) role.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    front: Slot,
}

impl<T> PingPong<T> {
    /// `a` starts as the front.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            front: Slot::A,
        }
    }

    /// Slot currently read from.
    pub fn front_slot(&self) -> Slot {
        self.front
    }

    /// Slot currently written to.
    pub fn back_slot(&self) -> Slot {
        self.front.other()
    }

    pub fn front(&self) -> &T {
        &self.slots[self.front.index()]
    }

    pub fn back(&self) -> &T {
        &self.slots[self.back_slot().index()]
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    /// Exchange the roles.
    pub fn swap(&mut self) {
        self.front = self.front.other();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_rotates_with_period_two() {
        let mut pair = PingPong::new("a", "b");
        assert_eq!(*pair.front(), "a");
        assert_eq!(*pair.back(), "b");

        pair.swap();
        assert_eq!(*pair.front(), "b");
        assert_eq!(*pair.back(), "a");

        pair.swap();
        assert_eq!(*pair.front(), "a");
        assert_eq!(pair.front_slot(), Slot::A);
    }

    #[test]
    fn test_get_by_slot_ignores_roles() {
        let mut pair = PingPong::new(1, 2);
        pair.swap();
        assert_eq!(*pair.get(Slot::A), 1);
        assert_eq!(*pair.get(Slot::B), 2);
        assert_eq!(pair.iter().count(), 2);
    }
}
