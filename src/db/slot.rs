//! Pool bookkeeping: the rotating queue of connection slots.
//!
//! # Responsibilities
//! - Track each handle's borrow state (Idle or Borrowed)
//! - Rotate past borrowed handles to find an idle one
//! - Take connections out on checkout and put them back on checkin
//!
//! # Design Decisions
//! - A borrowed slot stays in the queue; only its connection moves out
//! - Pure data structure: no locking, no I/O (the pool wraps it in a mutex)

use std::collections::VecDeque;

/// Stable identity of a slot across rotations.
pub type SlotId = u64;

#[derive(Debug)]
pub(crate) enum SlotState<C> {
    Idle(C),
    Borrowed,
}

#[derive(Debug)]
pub(crate) struct Slot<C> {
    pub(crate) id: SlotId,
    pub(crate) state: SlotState<C>,
}

impl<C> Slot<C> {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.state, SlotState::Idle(_))
    }
}

/// FIFO of slots guarded by the pool lock.
#[derive(Debug)]
pub(crate) struct SlotQueue<C> {
    pub(crate) slots: VecDeque<Slot<C>>,
    next_id: SlotId,
}

impl<C> SlotQueue<C> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            next_id: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn idle(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_idle()).count()
    }

    /// Append an idle slot holding `conn`.
    pub(crate) fn push_idle(&mut self, conn: C) -> SlotId {
        self.push(SlotState::Idle(conn))
    }

    /// Append a slot already marked borrowed (the exhaustion path).
    pub(crate) fn push_borrowed(&mut self) -> SlotId {
        self.push(SlotState::Borrowed)
    }

    fn push(&mut self, state: SlotState<C>) -> SlotId {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push_back(Slot { id, state });
        id
    }

    /// Borrow the first idle connection, rotating borrowed slots to the back.
    ///
    /// Returns `None` after one full lap without finding an idle slot.
    pub(crate) fn checkout(&mut self) -> Option<(SlotId, C)> {
        for _ in 0..self.slots.len() {
            let front = self.slots.front_mut()?;
            match std::mem::replace(&mut front.state, SlotState::Borrowed) {
                SlotState::Idle(conn) => return Some((front.id, conn)),
                SlotState::Borrowed => self.slots.rotate_left(1),
            }
        }
        None
    }

    /// Return `conn` to slot `id`; hands it back if the slot is unknown.
    pub(crate) fn checkin(&mut self, id: SlotId, conn: C) -> Result<(), C> {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => {
                slot.state = SlotState::Idle(conn);
                Ok(())
            }
            None => Err(conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(n: u32) -> SlotQueue<u32> {
        let mut q = SlotQueue::with_capacity(n as usize);
        for conn in 0..n {
            q.push_idle(conn);
        }
        q
    }

    #[test]
    fn test_checkout_marks_borrowed() {
        let mut q = queue(2);
        let (id, conn) = q.checkout().unwrap();
        assert_eq!((id, conn), (0, 0));
        assert_eq!(q.idle(), 1);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_rotation_skips_borrowed() {
        let mut q = queue(3);
        let first = q.checkout().unwrap();
        let second = q.checkout().unwrap();
        let third = q.checkout().unwrap();
        assert_eq!([first.0, second.0, third.0], [0, 1, 2]);
        assert!(q.checkout().is_none());
    }

    #[test]
    fn test_checkin_makes_slot_available_again() {
        let mut q = queue(2);
        let (a, conn_a) = q.checkout().unwrap();
        let (_b, _conn_b) = q.checkout().unwrap();
        assert!(q.checkout().is_none());

        q.checkin(a, conn_a).unwrap();
        assert_eq!(q.checkout().map(|(id, _)| id), Some(a));
    }

    #[test]
    fn test_checkin_unknown_slot_returns_connection() {
        let mut q = queue(1);
        assert_eq!(q.checkin(42, 9), Err(9));
    }

    #[test]
    fn test_push_borrowed_is_not_lent() {
        let mut q: SlotQueue<u32> = SlotQueue::with_capacity(1);
        let id = q.push_borrowed();
        assert!(q.checkout().is_none());
        q.checkin(id, 5).unwrap();
        assert_eq!(q.checkout(), Some((id, 5)));
    }

    #[test]
    fn test_empty_queue_checkout() {
        let mut q: SlotQueue<u32> = SlotQueue::with_capacity(0);
        assert!(q.checkout().is_none());
    }
}
