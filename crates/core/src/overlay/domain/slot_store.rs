use crate::overlay::domain::slot::Slot;

/// Ordered collection of slots, one per concurrently tracked subject.
///
/// Slots are only ever appended or dropped all at once; no single slot is
/// removed.
#[derive(Clone, Debug, Default)]
pub struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Appends fresh slots until there are at least `n`. Never shrinks.
    ///
    /// Returns how many slots were added.
    pub fn ensure_capacity(&mut self, n: usize) -> usize {
        let before = self.slots.len();
        if before < n {
            self.slots.resize_with(n, Slot::new);
        }
        self.slots.len() - before
    }

    /// Destroys every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// # Panics
    ///
    /// Panics if `index >= self.len()`; callers size the store first.
    pub fn get(&self, index: usize) -> &Slot {
        match self.slots.get(index) {
            Some(slot) => slot,
            None => panic!(
                "slot index {index} out of range (store holds {})",
                self.slots.len()
            ),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut Slot {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => slot,
            None => panic!("slot index {index} out of range (store holds {len})"),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }
}
