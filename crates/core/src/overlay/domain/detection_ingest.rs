use crate::detection::domain::detected_face::DetectedFace;
use crate::overlay::domain::slot_store::SlotStore;

/// What a detection batch did to the slot store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Empty batch: every slot was destroyed.
    Cleared { removed: usize },
    /// Faces were bound to slots by position.
    Updated { faces: usize, added: usize },
}

/// Reconciles a detection batch with the slot store.
///
/// An empty batch clears the whole store. Otherwise the store grows to the
/// batch size if needed and face `i` becomes slot `i`'s last known face.
/// Phase and progress are left alone.
pub fn ingest(store: &mut SlotStore, batch: Vec<DetectedFace>) -> IngestOutcome {
    if batch.is_empty() {
        let removed = store.len();
        store.clear();
        return IngestOutcome::Cleared { removed };
    }

    let faces = batch.len();
    let added = store.ensure_capacity(faces);
    for (i, face) in batch.into_iter().enumerate() {
        store.get_mut(i).set_last_known_face(face);
    }
    IngestOutcome::Updated { faces, added }
}
