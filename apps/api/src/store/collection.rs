//! Id-addressed helpers shared by every CV collection.

use uuid::Uuid;

use crate::models::cv::{EducationEntry, ExperienceEntry, LanguageEntry, SkillEntry};

/// An entry addressable by its immutable id.
pub trait Identified {
    fn id(&self) -> Uuid;
}

impl Identified for ExperienceEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for EducationEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for SkillEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for LanguageEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Applies `edit` to a copy of the entry with `id` and commits it only if the edit succeeds.
///
/// Returns `Ok(false)` when no entry matches. The id is restored after the edit so a
/// patch can never rewrite it.
pub fn update_by_id<T, E>(
    items: &mut [T],
    id: Uuid,
    edit: impl FnOnce(&mut T) -> Result<(), E>,
) -> Result<bool, E>
where
    T: Identified + Clone,
{
    let Some(slot) = items.iter_mut().find(|item| item.id() == id) else {
        return Ok(false);
    };
    let mut draft = slot.clone();
    edit(&mut draft)?;
    debug_assert_eq!(draft.id(), id);
    *slot = draft;
    Ok(true)
}

/// Removes the entry with `id`. Returns whether anything was removed.
pub fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: Uuid) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

/// Moves the element at `from` to `to`, clamping both into range.
///
/// Returns `false` (and leaves the order untouched) for an empty collection or when the
/// clamped indices coincide.
pub fn move_clamped<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if items.is_empty() {
        return false;
    }
    let last = items.len() - 1;
    let (from, to) = (from.min(last), to.min(last));
    if from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
