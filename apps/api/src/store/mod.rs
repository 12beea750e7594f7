//! Mutation store: the single point of controlled mutation over the in-memory CV.
//!
//! Every effective mutation marks the store dirty and refreshes `updated_at`. Lookups by
//! an unknown id are treated as stale references: nothing changes and the call reports
//! `false`. The store never touches persistence; callers schedule auto-saves.

pub mod collection;
pub mod completeness;
pub mod handlers;

use uuid::Uuid;

use crate::ids::generate_id;
use crate::models::customization::{HexColor, TemplateId};
use crate::models::patch::{
    CustomizationPatch, EducationPatch, ExperiencePatch, LanguagePatch, NewEducation,
    NewExperience, NewLanguage, NewSkill, PersonalInfoPatch, SkillPatch,
};
use crate::models::{CvAggregate, ValidationError};
use crate::store::collection::{move_clamped, remove_by_id, update_by_id};

#[derive(Debug, Clone)]
pub struct CvStore {
    cv: CvAggregate,
    dirty: bool,
}

impl CvStore {
    /// A store holding a freshly defaulted aggregate.
    pub fn new() -> Self {
        Self {
            cv: CvAggregate::new(),
            dirty: false,
        }
    }

    pub fn cv(&self) -> &CvAggregate {
        &self.cv
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag after the current state reached the primary slot.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Flags the in-memory state as diverging from the primary slot.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the aggregate wholesale (after a persistence read). Clears dirty.
    pub fn load(&mut self, cv: CvAggregate) {
        self.cv = cv;
        self.dirty = false;
    }

    /// Replaces the aggregate with a freshly defaulted one. Clears dirty.
    pub fn reset(&mut self) {
        self.cv = CvAggregate::new();
        self.dirty = false;
    }

    fn changed(&mut self) {
        self.dirty = true;
        self.cv.touch();
    }

    fn record(&mut self, hit: bool) -> bool {
        if hit {
            self.changed();
        }
        hit
    }

    // ── personal info & customization ──────────────────────────────────────

    pub fn update_personal_info(&mut self, patch: PersonalInfoPatch) -> Result<(), ValidationError> {
        patch.apply(&mut self.cv.personal)?;
        self.changed();
        Ok(())
    }

    pub fn set_template(&mut self, template: TemplateId) {
        self.cv.customization.template = template;
        self.changed();
    }

    pub fn set_colors(&mut self, primary: HexColor, secondary: HexColor) {
        self.cv.customization.primary_color = primary;
        self.cv.customization.secondary_color = secondary;
        self.changed();
    }

    pub fn update_customization(&mut self, patch: CustomizationPatch) {
        patch.apply(&mut self.cv.customization);
        self.changed();
    }

    // ── experience ─────────────────────────────────────────────────────────

    pub fn add_experience(&mut self, draft: NewExperience) -> Result<Uuid, ValidationError> {
        let entry = draft.into_entry(generate_id())?;
        let id = entry.id;
        self.cv.experience.push(entry);
        self.changed();
        Ok(id)
    }

    pub fn update_experience(
        &mut self,
        id: Uuid,
        patch: ExperiencePatch,
    ) -> Result<bool, ValidationError> {
        let hit = update_by_id(&mut self.cv.experience, id, |e| patch.apply(e))?;
        Ok(self.record(hit))
    }

    pub fn delete_experience(&mut self, id: Uuid) -> bool {
        let hit = remove_by_id(&mut self.cv.experience, id);
        self.record(hit)
    }

    pub fn reorder_experience(&mut self, from: usize, to: usize) -> bool {
        let hit = move_clamped(&mut self.cv.experience, from, to);
        self.record(hit)
    }

    // ── education ──────────────────────────────────────────────────────────

    pub fn add_education(&mut self, draft: NewEducation) -> Result<Uuid, ValidationError> {
        let entry = draft.into_entry(generate_id())?;
        let id = entry.id;
        self.cv.education.push(entry);
        self.changed();
        Ok(id)
    }

    pub fn update_education(
        &mut self,
        id: Uuid,
        patch: EducationPatch,
    ) -> Result<bool, ValidationError> {
        let hit = update_by_id(&mut self.cv.education, id, |e| patch.apply(e))?;
        Ok(self.record(hit))
    }

    pub fn delete_education(&mut self, id: Uuid) -> bool {
        let hit = remove_by_id(&mut self.cv.education, id);
        self.record(hit)
    }

    pub fn reorder_education(&mut self, from: usize, to: usize) -> bool {
        let hit = move_clamped(&mut self.cv.education, from, to);
        self.record(hit)
    }

    // ── skills ─────────────────────────────────────────────────────────────

    pub fn add_skill(&mut self, draft: NewSkill) -> Uuid {
        let entry = draft.into_entry(generate_id());
        let id = entry.id;
        self.cv.skills.push(entry);
        self.changed();
        id
    }

    pub fn update_skill(&mut self, id: Uuid, patch: SkillPatch) -> bool {
        let hit = update_by_id(&mut self.cv.skills, id, |s| {
            patch.apply(s);
            Ok::<(), ValidationError>(())
        })
        .unwrap_or(false);
        self.record(hit)
    }

    pub fn delete_skill(&mut self, id: Uuid) -> bool {
        let hit = remove_by_id(&mut self.cv.skills, id);
        self.record(hit)
    }

    // ── languages ──────────────────────────────────────────────────────────

    pub fn add_language(&mut self, draft: NewLanguage) -> Uuid {
        let entry = draft.into_entry(generate_id());
        let id = entry.id;
        self.cv.languages.push(entry);
        self.changed();
        id
    }

    pub fn update_language(&mut self, id: Uuid, patch: LanguagePatch) -> bool {
        let hit = update_by_id(&mut self.cv.languages, id, |l| {
            patch.apply(l);
            Ok::<(), ValidationError>(())
        })
        .unwrap_or(false);
        self.record(hit)
    }

    pub fn delete_language(&mut self, id: Uuid) -> bool {
        let hit = remove_by_id(&mut self.cv.languages, id);
        self.record(hit)
    }
}

impl Default for CvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{LanguageLevel, SkillCategory, SkillLevel};
    use crate::models::dates::EndDate;
    use serde_json::json;

    fn new_experience(position: &str) -> NewExperience {
        serde_json::from_value(json!({
            "position": position,
            "company": "Acme",
            "startDate": "2020-01",
            "endDate": "2021-01",
        }))
        .unwrap()
    }

    fn new_education(degree: &str) -> NewEducation {
        serde_json::from_value(json!({
            "degree": degree,
            "field": "Computer Science",
            "school": "MIT",
            "startDate": "2015-09",
            "endDate": "2019-06",
        }))
        .unwrap()
    }

    fn rust_skill() -> NewSkill {
        NewSkill {
            name: "Rust".to_string(),
            level: SkillLevel::Expert,
            category: SkillCategory::Technical,
        }
    }

    #[test]
    fn test_new_store_is_clean() {
        let store = CvStore::new();
        assert!(!store.is_dirty());
        assert!(store.cv().experience.is_empty());
    }

    #[test]
    fn test_add_experience_assigns_id_and_marks_dirty() {
        let mut store = CvStore::new();
        let before = store.cv().updated_at;
        let id = store.add_experience(new_experience("Engineer")).unwrap();
        assert!(store.is_dirty());
        assert_eq!(store.cv().experience.len(), 1);
        assert_eq!(store.cv().experience[0].id, id);
        assert!(store.cv().updated_at >= before);
    }

    #[test]
    fn test_add_current_experience_scenario() {
        let mut store = CvStore::new();
        let draft: NewExperience = serde_json::from_value(json!({
            "position": "Engineer",
            "company": "Acme",
            "startDate": "2020-01",
            "endDate": "current",
            "current": true,
            "description": "",
            "achievements": []
        }))
        .unwrap();
        store.add_experience(draft).unwrap();
        let entry = &store.cv().experience[0];
        assert!(entry.current);
        assert_eq!(entry.end_date, Some(EndDate::Current));
    }

    #[test]
    fn test_added_ids_are_unique() {
        let mut store = CvStore::new();
        let a = store.add_experience(new_experience("A")).unwrap();
        let b = store.add_experience(new_experience("B")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_merges_and_leaves_others_unchanged() {
        let mut store = CvStore::new();
        let a = store.add_experience(new_experience("A")).unwrap();
        let b = store.add_experience(new_experience("B")).unwrap();
        let other_before = store.cv().experience[1].clone();
        let patch: ExperiencePatch = serde_json::from_value(json!({
            "description": "Shipped things",
            "achievements": ["Cut costs by 20%"]
        }))
        .unwrap();

        assert!(store.update_experience(a, patch).unwrap());

        let updated = &store.cv().experience[0];
        assert_eq!(updated.id, a);
        assert_eq!(updated.position, "A");
        assert_eq!(updated.description, "Shipped things");
        assert_eq!(updated.achievements, vec!["Cut costs by 20%".to_string()]);
        assert_eq!(store.cv().experience[1], other_before);
        assert_eq!(store.cv().experience[1].id, b);
    }

    #[test]
    fn test_update_unknown_id_is_silent_noop() {
        let mut store = CvStore::new();
        store.add_experience(new_experience("A")).unwrap();
        store.mark_saved();
        let snapshot = store.cv().clone();
        let hit = store
            .update_experience(Uuid::new_v4(), ExperiencePatch::default())
            .unwrap();
        assert!(!hit);
        assert!(!store.is_dirty());
        assert_eq!(store.cv(), &snapshot);
    }

    #[test]
    fn test_update_rejected_patch_keeps_entry() {
        let mut store = CvStore::new();
        let id = store.add_experience(new_experience("A")).unwrap();
        let before = store.cv().experience[0].clone();
        let patch: ExperiencePatch =
            serde_json::from_value(json!({ "endDate": "2010-01" })).unwrap();
        assert!(store.update_experience(id, patch).is_err());
        assert_eq!(store.cv().experience[0], before);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = CvStore::new();
        let a = store.add_experience(new_experience("A")).unwrap();
        store.add_experience(new_experience("B")).unwrap();
        assert!(store.delete_experience(a));
        let after_first = store.cv().clone();
        assert!(!store.delete_experience(a));
        assert_eq!(store.cv(), &after_first);
    }

    #[test]
    fn test_reorder_experience_and_education() {
        let mut store = CvStore::new();
        let a = store.add_experience(new_experience("A")).unwrap();
        let b = store.add_experience(new_experience("B")).unwrap();
        assert!(store.reorder_experience(0, 1));
        let ids: Vec<Uuid> = store.cv().experience.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b, a]);

        let x = store.add_education(new_education("BSc")).unwrap();
        let y = store.add_education(new_education("MSc")).unwrap();
        assert!(store.reorder_education(10, 0));
        let ids: Vec<Uuid> = store.cv().education.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![y, x]);
    }

    #[test]
    fn test_reorder_noop_does_not_mark_dirty() {
        let mut store = CvStore::new();
        assert!(!store.reorder_experience(0, 3));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_skill_and_language_crud() {
        let mut store = CvStore::new();
        let skill = store.add_skill(rust_skill());
        assert!(store.update_skill(
            skill,
            SkillPatch {
                level: Some(SkillLevel::Advanced),
                ..Default::default()
            }
        ));
        assert_eq!(store.cv().skills[0].level, SkillLevel::Advanced);
        assert_eq!(store.cv().skills[0].name, "Rust");
        assert!(store.delete_skill(skill));
        assert!(!store.update_skill(skill, SkillPatch::default()));

        let lang = store.add_language(NewLanguage {
            name: "German".to_string(),
            level: LanguageLevel::B2,
            certification: Some("Goethe B2".to_string()),
        });
        assert!(store.update_language(
            lang,
            LanguagePatch {
                certification: Some(None),
                ..Default::default()
            }
        ));
        assert_eq!(store.cv().languages[0].certification, None);
        assert!(store.delete_language(lang));
        assert!(store.cv().languages.is_empty());
    }

    #[test]
    fn test_customization_mutations() {
        let mut store = CvStore::new();
        store.set_template(TemplateId::Executive);
        store.set_colors("#111".parse().unwrap(), "#eeeeee".parse().unwrap());
        assert_eq!(store.cv().customization.template, TemplateId::Executive);
        assert_eq!(store.cv().customization.primary_color.as_str(), "#111");
        assert_eq!(store.cv().customization.secondary_color.as_str(), "#eeeeee");
        assert!(store.is_dirty());
    }

    #[test]
    fn test_update_personal_info_shallow_merge() {
        let mut store = CvStore::new();
        store
            .update_personal_info(PersonalInfoPatch {
                full_name: Some("Ada Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            })
            .unwrap();
        store
            .update_personal_info(PersonalInfoPatch {
                phone: Some("+44 20 7946 0000".to_string()),
                ..Default::default()
            })
            .unwrap();
        let personal = &store.cv().personal;
        assert_eq!(personal.full_name, "Ada Lovelace");
        assert_eq!(personal.email, "ada@example.com");
        assert_eq!(personal.phone, "+44 20 7946 0000");
    }

    #[test]
    fn test_load_and_reset_clear_dirty() {
        let mut store = CvStore::new();
        store.add_skill(rust_skill());
        let snapshot = store.cv().clone();
        store.reset();
        assert!(!store.is_dirty());
        assert!(store.cv().skills.is_empty());
        assert_ne!(store.cv().id, snapshot.id);

        store.load(snapshot.clone());
        assert!(!store.is_dirty());
        assert_eq!(store.cv(), &snapshot);
    }

    #[test]
    fn test_updated_at_monotonic_across_mutations() {
        let mut store = CvStore::new();
        let mut last = store.cv().updated_at;
        for i in 0..20 {
            store.add_skill(NewSkill {
                name: format!("skill-{i}"),
                level: SkillLevel::Beginner,
                category: SkillCategory::Other,
            });
            assert!(store.cv().updated_at >= last);
            last = store.cv().updated_at;
        }
    }
}
