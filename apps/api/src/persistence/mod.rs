//! Local persistence: two bounded slots holding the serialized CV.
//!
//! Both `save` and `auto_save` go through one bounded write: serialize, enforce the size
//! ceiling (dropping the photo if that is enough), write, and on a quota rejection evict
//! the autosave slot and retry once without the photo. A failed write never replaces the
//! previous copy of a slot. Only explicit saves produce user-facing notices.

pub mod file;
pub mod handlers;
pub mod memory;
pub mod redis_store;
pub mod slot_store;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::models::CvAggregate;
use crate::persistence::slot_store::{Slot, SlotStore};

/// Largest serialized CV that will be written to a slot.
pub const MAX_SERIALIZED_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-facing message about the outcome of an explicit save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// Persisted only after the photo was dropped.
    SavedWithoutPhoto,
    /// Over the ceiling even without the photo; the slot was not touched.
    TooLarge { bytes: usize },
    /// The backend refused the write; the slot keeps its previous copy.
    Abandoned { reason: String },
}

impl SaveOutcome {
    /// True when the slot now holds the aggregate (possibly without its photo).
    pub fn is_persisted(&self) -> bool {
        matches!(self, SaveOutcome::Saved | SaveOutcome::SavedWithoutPhoto)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub slot: Slot,
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticePolicy {
    UserFacing,
    Silent,
}

impl NoticePolicy {
    fn notice_for(self, outcome: &SaveOutcome) -> Option<Notice> {
        if self == NoticePolicy::Silent {
            return None;
        }
        let notice = match outcome {
            SaveOutcome::Saved => Notice::new(NoticeLevel::Info, "CV saved"),
            SaveOutcome::SavedWithoutPhoto => Notice::new(
                NoticeLevel::Warning,
                "CV saved without photo: it was too large to store with the photo included",
            ),
            SaveOutcome::TooLarge { bytes } => Notice::new(
                NoticeLevel::Error,
                format!(
                    "CV not saved: {bytes} bytes exceeds the {MAX_SERIALIZED_BYTES} byte limit"
                ),
            ),
            SaveOutcome::Abandoned { .. } => Notice::new(
                NoticeLevel::Error,
                "CV not saved: local storage is full. Your previous copy is unchanged",
            ),
        };
        Some(notice)
    }
}

/// A serialized aggregate that fits under the ceiling.
struct Payload {
    json: String,
    photo_dropped: bool,
}

pub struct CvPersistence {
    store: Arc<dyn SlotStore>,
    prefix: String,
}

impl CvPersistence {
    pub fn new(store: Arc<dyn SlotStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Explicit save to the primary slot. The report carries a notice for the user.
    pub async fn save(&self, cv: &CvAggregate) -> SaveReport {
        self.bounded_write(Slot::Primary, cv, NoticePolicy::UserFacing)
            .await
    }

    /// Background save to the autosave slot. Never produces a notice.
    pub async fn auto_save(&self, cv: &CvAggregate) -> SaveReport {
        self.bounded_write(Slot::AutoSave, cv, NoticePolicy::Silent)
            .await
    }

    pub async fn load(&self) -> Option<CvAggregate> {
        self.read(Slot::Primary).await
    }

    pub async fn load_auto_saved(&self) -> Option<CvAggregate> {
        self.read(Slot::AutoSave).await
    }

    /// The more recently updated of the two slots. Ties go to the primary slot.
    pub async fn load_newest(&self) -> Option<(CvAggregate, Slot)> {
        let primary = self.load().await;
        let auto_saved = self.load_auto_saved().await;
        match (primary, auto_saved) {
            (Some(p), Some(a)) if a.updated_at > p.updated_at => Some((a, Slot::AutoSave)),
            (Some(p), _) => Some((p, Slot::Primary)),
            (None, Some(a)) => Some((a, Slot::AutoSave)),
            (None, None) => None,
        }
    }

    /// Removes both slots. Failures are logged.
    pub async fn clear(&self) {
        for slot in [Slot::Primary, Slot::AutoSave] {
            if let Err(e) = self.store.remove(&slot.key(&self.prefix)).await {
                error!("Failed to clear {} slot: {e}", slot.name());
            }
        }
        info!("Cleared persisted CV slots");
    }

    async fn read(&self, slot: Slot) -> Option<CvAggregate> {
        let raw = match self.store.get(&slot.key(&self.prefix)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read {} slot: {e}", slot.name());
                return None;
            }
        };
        let mut cv: CvAggregate = match serde_json::from_str(&raw) {
            Ok(cv) => cv,
            Err(e) => {
                warn!("Discarding corrupt {} slot: {e}", slot.name());
                return None;
            }
        };
        match cv.normalize() {
            Ok(()) => Some(cv),
            Err(e) => {
                warn!("Discarding inconsistent {} slot: {e}", slot.name());
                None
            }
        }
    }

    // ── bounded write ──────────────────────────────────────────────────────

    async fn bounded_write(&self, slot: Slot, cv: &CvAggregate, policy: NoticePolicy) -> SaveReport {
        let outcome = match fit_to_ceiling(cv) {
            Ok(payload) => self.write_payload(slot, cv, payload).await,
            Err(outcome) => outcome,
        };

        match &outcome {
            SaveOutcome::Saved => debug!("Saved CV to {} slot", slot.name()),
            SaveOutcome::SavedWithoutPhoto => {
                warn!("Saved CV to {} slot without photo", slot.name())
            }
            SaveOutcome::TooLarge { bytes } => {
                warn!("CV too large for {} slot: {bytes} bytes", slot.name())
            }
            SaveOutcome::Abandoned { reason } => {
                error!("Abandoned write to {} slot: {reason}", slot.name())
            }
        }

        SaveReport {
            slot,
            notice: policy.notice_for(&outcome),
            outcome,
        }
    }

    async fn write_payload(&self, slot: Slot, cv: &CvAggregate, payload: Payload) -> SaveOutcome {
        let key = slot.key(&self.prefix);
        match self.store.set(&key, &payload.json).await {
            Ok(()) if payload.photo_dropped => SaveOutcome::SavedWithoutPhoto,
            Ok(()) => SaveOutcome::Saved,
            Err(e) if e.is_quota() => {
                warn!("Storage quota hit writing {} slot: {e}", slot.name());
                self.retry_after_eviction(&key, cv).await
            }
            Err(e) => SaveOutcome::Abandoned {
                reason: e.to_string(),
            },
        }
    }

    /// Evicts the autosave slot, then writes once more without the photo.
    async fn retry_after_eviction(&self, key: &str, cv: &CvAggregate) -> SaveOutcome {
        if let Err(e) = self.store.remove(&Slot::AutoSave.key(&self.prefix)).await {
            warn!("Failed to evict autosave slot: {e}");
        }

        let stripped = cv.without_photo();
        let json = match serde_json::to_string(&stripped) {
            Ok(json) => json,
            Err(e) => {
                return SaveOutcome::Abandoned {
                    reason: e.to_string(),
                }
            }
        };

        match self.store.set(key, &json).await {
            Ok(()) if cv.has_photo() => SaveOutcome::SavedWithoutPhoto,
            Ok(()) => SaveOutcome::Saved,
            Err(e) => SaveOutcome::Abandoned {
                reason: e.to_string(),
            },
        }
    }
}

/// Serializes `cv`, dropping the photo when that alone brings it under the ceiling.
fn fit_to_ceiling(cv: &CvAggregate) -> Result<Payload, SaveOutcome> {
    let serialize = |cv: &CvAggregate| {
        serde_json::to_string(cv).map_err(|e| SaveOutcome::Abandoned {
            reason: e.to_string(),
        })
    };

    let json = serialize(cv)?;
    if json.len() <= MAX_SERIALIZED_BYTES {
        return Ok(Payload {
            json,
            photo_dropped: false,
        });
    }
    if !cv.has_photo() {
        return Err(SaveOutcome::TooLarge { bytes: json.len() });
    }

    let json = serialize(&cv.without_photo())?;
    if json.len() <= MAX_SERIALIZED_BYTES {
        Ok(Payload {
            json,
            photo_dropped: true,
        })
    } else {
        Err(SaveOutcome::TooLarge { bytes: json.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{ExperienceEntry, SkillCategory, SkillEntry, SkillLevel};
    use crate::models::dates::EndDate;
    use crate::models::patch::{NewExperience, PersonalInfoPatch};
    use crate::persistence::memory::MemoryStore;
    use crate::persistence::slot_store::StoreError;
    use crate::store::CvStore;
    use async_trait::async_trait;
    use serde_json::json;

    const PREFIX: &str = "test";
    const MIB: usize = 1024 * 1024;

    fn persistence_with(store: Arc<MemoryStore>) -> CvPersistence {
        CvPersistence::new(store, PREFIX)
    }

    fn sample_cv() -> CvAggregate {
        let mut cv = CvAggregate::new();
        cv.personal.full_name = "Ada Lovelace".to_string();
        cv.personal.email = "ada@example.com".to_string();
        cv.experience.push(ExperienceEntry {
            id: crate::ids::generate_id(),
            position: "Analyst".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            location: Some("London".to_string()),
            start_date: "1842-01".parse().unwrap(),
            end_date: Some("1843-09".parse().unwrap()),
            current: false,
            description: "Wrote the first program".to_string(),
            achievements: vec!["Note G".to_string()],
        });
        cv.skills.push(SkillEntry {
            id: crate::ids::generate_id(),
            name: "Mathematics".to_string(),
            level: SkillLevel::Expert,
            category: SkillCategory::Technical,
        });
        cv
    }

    struct BrokenStore;

    #[async_trait]
    impl SlotStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let cv = sample_cv();

        let report = persistence.save(&cv).await;
        assert_eq!(report.outcome, SaveOutcome::Saved);
        assert_eq!(report.notice.unwrap().level, NoticeLevel::Info);
        assert_eq!(persistence.load().await, Some(cv));
    }

    #[tokio::test]
    async fn test_oversized_photo_is_dropped_with_warning() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(16 * MIB)));
        let mut cv = sample_cv();
        cv.personal.photo = Some("A".repeat(5 * MIB));

        let report = persistence.save(&cv).await;
        assert_eq!(report.outcome, SaveOutcome::SavedWithoutPhoto);
        assert_eq!(report.notice.unwrap().level, NoticeLevel::Warning);

        let loaded = persistence.load().await.unwrap();
        assert!(loaded.personal.photo.is_none());
        assert_eq!(loaded, cv.without_photo());
    }

    #[tokio::test]
    async fn test_too_large_without_photo_keeps_previous_copy() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(16 * MIB)));
        let previous = sample_cv();
        persistence.save(&previous).await;

        let mut huge = previous.clone();
        huge.personal.summary = "x".repeat(5 * MIB);
        let report = persistence.save(&huge).await;
        assert!(matches!(report.outcome, SaveOutcome::TooLarge { .. }));
        assert_eq!(report.notice.unwrap().level, NoticeLevel::Error);
        assert_eq!(persistence.load().await, Some(previous));
    }

    #[tokio::test]
    async fn test_quota_evicts_autosave_and_drops_photo() {
        let cv = sample_cv();
        let plain_len = serde_json::to_string(&cv).unwrap().len();
        let store = Arc::new(MemoryStore::new(2 * plain_len + 512));
        let persistence = persistence_with(store.clone());

        assert!(persistence.auto_save(&cv).await.outcome.is_persisted());

        let mut with_photo = cv.clone();
        with_photo.personal.photo = Some("B".repeat(2048));
        let report = persistence.save(&with_photo).await;

        assert_eq!(report.outcome, SaveOutcome::SavedWithoutPhoto);
        assert_eq!(persistence.load_auto_saved().await, None);
        assert_eq!(persistence.load().await, Some(cv));
    }

    #[tokio::test]
    async fn test_second_quota_failure_abandons() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(16)));
        let cv = sample_cv();

        let report = persistence.save(&cv).await;
        assert!(matches!(report.outcome, SaveOutcome::Abandoned { .. }));
        assert_eq!(report.notice.unwrap().level, NoticeLevel::Error);

        let report = persistence.auto_save(&cv).await;
        assert!(matches!(report.outcome, SaveOutcome::Abandoned { .. }));
        assert!(report.notice.is_none());
        assert_eq!(persistence.load().await, None);
    }

    #[tokio::test]
    async fn test_auto_save_is_silent_on_success() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let report = persistence.auto_save(&sample_cv()).await;
        assert_eq!(report.slot, Slot::AutoSave);
        assert_eq!(report.outcome, SaveOutcome::Saved);
        assert!(report.notice.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_slot_loads_as_none() {
        let store = Arc::new(MemoryStore::new(MIB));
        store
            .set(&Slot::Primary.key(PREFIX), "{not json")
            .await
            .unwrap();
        let persistence = persistence_with(store);
        assert_eq!(persistence.load().await, None);
    }

    #[tokio::test]
    async fn test_inconsistent_slot_loads_as_none() {
        let store = Arc::new(MemoryStore::new(MIB));
        let shared = crate::ids::generate_id();
        let mut raw = serde_json::to_value(sample_cv()).unwrap();
        raw["experience"] = json!([
            {
                "id": shared,
                "position": "Engineer",
                "company": "Acme",
                "startDate": "2020-01",
                "endDate": "2019-01",
                "current": true
            },
            {
                "id": shared,
                "position": "Engineer",
                "company": "Acme",
                "startDate": "2018-01",
                "endDate": "current",
                "current": false
            }
        ]);
        store
            .set(&Slot::Primary.key(PREFIX), &raw.to_string())
            .await
            .unwrap();
        let persistence = persistence_with(store);
        assert_eq!(persistence.load().await, None);
    }

    #[tokio::test]
    async fn test_slot_with_mismatched_current_flag_is_repaired() {
        let store = Arc::new(MemoryStore::new(MIB));
        let mut raw = serde_json::to_value(sample_cv()).unwrap();
        raw["experience"][0]["current"] = json!(true);
        store
            .set(&Slot::AutoSave.key(PREFIX), &raw.to_string())
            .await
            .unwrap();
        let persistence = persistence_with(store);

        let loaded = persistence.load_auto_saved().await.unwrap();
        assert!(loaded.experience[0].current);
        assert_eq!(loaded.experience[0].end_date, Some(EndDate::Current));
    }

    #[tokio::test]
    async fn test_current_experience_survives_save_and_fresh_load() {
        let store = Arc::new(MemoryStore::new(MIB));
        let mut session = CvStore::new();
        let draft: NewExperience = serde_json::from_value(json!({
            "position": "Engineer",
            "company": "Acme",
            "startDate": "2020-01",
            "endDate": "current",
            "current": true
        }))
        .unwrap();
        session.add_experience(draft).unwrap();
        persistence_with(store.clone()).save(session.cv()).await;

        let mut fresh = CvStore::new();
        fresh.load(persistence_with(store).load().await.unwrap());
        let entry = &fresh.cv().experience[0];
        assert!(entry.current);
        assert_eq!(entry.end_date, Some(EndDate::Current));
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["endDate"], "current");
    }

    #[tokio::test]
    async fn test_reset_then_load_restores_persisted_copy() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let mut session = CvStore::new();
        session
            .update_personal_info(PersonalInfoPatch {
                full_name: Some("Ada Lovelace".to_string()),
                ..Default::default()
            })
            .unwrap();
        persistence.save(session.cv()).await;
        let before = session.cv().clone();

        session.reset();
        assert!(!session.cv().personal.has_identity());

        session.load(persistence.load().await.unwrap());
        assert_eq!(session.cv(), &before);
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_backend_failures_are_contained() {
        let persistence = CvPersistence::new(Arc::new(BrokenStore), PREFIX);
        let report = persistence.save(&sample_cv()).await;
        assert!(matches!(report.outcome, SaveOutcome::Abandoned { .. }));
        assert_eq!(persistence.load().await, None);
        persistence.clear().await;
    }

    #[tokio::test]
    async fn test_clear_removes_both_slots() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let cv = sample_cv();
        persistence.save(&cv).await;
        persistence.auto_save(&cv).await;

        persistence.clear().await;
        assert_eq!(persistence.load().await, None);
        assert_eq!(persistence.load_auto_saved().await, None);
    }

    #[tokio::test]
    async fn test_auto_save_last_write_wins() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let first = sample_cv();
        let mut second = first.clone();
        second.personal.summary = "Updated summary".to_string();

        persistence.auto_save(&first).await;
        persistence.auto_save(&second).await;
        assert_eq!(persistence.load_auto_saved().await, Some(second));
    }

    #[tokio::test]
    async fn test_load_newest_prefers_more_recent_slot() {
        let persistence = persistence_with(Arc::new(MemoryStore::new(MIB)));
        let saved = sample_cv();
        let mut newer = saved.clone();
        newer.updated_at = saved.updated_at + chrono::Duration::seconds(5);

        assert!(persistence.load_newest().await.is_none());

        persistence.save(&saved).await;
        let (_, slot) = persistence.load_newest().await.unwrap();
        assert_eq!(slot, Slot::Primary);

        persistence.auto_save(&newer).await;
        let (cv, slot) = persistence.load_newest().await.unwrap();
        assert_eq!(slot, Slot::AutoSave);
        assert_eq!(cv, newer);
    }

    #[test]
    fn test_save_report_serializes_flat() {
        let report = SaveReport {
            slot: Slot::Primary,
            outcome: SaveOutcome::TooLarge { bytes: 10 },
            notice: None,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["slot"], "primary");
        assert_eq!(json["status"], "too_large");
        assert_eq!(json["bytes"], 10);
        assert!(json.get("notice").is_none());
    }
}
