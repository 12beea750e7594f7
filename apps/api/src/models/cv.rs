use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::generate_id;
use crate::models::customization::Customization;
use crate::models::dates::{normalize_period, validate_period, EndDate, YearMonth};
use crate::models::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl PersonalLinks {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.linkedin, &self.github, &self.website]
            .into_iter()
            .filter_map(|l| l.as_deref())
            .filter(|l| !l.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoLayout {
    Left,
    Right,
    Top,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub links: PersonalLinks,
    /// Base64 image payload or `data:image/...;base64,` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_layout: Option<PhotoLayout>,
}

impl PersonalInfo {
    /// A CV has an identity once the full name is filled in.
    pub fn has_identity(&self) -> bool {
        !self.full_name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub position: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: YearMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<EndDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: Uuid,
    pub degree: String,
    #[serde(default)]
    pub field: String,
    pub school: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: YearMonth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<EndDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Skill categories, declared in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
    Language,
    Other,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 4] = [
        SkillCategory::Technical,
        SkillCategory::Soft,
        SkillCategory::Language,
        SkillCategory::Other,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntry {
    pub id: Uuid,
    pub name: String,
    pub level: SkillLevel,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "native")]
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub id: Uuid,
    pub name: String,
    pub level: LanguageLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
}

/// The root CV aggregate. One per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvAggregate {
    pub id: Uuid,
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub customization: Customization,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CvAggregate {
    /// An empty aggregate with default customization and a fresh id.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            personal: PersonalInfo::default(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            customization: Customization::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    pub fn has_photo(&self) -> bool {
        self.personal
            .photo
            .as_deref()
            .is_some_and(|p| !p.is_empty())
    }

    /// A copy with the photo dropped, used for degraded saves.
    pub fn without_photo(&self) -> Self {
        let mut copy = self.clone();
        copy.personal.photo = None;
        copy
    }

    /// Re-establishes the aggregate invariants on data read from outside the store.
    ///
    /// A `current` flag that disagrees with its end date is repaired in favour of the
    /// flag. An end month before its start month, or an id repeated within one
    /// collection, cannot be repaired and is rejected.
    pub fn normalize(&mut self) -> Result<(), ValidationError> {
        for e in &mut self.experience {
            normalize_period(&mut e.current, &mut e.end_date);
            validate_period(e.start_date, e.end_date)?;
        }
        for e in &mut self.education {
            normalize_period(&mut e.current, &mut e.end_date);
            validate_period(e.start_date, e.end_date)?;
        }
        unique_ids("experience", self.experience.iter().map(|e| e.id))?;
        unique_ids("education", self.education.iter().map(|e| e.id))?;
        unique_ids("skill", self.skills.iter().map(|e| e.id))?;
        unique_ids("language", self.languages.iter().map(|e| e.id))?;
        Ok(())
    }
}

fn unique_ids(
    collection: &'static str,
    ids: impl Iterator<Item = Uuid>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                collection,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

impl Default for CvAggregate {
    fn default() -> Self {
        Self::new()
    }
}
