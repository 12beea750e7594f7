//! Typed drafts and partial updates for the CV aggregate.
//!
//! Drafts are entries without an id (the store assigns one). Patches carry only the fields
//! being changed; unknown field names are rejected at deserialization. Optional fields use
//! a double `Option` so a patch can tell "leave as is" (field absent) from "clear" (`null`).

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::models::customization::{
    CvLanguage, Customization, FontFamily, HexColor, SectionVisibility, Spacing, TemplateId,
};
use crate::models::cv::{
    EducationEntry, ExperienceEntry, LanguageEntry, LanguageLevel, PersonalInfo, PersonalLinks,
    PhotoLayout, SkillCategory, SkillEntry, SkillLevel,
};
use crate::models::dates::{normalize_period, validate_period, EndDate, YearMonth};
use crate::models::ValidationError;

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Merges a period change into an entry's `current`/`end_date` pair.
///
/// An explicit `current` wins; otherwise a new end date decides the flag.
fn apply_period(
    current: &mut bool,
    end_date: &mut Option<EndDate>,
    patch_current: Option<bool>,
    patch_end: Option<Option<EndDate>>,
) {
    if let Some(end) = patch_end {
        *end_date = end;
    }
    match patch_current {
        Some(c) => *current = c,
        None if patch_end.is_some() => *current = end_date.is_some_and(|e| e.is_current()),
        None => {}
    }
    normalize_period(current, end_date);
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewExperience {
    pub position: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: YearMonth,
    #[serde(default)]
    pub end_date: Option<EndDate>,
    #[serde(default)]
    pub current: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl NewExperience {
    pub fn into_entry(self, id: Uuid) -> Result<ExperienceEntry, ValidationError> {
        let mut current = false;
        let mut end_date = None;
        apply_period(&mut current, &mut end_date, self.current, Some(self.end_date));
        validate_period(self.start_date, end_date)?;
        Ok(ExperienceEntry {
            id,
            position: self.position,
            company: self.company,
            location: self.location,
            start_date: self.start_date,
            end_date,
            current,
            description: self.description,
            achievements: self.achievements,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExperiencePatch {
    pub position: Option<String>,
    pub company: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub start_date: Option<YearMonth>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<EndDate>>,
    pub current: Option<bool>,
    pub description: Option<String>,
    pub achievements: Option<Vec<String>>,
}

impl ExperiencePatch {
    pub fn apply(self, entry: &mut ExperienceEntry) -> Result<(), ValidationError> {
        if let Some(v) = self.position {
            entry.position = v;
        }
        if let Some(v) = self.company {
            entry.company = v;
        }
        if let Some(v) = self.location {
            entry.location = v;
        }
        if let Some(v) = self.start_date {
            entry.start_date = v;
        }
        apply_period(
            &mut entry.current,
            &mut entry.end_date,
            self.current,
            self.end_date,
        );
        if let Some(v) = self.description {
            entry.description = v;
        }
        if let Some(v) = self.achievements {
            entry.achievements = v;
        }
        validate_period(entry.start_date, entry.end_date)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEducation {
    pub degree: String,
    #[serde(default)]
    pub field: String,
    pub school: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: YearMonth,
    #[serde(default)]
    pub end_date: Option<EndDate>,
    #[serde(default)]
    pub current: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl NewEducation {
    pub fn into_entry(self, id: Uuid) -> Result<EducationEntry, ValidationError> {
        let mut current = false;
        let mut end_date = None;
        apply_period(&mut current, &mut end_date, self.current, Some(self.end_date));
        validate_period(self.start_date, end_date)?;
        Ok(EducationEntry {
            id,
            degree: self.degree,
            field: self.field,
            school: self.school,
            location: self.location,
            start_date: self.start_date,
            end_date,
            current,
            description: self.description,
            achievements: self.achievements,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EducationPatch {
    pub degree: Option<String>,
    pub field: Option<String>,
    pub school: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub start_date: Option<YearMonth>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<EndDate>>,
    pub current: Option<bool>,
    pub description: Option<String>,
    pub achievements: Option<Vec<String>>,
}

impl EducationPatch {
    pub fn apply(self, entry: &mut EducationEntry) -> Result<(), ValidationError> {
        if let Some(v) = self.degree {
            entry.degree = v;
        }
        if let Some(v) = self.field {
            entry.field = v;
        }
        if let Some(v) = self.school {
            entry.school = v;
        }
        if let Some(v) = self.location {
            entry.location = v;
        }
        if let Some(v) = self.start_date {
            entry.start_date = v;
        }
        apply_period(
            &mut entry.current,
            &mut entry.end_date,
            self.current,
            self.end_date,
        );
        if let Some(v) = self.description {
            entry.description = v;
        }
        if let Some(v) = self.achievements {
            entry.achievements = v;
        }
        validate_period(entry.start_date, entry.end_date)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills & languages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSkill {
    pub name: String,
    pub level: SkillLevel,
    pub category: SkillCategory,
}

impl NewSkill {
    pub fn into_entry(self, id: Uuid) -> SkillEntry {
        SkillEntry {
            id,
            name: self.name,
            level: self.level,
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub level: Option<SkillLevel>,
    pub category: Option<SkillCategory>,
}

impl SkillPatch {
    pub fn apply(self, entry: &mut SkillEntry) {
        if let Some(v) = self.name {
            entry.name = v;
        }
        if let Some(v) = self.level {
            entry.level = v;
        }
        if let Some(v) = self.category {
            entry.category = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewLanguage {
    pub name: String,
    pub level: LanguageLevel,
    #[serde(default)]
    pub certification: Option<String>,
}

impl NewLanguage {
    pub fn into_entry(self, id: Uuid) -> LanguageEntry {
        LanguageEntry {
            id,
            name: self.name,
            level: self.level,
            certification: self.certification,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LanguagePatch {
    pub name: Option<String>,
    pub level: Option<LanguageLevel>,
    #[serde(default, deserialize_with = "double_option")]
    pub certification: Option<Option<String>>,
}

impl LanguagePatch {
    pub fn apply(self, entry: &mut LanguageEntry) {
        if let Some(v) = self.name {
            entry.name = v;
        }
        if let Some(v) = self.level {
            entry.level = v;
        }
        if let Some(v) = self.certification {
            entry.certification = v;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Personal info & customization
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonalInfoPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub summary: Option<String>,
    pub links: Option<PersonalLinks>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo_layout: Option<Option<PhotoLayout>>,
}

impl PersonalInfoPatch {
    /// Validates the patch, then shallow-merges it. Nothing is applied on error.
    pub fn apply(self, personal: &mut PersonalInfo) -> Result<(), ValidationError> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(Some(photo)) = &self.photo {
            validate_photo(photo)?;
        }

        if let Some(v) = self.full_name {
            personal.full_name = v;
        }
        if let Some(v) = self.email {
            personal.email = v;
        }
        if let Some(v) = self.phone {
            personal.phone = v;
        }
        if let Some(v) = self.address {
            personal.address = v;
        }
        if let Some(v) = self.summary {
            personal.summary = v;
        }
        if let Some(v) = self.links {
            personal.links = v;
        }
        if let Some(v) = self.photo {
            personal.photo = v;
        }
        if let Some(v) = self.photo_layout {
            personal.photo_layout = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomizationPatch {
    pub template: Option<TemplateId>,
    pub primary_color: Option<HexColor>,
    pub secondary_color: Option<HexColor>,
    #[serde(default, deserialize_with = "double_option")]
    pub font_family: Option<Option<FontFamily>>,
    #[serde(default, deserialize_with = "double_option")]
    pub spacing: Option<Option<Spacing>>,
    #[serde(default, deserialize_with = "double_option")]
    pub language: Option<Option<CvLanguage>>,
    pub section_visibility: Option<SectionVisibility>,
}

impl CustomizationPatch {
    pub fn apply(self, customization: &mut Customization) {
        if let Some(v) = self.template {
            customization.template = v;
        }
        if let Some(v) = self.primary_color {
            customization.primary_color = v;
        }
        if let Some(v) = self.secondary_color {
            customization.secondary_color = v;
        }
        if let Some(v) = self.font_family {
            customization.font_family = v;
        }
        if let Some(v) = self.spacing {
            customization.spacing = v;
        }
        if let Some(v) = self.language {
            customization.language = v;
        }
        if let Some(v) = self.section_visibility {
            customization.section_visibility = v;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field validators
// ────────────────────────────────────────────────────────────────────────────

/// Empty is allowed (the field is optional); anything else needs `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }
    let invalid = || ValidationError::InvalidEmail(email.to_string());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Accepts raw base64 or a `data:image/<type>;base64,<payload>` URL.
pub fn validate_photo(photo: &str) -> Result<(), ValidationError> {
    let payload = match photo.strip_prefix("data:") {
        Some(rest) => {
            let (media, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| ValidationError::InvalidPhoto("expected a base64 data URL".into()))?;
            if !media.starts_with("image/") {
                return Err(ValidationError::InvalidPhoto(format!(
                    "unsupported media type '{media}'"
                )));
            }
            payload
        }
        None => photo,
    };
    general_purpose::STANDARD
        .decode(payload.trim())
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidPhoto(e.to_string()))
}
