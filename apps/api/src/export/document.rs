//! Format-neutral layout of a CV, shared by the PDF and DOCX exporters.
//!
//! Section order is fixed: summary, experience, education, skills grouped by category,
//! languages. Hidden or empty sections are left out.

use crate::export::labels::{labels_for, Labels};
use crate::models::cv::{EducationEntry, ExperienceEntry, SkillCategory};
use crate::models::dates::{EndDate, YearMonth};
use crate::models::CvAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Languages,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlock {
    pub title: String,
    pub subtitle: String,
    pub period: String,
    pub description: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    Entry(EntryBlock),
    /// A bold label followed by plain text on the same line.
    Labeled { label: String, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CvDocument {
    pub name: String,
    /// Email, phone, address and links, in that order, blanks skipped.
    pub contact: Vec<String>,
    pub sections: Vec<Section>,
    pub primary_rgb: (u8, u8, u8),
    pub secondary_rgb: (u8, u8, u8),
    pub line_height_factor: f32,
}

impl CvDocument {
    pub fn build(cv: &CvAggregate) -> Self {
        let customization = &cv.customization;
        let labels = labels_for(customization.language.unwrap_or_default());
        let visible = customization.section_visibility;
        let personal = &cv.personal;

        let contact = [
            personal.email.as_str(),
            personal.phone.as_str(),
            personal.address.as_str(),
        ]
        .into_iter()
        .chain(personal.links.iter())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

        let mut sections = Vec::new();
        if visible.summary && !personal.summary.trim().is_empty() {
            sections.push(Section {
                kind: SectionKind::Summary,
                heading: labels.summary.to_string(),
                blocks: vec![Block::Paragraph(personal.summary.trim().to_string())],
            });
        }
        if visible.experience && !cv.experience.is_empty() {
            sections.push(Section {
                kind: SectionKind::Experience,
                heading: labels.experience.to_string(),
                blocks: cv
                    .experience
                    .iter()
                    .map(|e| Block::Entry(experience_block(e, labels)))
                    .collect(),
            });
        }
        if visible.education && !cv.education.is_empty() {
            sections.push(Section {
                kind: SectionKind::Education,
                heading: labels.education.to_string(),
                blocks: cv
                    .education
                    .iter()
                    .map(|e| Block::Entry(education_block(e, labels)))
                    .collect(),
            });
        }
        if visible.skills && !cv.skills.is_empty() {
            sections.push(Section {
                kind: SectionKind::Skills,
                heading: labels.skills.to_string(),
                blocks: skill_blocks(cv, labels),
            });
        }
        if visible.languages && !cv.languages.is_empty() {
            sections.push(Section {
                kind: SectionKind::Languages,
                heading: labels.languages.to_string(),
                blocks: cv
                    .languages
                    .iter()
                    .map(|l| {
                        let level = labels.language_level(l.level);
                        let text = match l.certification.as_deref().map(str::trim) {
                            Some(cert) if !cert.is_empty() => format!("{level} ({cert})"),
                            _ => level.to_string(),
                        };
                        Block::Labeled {
                            label: l.name.clone(),
                            text,
                        }
                    })
                    .collect(),
            });
        }

        Self {
            name: personal.full_name.trim().to_string(),
            contact,
            sections,
            primary_rgb: customization.primary_color.rgb(),
            secondary_rgb: customization.secondary_color.rgb(),
            line_height_factor: customization.spacing.unwrap_or_default().line_height_factor(),
        }
    }
}

fn period(start: YearMonth, end: Option<&EndDate>, labels: &Labels) -> String {
    let start = start.display_short();
    match end {
        Some(EndDate::Current) => format!("{start} - {}", labels.present),
        Some(EndDate::Month(end)) => format!("{start} - {}", end.display_short()),
        None => start,
    }
}

fn joined(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn experience_block(entry: &ExperienceEntry, labels: &Labels) -> EntryBlock {
    EntryBlock {
        title: entry.position.trim().to_string(),
        subtitle: joined(&[Some(entry.company.as_str()), entry.location.as_deref()]),
        period: period(entry.start_date, entry.end_date.as_ref(), labels),
        description: entry.description.trim().to_string(),
        bullets: non_blank(&entry.achievements),
    }
}

fn education_block(entry: &EducationEntry, labels: &Labels) -> EntryBlock {
    let title = if entry.field.trim().is_empty() {
        entry.degree.trim().to_string()
    } else {
        format!("{}, {}", entry.degree.trim(), entry.field.trim())
    };
    EntryBlock {
        title,
        subtitle: joined(&[Some(entry.school.as_str()), entry.location.as_deref()]),
        period: period(entry.start_date, entry.end_date.as_ref(), labels),
        description: entry.description.trim().to_string(),
        bullets: non_blank(&entry.achievements),
    }
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One line per non-empty category, in `SkillCategory::ALL` order.
fn skill_blocks(cv: &CvAggregate, labels: &Labels) -> Vec<Block> {
    SkillCategory::ALL
        .iter()
        .filter_map(|category| {
            let names: Vec<String> = cv
                .skills
                .iter()
                .filter(|s| s.category == *category)
                .map(|s| format!("{} ({})", s.name.trim(), labels.skill_level(s.level)))
                .collect();
            (!names.is_empty()).then(|| Block::Labeled {
                label: labels.category(*category).to_string(),
                text: names.join(", "),
            })
        })
        .collect()
}
