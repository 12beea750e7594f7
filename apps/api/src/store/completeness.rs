use serde::{Deserialize, Serialize};

use crate::models::CvAggregate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub entry_count: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("personal", 0.30),
    ("experience", 0.30),
    ("education", 0.15),
    ("skills", 0.15),
    ("languages", 0.10),
];

/// Number of entries at which a collection section scores 1.0.
const TARGET_ENTRIES: &[(&str, usize)] = &[
    ("experience", 2),
    ("education", 1),
    ("skills", 5),
    ("languages", 2),
];

fn status_for(score: f64) -> SectionStatus {
    match score {
        s if s >= 0.8 => SectionStatus::Strong,
        s if s >= 0.5 => SectionStatus::Moderate,
        s if s > 0.0 => SectionStatus::Weak,
        _ => SectionStatus::Missing,
    }
}

fn personal_health(cv: &CvAggregate) -> SectionHealth {
    let p = &cv.personal;
    let fields = [
        ("full name", !p.full_name.trim().is_empty()),
        ("email", !p.email.trim().is_empty()),
        ("phone", !p.phone.trim().is_empty()),
        ("address", !p.address.trim().is_empty()),
        ("summary", !p.summary.trim().is_empty()),
    ];
    let filled = fields.iter().filter(|(_, ok)| *ok).count();
    let score = filled as f64 / fields.len() as f64;

    let mut recommendations: Vec<String> = fields
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| format!("Add your {name}"))
        .collect();
    if p.has_identity() && p.summary.trim().split_whitespace().count() < 20 && !p.summary.is_empty()
    {
        recommendations.push("Expand your summary to at least a few sentences".to_string());
    }

    SectionHealth {
        section: "personal".to_string(),
        score,
        entry_count: filled,
        status: status_for(score),
        recommendations,
    }
}

fn collection_health(cv: &CvAggregate, section: &str) -> SectionHealth {
    let target = TARGET_ENTRIES
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, n)| *n)
        .unwrap_or(1);

    let (entry_count, undocumented) = match section {
        "experience" => (
            cv.experience.len(),
            cv.experience
                .iter()
                .filter(|e| e.description.trim().is_empty() && e.achievements.is_empty())
                .count(),
        ),
        "education" => (cv.education.len(), 0),
        "skills" => (cv.skills.len(), 0),
        "languages" => (cv.languages.len(), 0),
        _ => (0, 0),
    };

    let coverage = (entry_count as f64 / target as f64).min(1.0);
    // Entries with neither description nor achievements count for half.
    let quality_penalty = if entry_count > 0 {
        0.5 * undocumented as f64 / entry_count as f64
    } else {
        0.0
    };
    let score = (coverage * (1.0 - quality_penalty)).clamp(0.0, 1.0);

    let mut recommendations = Vec::new();
    if entry_count == 0 {
        recommendations.push(format!("Add at least one {section} entry"));
    } else if entry_count < target {
        recommendations.push(format!(
            "Add {} more {section} entr{} for a complete picture",
            target - entry_count,
            if target - entry_count == 1 { "y" } else { "ies" }
        ));
    }
    if undocumented > 0 {
        recommendations.push(format!(
            "{undocumented} {section} entries have no description or achievements"
        ));
    }

    SectionHealth {
        section: section.to_string(),
        score,
        entry_count,
        status: status_for(score),
        recommendations,
    }
}

/// Scores how complete a CV is, section by section.
pub fn compute_completeness_report(cv: &CvAggregate) -> CompletenessReport {
    let mut sections = Vec::new();
    let mut weighted_score_sum = 0.0;
    let mut missing_sections = Vec::new();

    for (section, weight) in SECTION_WEIGHTS {
        let health = if *section == "personal" {
            personal_health(cv)
        } else {
            collection_health(cv, section)
        };
        if health.status == SectionStatus::Missing {
            missing_sections.push(section.to_string());
        }
        weighted_score_sum += health.score * weight;
        sections.push(health);
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let overall_score = if total_weight > 0.0 {
        (weighted_score_sum / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    CompletenessReport {
        overall_score,
        sections,
        missing_sections,
    }
}
