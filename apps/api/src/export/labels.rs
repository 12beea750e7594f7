//! Localized headings and labels for exported documents.

use crate::models::customization::CvLanguage;
use crate::models::cv::{LanguageLevel, SkillCategory, SkillLevel};

pub struct Labels {
    pub summary: &'static str,
    pub experience: &'static str,
    pub education: &'static str,
    pub skills: &'static str,
    pub languages: &'static str,
    pub present: &'static str,
    pub native: &'static str,
    /// Indexed in `SkillCategory::ALL` order.
    categories: [&'static str; 4],
    /// Beginner, intermediate, advanced, expert.
    levels: [&'static str; 4],
}

impl Labels {
    pub fn category(&self, category: SkillCategory) -> &'static str {
        match category {
            SkillCategory::Technical => self.categories[0],
            SkillCategory::Soft => self.categories[1],
            SkillCategory::Language => self.categories[2],
            SkillCategory::Other => self.categories[3],
        }
    }

    pub fn skill_level(&self, level: SkillLevel) -> &'static str {
        match level {
            SkillLevel::Beginner => self.levels[0],
            SkillLevel::Intermediate => self.levels[1],
            SkillLevel::Advanced => self.levels[2],
            SkillLevel::Expert => self.levels[3],
        }
    }

    pub fn language_level(&self, level: LanguageLevel) -> &'static str {
        match level {
            LanguageLevel::A1 => "A1",
            LanguageLevel::A2 => "A2",
            LanguageLevel::B1 => "B1",
            LanguageLevel::B2 => "B2",
            LanguageLevel::C1 => "C1",
            LanguageLevel::C2 => "C2",
            LanguageLevel::Native => self.native,
        }
    }
}

static EN: Labels = Labels {
    summary: "Profile",
    experience: "Experience",
    education: "Education",
    skills: "Skills",
    languages: "Languages",
    present: "Present",
    native: "Native",
    categories: ["Technical", "Soft skills", "Languages", "Other"],
    levels: ["Beginner", "Intermediate", "Advanced", "Expert"],
};

static ES: Labels = Labels {
    summary: "Perfil",
    experience: "Experiencia",
    education: "Formación",
    skills: "Habilidades",
    languages: "Idiomas",
    present: "Actualidad",
    native: "Nativo",
    categories: ["Técnicas", "Blandas", "Idiomas", "Otras"],
    levels: ["Básico", "Intermedio", "Avanzado", "Experto"],
};

static FR: Labels = Labels {
    summary: "Profil",
    experience: "Expérience",
    education: "Formation",
    skills: "Compétences",
    languages: "Langues",
    present: "Présent",
    native: "Langue maternelle",
    categories: ["Techniques", "Savoir-être", "Langues", "Autres"],
    levels: ["Débutant", "Intermédiaire", "Avancé", "Expert"],
};

static DE: Labels = Labels {
    summary: "Profil",
    experience: "Berufserfahrung",
    education: "Ausbildung",
    skills: "Kenntnisse",
    languages: "Sprachen",
    present: "Heute",
    native: "Muttersprache",
    categories: ["Fachlich", "Persönlich", "Sprachen", "Sonstiges"],
    levels: ["Grundkenntnisse", "Fortgeschritten", "Sehr gut", "Experte"],
};

static IT: Labels = Labels {
    summary: "Profilo",
    experience: "Esperienza",
    education: "Istruzione",
    skills: "Competenze",
    languages: "Lingue",
    present: "Oggi",
    native: "Madrelingua",
    categories: ["Tecniche", "Trasversali", "Lingue", "Altro"],
    levels: ["Base", "Intermedio", "Avanzato", "Esperto"],
};

pub fn labels_for(language: CvLanguage) -> &'static Labels {
    match language {
        CvLanguage::En => &EN,
        CvLanguage::Es => &ES,
        CvLanguage::Fr => &FR,
        CvLanguage::De => &DE,
        CvLanguage::It => &IT,
    }
}
