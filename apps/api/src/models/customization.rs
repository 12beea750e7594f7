use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";
pub const DEFAULT_SECONDARY_COLOR: &str = "#64748b";

/// The nine named CV templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    #[default]
    Modern,
    Classic,
    Minimal,
    Creative,
    Professional,
    Executive,
    Technical,
    Elegant,
    Compact,
}

impl TemplateId {
    pub const ALL: [TemplateId; 9] = [
        TemplateId::Modern,
        TemplateId::Classic,
        TemplateId::Minimal,
        TemplateId::Creative,
        TemplateId::Professional,
        TemplateId::Executive,
        TemplateId::Technical,
        TemplateId::Elegant,
        TemplateId::Compact,
    ];
}

/// A `#rgb` or `#rrggbb` colour, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expands the shorthand form and returns the three channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.0[1..];
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        if hex.len() == 3 {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            (expand(0), expand(1), expand(2))
        } else {
            (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]))
        }
    }
}

impl FromStr for HexColor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ValidationError::InvalidColor(s.to_string()))?;
        let valid_len = digits.len() == 3 || digits.len() == 6;
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidColor(s.to_string()));
        }
        Ok(HexColor(format!("#{}", digits.to_ascii_lowercase())))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Inter,
    Roboto,
    OpenSans,
    Lato,
    Merriweather,
    Garamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Relaxed,
}

impl Spacing {
    /// Line height as a multiple of the font size.
    pub fn line_height_factor(&self) -> f32 {
        match self {
            Spacing::Compact => 1.2,
            Spacing::Normal => 1.35,
            Spacing::Relaxed => 1.55,
        }
    }
}

/// Language used for section headings and labels in exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvLanguage {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionVisibility {
    pub summary: bool,
    pub experience: bool,
    pub education: bool,
    pub skills: bool,
    pub languages: bool,
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self {
            summary: true,
            experience: true,
            education: true,
            skills: true,
            languages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub template: TemplateId,
    pub primary_color: HexColor,
    pub secondary_color: HexColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<CvLanguage>,
    #[serde(default)]
    pub section_visibility: SectionVisibility,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            template: TemplateId::default(),
            primary_color: HexColor(DEFAULT_PRIMARY_COLOR.to_string()),
            secondary_color: HexColor(DEFAULT_SECONDARY_COLOR.to_string()),
            font_family: None,
            spacing: None,
            language: None,
            section_visibility: SectionVisibility::default(),
        }
    }
}
