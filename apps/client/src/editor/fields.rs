use std::fmt;
use std::str::FromStr;

use crate::errors::ClientError;
use crate::models::resume::{
    Customization, EducationEntry, ExperienceEntry, LanguageEntry, PersonalData, Resume,
    ResumePatch, SkillEntry,
};

/// A key inside `personal_data`. Accepts the wire name (`lastName`), the
/// snake-case name and an optional `personal_data.` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalField {
    Name,
    LastName,
    Email,
    Phone,
    Address,
    Linkedin,
    Portfolio,
}

impl PersonalField {
    fn slot(self, data: &mut PersonalData) -> &mut Option<String> {
        match self {
            PersonalField::Name => &mut data.name,
            PersonalField::LastName => &mut data.last_name,
            PersonalField::Email => &mut data.email,
            PersonalField::Phone => &mut data.phone,
            PersonalField::Address => &mut data.address,
            PersonalField::Linkedin => &mut data.linkedin,
            PersonalField::Portfolio => &mut data.portfolio,
        }
    }
}

impl FromStr for PersonalField {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.strip_prefix("personal_data.").unwrap_or(s);
        match key {
            "name" => Ok(PersonalField::Name),
            "lastName" | "last_name" => Ok(PersonalField::LastName),
            "email" => Ok(PersonalField::Email),
            "phone" => Ok(PersonalField::Phone),
            "address" => Ok(PersonalField::Address),
            "linkedin" => Ok(PersonalField::Linkedin),
            "portfolio" => Ok(PersonalField::Portfolio),
            other => Err(ClientError::Validation(format!(
                "Unknown personal field '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PersonalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            PersonalField::Name => "name",
            PersonalField::LastName => "lastName",
            PersonalField::Email => "email",
            PersonalField::Phone => "phone",
            PersonalField::Address => "address",
            PersonalField::Linkedin => "linkedin",
            PersonalField::Portfolio => "portfolio",
        };
        f.write_str(key)
    }
}

/// One user edit in the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Title(String),
    Personal(PersonalField, String),
    Summary(String),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Skills(Vec<SkillEntry>),
    Languages(Vec<LanguageEntry>),
    Template(String),
    Customization(Customization),
}

impl FieldEdit {
    /// Applies the edit to the working copy and returns the top-level delta.
    ///
    /// A personal-data edit yields the whole `personal_data` object as it now
    /// stands, so edits to different keys in one window merge without loss.
    pub(crate) fn apply(self, resume: &mut Resume) -> ResumePatch {
        let content = &mut resume.content;
        let mut patch = ResumePatch::default();
        match self {
            FieldEdit::Title(title) => {
                content.title = title.clone();
                patch.title = Some(title);
            }
            FieldEdit::Personal(field, value) => {
                *field.slot(&mut content.personal_data) = Some(value);
                patch.personal_data = Some(content.personal_data.clone());
            }
            FieldEdit::Summary(summary) => {
                content.summary = Some(summary.clone());
                patch.summary = Some(Some(summary));
            }
            FieldEdit::Experience(entries) => {
                content.experience = entries.clone();
                patch.experience = Some(entries);
            }
            FieldEdit::Education(entries) => {
                content.education = entries.clone();
                patch.education = Some(entries);
            }
            FieldEdit::Skills(entries) => {
                content.skills = entries.clone();
                patch.skills = Some(entries);
            }
            FieldEdit::Languages(entries) => {
                content.languages = entries.clone();
                patch.languages = Some(entries);
            }
            FieldEdit::Template(template_id) => {
                content.template_id = template_id.clone();
                patch.template_id = Some(template_id);
            }
            FieldEdit::Customization(options) => {
                content.customization_options = options.clone();
                patch.customization_options = Some(options);
            }
        }
        patch
    }

    /// Builds an edit from a field name and a raw text value.
    ///
    /// Scalars take the text as is. `skills` and `languages` take a
    /// comma-separated list of names; the other sections take JSON.
    pub fn parse(field: &str, value: &str) -> Result<FieldEdit, ClientError> {
        let edit = match field {
            "title" => FieldEdit::Title(value.to_string()),
            "summary" => FieldEdit::Summary(value.to_string()),
            "template" | "template_id" => FieldEdit::Template(value.trim().to_string()),
            "skills" => FieldEdit::Skills(
                split_names(value)
                    .map(|name| SkillEntry { name, level: None })
                    .collect(),
            ),
            "languages" => FieldEdit::Languages(
                split_names(value)
                    .map(|name| LanguageEntry {
                        name,
                        proficiency: None,
                    })
                    .collect(),
            ),
            "experience" => FieldEdit::Experience(serde_json::from_str(value)?),
            "education" => FieldEdit::Education(serde_json::from_str(value)?),
            "customization" | "customization_options" => {
                FieldEdit::Customization(serde_json::from_str(value)?)
            }
            other => FieldEdit::Personal(other.parse()?, value.to_string()),
        };
        Ok(edit)
    }
}

fn split_names(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
