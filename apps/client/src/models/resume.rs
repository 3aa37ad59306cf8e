use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Treats an explicit JSON `null` the same as a missing key.
/// The `resumes` table allows nulls in every content column.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub start_date: Option<String>,
    /// `None` means current position.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
}

/// Template customization chosen in the editor sidebar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_pt: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section_order: Vec<String>,
    /// Keys this client does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Everything about a resume except its identity, owner and timestamps.
///
/// This is also the shape a version snapshot is decoded into on restore:
/// identity keys present in the stored payload are dropped by serde.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_data: PersonalData,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<SkillEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<LanguageEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customization_options: Customization,
}

/// A full row of the `resumes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub content: ResumeContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    /// Folds a patch into this resume. `updated_at` is taken from the patch when set.
    pub fn apply(&mut self, patch: &ResumePatch) {
        let content = &mut self.content;
        if let Some(title) = &patch.title {
            content.title = title.clone();
        }
        if let Some(personal_data) = &patch.personal_data {
            content.personal_data = personal_data.clone();
        }
        if let Some(summary) = &patch.summary {
            content.summary = summary.clone();
        }
        if let Some(experience) = &patch.experience {
            content.experience = experience.clone();
        }
        if let Some(education) = &patch.education {
            content.education = education.clone();
        }
        if let Some(skills) = &patch.skills {
            content.skills = skills.clone();
        }
        if let Some(languages) = &patch.languages {
            content.languages = languages.clone();
        }
        if let Some(template_id) = &patch.template_id {
            content.template_id = template_id.clone();
        }
        if let Some(customization) = &patch.customization_options {
            content.customization_options = customization.clone();
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }

    pub fn with_patch(&self, patch: &ResumePatch) -> Resume {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Dashboard projection: `select=id,title,updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewResume {
    pub user_id: Uuid,
    pub title: String,
}

/// A partial update of a resume row. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_data: Option<PersonalData>,
    /// `Some(None)` clears the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<ExperienceEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<EducationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<SkillEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization_options: Option<Customization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResumePatch {
    /// A patch that overwrites every content field.
    pub fn from_content(content: ResumeContent) -> Self {
        Self {
            title: Some(content.title),
            personal_data: Some(content.personal_data),
            summary: Some(content.summary),
            experience: Some(content.experience),
            education: Some(content.education),
            skills: Some(content.skills),
            languages: Some(content.languages),
            template_id: Some(content.template_id),
            customization_options: Some(content.customization_options),
            updated_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty() && self.updated_at.is_none()
    }

    /// Union of two patches; fields set in `newer` win.
    pub fn merge(&mut self, newer: ResumePatch) {
        let ResumePatch {
            title,
            personal_data,
            summary,
            experience,
            education,
            skills,
            languages,
            template_id,
            customization_options,
            updated_at,
        } = newer;
        if title.is_some() {
            self.title = title;
        }
        if personal_data.is_some() {
            self.personal_data = personal_data;
        }
        if summary.is_some() {
            self.summary = summary;
        }
        if experience.is_some() {
            self.experience = experience;
        }
        if education.is_some() {
            self.education = education;
        }
        if skills.is_some() {
            self.skills = skills;
        }
        if languages.is_some() {
            self.languages = languages;
        }
        if template_id.is_some() {
            self.template_id = template_id;
        }
        if customization_options.is_some() {
            self.customization_options = customization_options;
        }
        if updated_at.is_some() {
            self.updated_at = updated_at;
        }
    }

    /// Drops the named columns from this patch. Unknown names are ignored.
    pub fn clear_fields(&mut self, fields: &[&str]) {
        for field in fields {
            match *field {
                "title" => self.title = None,
                "personal_data" => self.personal_data = None,
                "summary" => self.summary = None,
                "experience" => self.experience = None,
                "education" => self.education = None,
                "skills" => self.skills = None,
                "languages" => self.languages = None,
                "template_id" => self.template_id = None,
                "customization_options" => self.customization_options = None,
                _ => {}
            }
        }
    }

    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Column names carried by this patch, for logs.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.personal_data.is_some() {
            fields.push("personal_data");
        }
        if self.summary.is_some() {
            fields.push("summary");
        }
        if self.experience.is_some() {
            fields.push("experience");
        }
        if self.education.is_some() {
            fields.push("education");
        }
        if self.skills.is_some() {
            fields.push("skills");
        }
        if self.languages.is_some() {
            fields.push("languages");
        }
        if self.template_id.is_some() {
            fields.push("template_id");
        }
        if self.customization_options.is_some() {
            fields.push("customization_options");
        }
        fields
    }
}
