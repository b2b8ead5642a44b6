use serde::{Deserialize, Serialize};

pub const DEFAULT_NATIONALITY: &str = "India";

/// Candidate resume data, persisted in camelCase to stay compatible with
/// previously stored `userAuth` / `registeredUsers` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRecord {
    pub name: String,
    pub father_name: String,
    pub dob: String,
    pub gender: String,
    pub district: String,
    pub state: String,
    pub street: String,
    pub area: String,
    pub area_type: String,
    pub phone: String,
    // Login identifier, kept apart from the contact phone
    pub mobile: String,
    pub email: String,
    pub nationality: String,
    pub desired_career: String,
    pub short_profile_description: String,
    pub profile_picture: Option<String>,
    pub languages: Vec<LanguageEntry>,
    pub education_details: Vec<EducationEntry>,
    pub internships: Vec<InternshipEntry>,
    pub projects: Vec<ProjectEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
}

impl Default for ProfileRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            father_name: String::new(),
            dob: String::new(),
            gender: String::new(),
            district: String::new(),
            state: String::new(),
            street: String::new(),
            area: String::new(),
            area_type: String::new(),
            phone: String::new(),
            mobile: String::new(),
            email: String::new(),
            nationality: DEFAULT_NATIONALITY.to_string(),
            desired_career: String::new(),
            short_profile_description: String::new(),
            profile_picture: None,
            languages: Vec::new(),
            education_details: Vec::new(),
            internships: Vec::new(),
            projects: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageEntry {
    pub id: i64,
    pub language: String,
    pub proficiency: String, // "Beginner", "Proficient", "Expert"
    pub read: bool,
    pub write: bool,
    pub speak: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String, // "10th", "12th", "Graduation", ...
    pub course: String,
    pub specialization: String,
    pub passing_year: String,
    pub institute: String,
    pub cgpa_or_percentage: String,
    pub course_type: String, // "Full Time", "Part Time", "Distance"
    pub document_file: Option<String>,
    pub is_saved: bool,
    pub is_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InternshipEntry {
    pub company_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: String,
    pub project_name: String,
    pub responsibilities: String,
    pub stipend: String,
    pub certificate_file: Option<String>,
    pub is_saved: bool,
    pub is_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectEntry {
    pub title: String,
    pub description: String,
    pub url: String,
    pub document_file: Option<String>,
    pub is_saved: bool,
    pub is_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub job_title: String,
    pub company_name: String,
    pub employment_type: String,
    pub is_current_job: bool,
    pub start_year: String,
    pub start_month: String,
    pub end_year: String,
    pub end_month: String,
    pub description: String,
    // Only filled when is_current_job is set
    pub current_company: String,
    pub current_role: String,
    pub current_salary: String,
    pub current_experience: String,
    pub document_file: Option<String>,
    pub is_saved: bool,
    pub is_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillEntry {
    pub id: i64,
    pub name: String,
    pub mode: String, // "Online" or "Offline"
    pub institute_name: String, // set when mode is "Offline"
    pub platform_name: String,  // set when mode is "Online"
    pub duration: String,
    pub certificate_file: Option<String>,
    pub is_saved: bool,
    pub is_open: bool,
}

/// Partial profile. `Some` replaces the whole field (sequences included),
/// `None` leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_career: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_profile_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_details: Option<Vec<EducationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internships: Option<Vec<InternshipEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<ExperienceEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<SkillEntry>>,
}

impl ProfilePatch {
    /// Shallow merge into `profile`. Nested sequences are swapped wholesale,
    /// never reconciled element by element.
    pub fn apply_to(self, profile: &mut ProfileRecord) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut profile.name, self.name);
        set(&mut profile.father_name, self.father_name);
        set(&mut profile.dob, self.dob);
        set(&mut profile.gender, self.gender);
        set(&mut profile.district, self.district);
        set(&mut profile.state, self.state);
        set(&mut profile.street, self.street);
        set(&mut profile.area, self.area);
        set(&mut profile.area_type, self.area_type);
        set(&mut profile.phone, self.phone);
        set(&mut profile.mobile, self.mobile);
        set(&mut profile.email, self.email);
        set(&mut profile.nationality, self.nationality);
        set(&mut profile.desired_career, self.desired_career);
        set(&mut profile.short_profile_description, self.short_profile_description);
        if self.profile_picture.is_some() {
            profile.profile_picture = self.profile_picture;
        }
        set(&mut profile.languages, self.languages);
        set(&mut profile.education_details, self.education_details);
        set(&mut profile.internships, self.internships);
        set(&mut profile.projects, self.projects);
        set(&mut profile.experience, self.experience);
        set(&mut profile.skills, self.skills);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ProfileRecord> for ProfilePatch {
    fn from(p: ProfileRecord) -> Self {
        Self {
            name: Some(p.name),
            father_name: Some(p.father_name),
            dob: Some(p.dob),
            gender: Some(p.gender),
            district: Some(p.district),
            state: Some(p.state),
            street: Some(p.street),
            area: Some(p.area),
            area_type: Some(p.area_type),
            phone: Some(p.phone),
            mobile: Some(p.mobile),
            email: Some(p.email),
            nationality: Some(p.nationality),
            desired_career: Some(p.desired_career),
            short_profile_description: Some(p.short_profile_description),
            profile_picture: p.profile_picture,
            languages: Some(p.languages),
            education_details: Some(p.education_details),
            internships: Some(p.internships),
            projects: Some(p.projects),
            experience: Some(p.experience),
            skills: Some(p.skills),
        }
    }
}

/// One entry of the registered-users master list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAccount {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub password: String, // plaintext, compared with ==
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

/// Payload of the register form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub password: String,
    #[serde(flatten)]
    pub fields: ProfilePatch,
}

/// Snapshot persisted under `userAuth`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub is_logged_in: bool,
    pub user_name: Option<String>,
    pub profile: ProfileRecord,
    pub profile_completion: u8,
    pub registered_users: Vec<AuthAccount>,
}
