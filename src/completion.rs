use crate::models::ProfileRecord;

const CHECKS: u8 = 5;

/// Which of the five completion checks a profile passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionReport {
    pub personal: bool,
    pub contact: bool,
    pub education: bool,
    pub career: bool,
    pub languages: bool,
}

impl CompletionReport {
    pub fn for_profile(profile: &ProfileRecord) -> Self {
        let has_address =
            filled(&profile.street) || filled(&profile.area) || filled(&profile.district);
        Self {
            personal: filled(&profile.name) && filled(&profile.dob) && filled(&profile.gender),
            contact: filled(&profile.mobile) && filled(&profile.email) && has_address,
            education: !profile.education_details.is_empty(),
            career: filled(&profile.desired_career),
            languages: !profile.languages.is_empty(),
        }
    }

    pub fn satisfied(&self) -> u8 {
        [self.personal, self.contact, self.education, self.career, self.languages]
            .iter()
            .filter(|ok| **ok)
            .count() as u8
    }

    pub fn percent(&self) -> u8 {
        self.satisfied() * 100 / CHECKS
    }

    /// Human labels for the checks still failing.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.personal {
            missing.push("name, date of birth and gender");
        }
        if !self.contact {
            missing.push("mobile, email and current address");
        }
        if !self.education {
            missing.push("at least one education entry");
        }
        if !self.career {
            missing.push("desired career");
        }
        if !self.languages {
            missing.push("at least one language");
        }
        missing
    }
}

/// Percentage in {0, 20, 40, 60, 80, 100}.
pub fn profile_completion(profile: &ProfileRecord) -> u8 {
    CompletionReport::for_profile(profile).percent()
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}
