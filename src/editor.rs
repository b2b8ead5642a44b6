use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

use crate::models::{
    EducationEntry, ExperienceEntry, InternshipEntry, LanguageEntry, ProfilePatch, ProfileRecord,
    ProjectEntry, SkillEntry,
};

/// Per-row UI state carried by the repeatable profile sections.
pub trait DraftEntry: Clone {
    fn is_saved(&self) -> bool;
    fn is_open(&self) -> bool;
    fn set_saved(&mut self, saved: bool);
    fn set_open(&mut self, open: bool);
}

macro_rules! draft_entry {
    ($($ty:ty),+) => {
        $(impl DraftEntry for $ty {
            fn is_saved(&self) -> bool { self.is_saved }
            fn is_open(&self) -> bool { self.is_open }
            fn set_saved(&mut self, saved: bool) { self.is_saved = saved; }
            fn set_open(&mut self, open: bool) { self.is_open = open; }
        })+
    };
}

draft_entry!(EducationEntry, InternshipEntry, ProjectEntry, ExperienceEntry, SkillEntry);

// Language rows have no draft state in the stored data, they are always committed
impl DraftEntry for LanguageEntry {
    fn is_saved(&self) -> bool {
        true
    }
    fn is_open(&self) -> bool {
        false
    }
    fn set_saved(&mut self, _saved: bool) {}
    fn set_open(&mut self, _open: bool) {}
}

/// Working copy of one repeatable section while it is being edited.
pub struct SectionEditor<T: DraftEntry> {
    items: Vec<T>,
}

impl<T: DraftEntry> SectionEditor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Append a new unsaved, expanded row. Returns its index.
    pub fn add_draft(&mut self, mut item: T) -> usize {
        item.set_saved(false);
        item.set_open(true);
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn save(&mut self, index: usize) -> Result<()> {
        let item = self.get_mut(index)?;
        item.set_saved(true);
        item.set_open(false);
        Ok(())
    }

    pub fn open(&mut self, index: usize) -> Result<()> {
        self.get_mut(index)?.set_open(true);
        Ok(())
    }

    /// Collapse a row. Rows that were never saved are dropped outright.
    /// Returns true if the row was discarded.
    pub fn close(&mut self, index: usize) -> Result<bool> {
        let item = self.get_mut(index)?;
        if item.is_saved() {
            item.set_open(false);
            Ok(false)
        } else {
            self.items.remove(index);
            Ok(true)
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.get_mut(index)?;
        Ok(self.items.remove(index))
    }

    /// Rows that may be persisted. Drafts never are.
    pub fn committed(&self) -> Vec<T> {
        self.items.iter().filter(|i| i.is_saved()).cloned().collect()
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| anyhow!("No entry #{} (section has {} entries)", index, len))
    }
}

/// The repeatable sections of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Languages,
    Education,
    Internships,
    Projects,
    Experience,
    Skills,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Languages => "languages",
            Section::Education => "education",
            Section::Internships => "internships",
            Section::Projects => "projects",
            Section::Experience => "experience",
            Section::Skills => "skills",
        }
    }

    /// Number of rows the section holds in `profile`.
    pub fn count(&self, profile: &ProfileRecord) -> usize {
        match self {
            Section::Languages => profile.languages.len(),
            Section::Education => profile.education_details.len(),
            Section::Internships => profile.internships.len(),
            Section::Projects => profile.projects.len(),
            Section::Experience => profile.experience.len(),
            Section::Skills => profile.skills.len(),
        }
    }

    /// Parse `json` as one entry of this section, add it as a draft, save it,
    /// and return the patch replacing the section with its committed rows.
    /// Entries with an `id` field get one from `next_id` when left at zero.
    pub fn add_entry(
        &self,
        profile: &ProfileRecord,
        json: &str,
        next_id: i64,
    ) -> Result<ProfilePatch> {
        fn add<T: DraftEntry + serde::de::DeserializeOwned>(
            items: &[T],
            json: &str,
            section: &str,
            assign_id: impl FnOnce(&mut T),
        ) -> Result<Vec<T>> {
            let mut entry: T = serde_json::from_str(json)
                .with_context(|| format!("Invalid {} entry JSON", section))?;
            assign_id(&mut entry);
            let mut editor = SectionEditor::new(items.to_vec());
            let index = editor.add_draft(entry);
            editor.save(index)?;
            Ok(editor.committed())
        }

        let label = self.label();
        let mut patch = ProfilePatch::default();
        match self {
            Section::Languages => {
                let rows = add(&profile.languages, json, label, |e: &mut LanguageEntry| {
                    if e.id == 0 {
                        e.id = next_id;
                    }
                })?;
                patch.languages = Some(rows);
            }
            Section::Education => {
                let rows = add(&profile.education_details, json, label, |e: &mut EducationEntry| {
                    if e.id == 0 {
                        e.id = next_id;
                    }
                })?;
                patch.education_details = Some(rows);
            }
            Section::Internships => {
                let rows = add(&profile.internships, json, label, |_: &mut InternshipEntry| {})?;
                patch.internships = Some(rows);
            }
            Section::Projects => {
                let rows = add(&profile.projects, json, label, |_: &mut ProjectEntry| {})?;
                patch.projects = Some(rows);
            }
            Section::Experience => {
                let rows = add(&profile.experience, json, label, |_: &mut ExperienceEntry| {})?;
                patch.experience = Some(rows);
            }
            Section::Skills => {
                let rows = add(&profile.skills, json, label, |e: &mut SkillEntry| {
                    if e.id == 0 {
                        e.id = next_id;
                    }
                })?;
                patch.skills = Some(rows);
            }
        }
        Ok(patch)
    }

    /// Run `apply` over a working copy of this section and return the patch
    /// holding its committed rows.
    pub fn edit<F>(&self, profile: &ProfileRecord, apply: F) -> Result<ProfilePatch>
    where
        F: Fn(&mut dyn SectionOps) -> Result<()>,
    {
        let mut patch = ProfilePatch::default();
        match self {
            Section::Languages => {
                let mut editor = SectionEditor::new(profile.languages.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.languages = Some(editor.committed());
            }
            Section::Education => {
                let mut editor = SectionEditor::new(profile.education_details.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.education_details = Some(editor.committed());
            }
            Section::Internships => {
                let mut editor = SectionEditor::new(profile.internships.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.internships = Some(editor.committed());
            }
            Section::Projects => {
                let mut editor = SectionEditor::new(profile.projects.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.projects = Some(editor.committed());
            }
            Section::Experience => {
                let mut editor = SectionEditor::new(profile.experience.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.experience = Some(editor.committed());
            }
            Section::Skills => {
                let mut editor = SectionEditor::new(profile.skills.clone());
                apply(&mut editor as &mut dyn SectionOps)?;
                patch.skills = Some(editor.committed());
            }
        }
        Ok(patch)
    }
}

/// Index-based operations on a section editor, independent of entry type.
pub trait SectionOps {
    fn open(&mut self, index: usize) -> Result<()>;
    fn close(&mut self, index: usize) -> Result<bool>;
    fn remove(&mut self, index: usize) -> Result<()>;
}

impl<T: DraftEntry> SectionOps for SectionEditor<T> {
    fn open(&mut self, index: usize) -> Result<()> {
        SectionEditor::open(self, index)
    }

    fn close(&mut self, index: usize) -> Result<bool> {
        SectionEditor::close(self, index)
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        SectionEditor::remove(self, index).map(|_| ())
    }
}
