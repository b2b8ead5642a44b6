use anyhow::Result;
use std::path::Path;
use std::rc::Rc;

use crate::job_sets::{AppliedStore, BookmarkStore};
use crate::models::{AuthAccount, ProfilePatch, Registration, SessionState};
use crate::session::SessionStore;
use crate::storage::Storage;

/// The candidate-side state manager: one storage handle shared by the
/// session, bookmark, and applied-job stores. Construct one per process
/// (or per test); there is no global instance.
pub struct Portal {
    storage: Rc<Storage>,
    session: SessionStore,
    bookmarks: BookmarkStore,
    applied: AppliedStore,
}

impl Portal {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_storage(Storage::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_storage(Storage::open_in_memory()?))
    }

    pub fn with_storage(storage: Storage) -> Self {
        let storage = Rc::new(storage);
        Self {
            session: SessionStore::load(Rc::clone(&storage)),
            bookmarks: BookmarkStore::load(Rc::clone(&storage)),
            applied: AppliedStore::load(Rc::clone(&storage)),
            storage,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // --- Actions ---

    pub fn register_user(&mut self, registration: Registration) -> AuthAccount {
        self.session.register_user(registration)
    }

    pub fn authenticate(&self, identifier: &str, password: &str) -> Option<AuthAccount> {
        self.session.authenticate(identifier, password)
    }

    pub fn login_success(&mut self, account: &AuthAccount) {
        self.session.login_success(account)
    }

    pub fn update_profile(&mut self, patch: ProfilePatch) {
        self.session.update_profile(patch)
    }

    pub fn logout(&mut self) {
        self.session.logout()
    }

    pub fn toggle_bookmark(&mut self, job_id: i64) -> bool {
        self.bookmarks.toggle_bookmark(job_id)
    }

    pub fn apply_job(&mut self, job_id: i64) -> bool {
        self.applied.apply_job(job_id)
    }

    // --- Selectors ---

    pub fn session(&self) -> &SessionState {
        self.session.snapshot()
    }

    pub fn bookmarks(&self) -> &[i64] {
        self.bookmarks.ids()
    }

    pub fn is_bookmarked(&self, job_id: i64) -> bool {
        self.bookmarks.is_bookmarked(job_id)
    }

    pub fn applied(&self) -> &[i64] {
        self.applied.ids()
    }

    pub fn has_applied(&self, job_id: i64) -> bool {
        self.applied.has_applied(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_sets::{APPLIED_KEY, BOOKMARKS_KEY};
    use crate::models::{EducationEntry, LanguageEntry, ProfileRecord};
    use crate::session::{REGISTERED_USERS_KEY, USER_AUTH_KEY};

    fn asha() -> Registration {
        Registration {
            password: "p1".into(),
            fields: ProfilePatch {
                name: Some("Asha Rao".into()),
                email: Some("asha@x.com".into()),
                mobile: Some("9990001111".into()),
                ..Default::default()
            },
        }
    }

    /// Simulates a page reload: drop the portal, keep the storage.
    fn reload(portal: Portal) -> Portal {
        let Portal { storage, session, bookmarks, applied } = portal;
        drop((session, bookmarks, applied));
        let storage = Rc::try_unwrap(storage).ok().expect("storage still shared");
        Portal::with_storage(storage)
    }

    #[test]
    fn test_register_then_authenticate() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());

        assert_eq!(portal.authenticate("asha@x.com", "p1"), Some(account.clone()));
        assert_eq!(portal.authenticate("9990001111", "p1"), Some(account));
        assert_eq!(portal.authenticate("asha@x.com", "wrong"), None);
    }

    #[test]
    fn test_fresh_profile_update_scores_twenty() {
        let mut portal = Portal::open_in_memory().unwrap();
        assert_eq!(portal.session().profile_completion, 0);

        portal.update_profile(ProfilePatch {
            name: Some("A".into()),
            dob: Some("2000-01-01".into()),
            gender: Some("Female".into()),
            ..Default::default()
        });
        assert_eq!(portal.session().profile_completion, 20);
    }

    #[test]
    fn test_bookmark_toggle_scenario() {
        let mut portal = Portal::open_in_memory().unwrap();
        portal.toggle_bookmark(7);
        assert_eq!(portal.bookmarks(), &[7]);
        portal.toggle_bookmark(7);
        assert!(portal.bookmarks().is_empty());
        assert!(!portal.is_bookmarked(7));
    }

    #[test]
    fn test_reload_forces_logout_and_keeps_everything_else() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());
        portal.login_success(&account);
        portal.update_profile(ProfilePatch {
            dob: Some("2000-01-01".into()),
            gender: Some("Female".into()),
            desired_career: Some("Nursing".into()),
            ..Default::default()
        });
        portal.toggle_bookmark(3);
        portal.apply_job(9);
        assert!(portal.session().is_logged_in);
        let profile = portal.session().profile.clone();
        let completion = portal.session().profile_completion;

        let portal = reload(portal);
        assert!(!portal.session().is_logged_in);
        assert_eq!(portal.session().profile, profile);
        assert_eq!(portal.session().profile_completion, completion);
        assert_eq!(completion, 40);
        assert!(portal.is_bookmarked(3));
        assert!(portal.has_applied(9));
    }

    #[test]
    fn test_update_without_matching_account_is_harmless() {
        let mut portal = Portal::open_in_memory().unwrap();
        portal.register_user(asha());
        let before = portal.session().registered_users.clone();

        portal.update_profile(ProfilePatch {
            email: Some("other@x.com".into()),
            ..Default::default()
        });
        assert_eq!(portal.session().registered_users, before);
    }

    #[test]
    fn test_actions_survive_a_store_that_rejects_writes() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());
        portal.login_success(&account);
        portal.storage().reject_writes();

        assert!(portal.toggle_bookmark(4));
        assert!(portal.apply_job(8));
        portal.update_profile(ProfilePatch {
            desired_career: Some("Teacher".into()),
            ..Default::default()
        });

        assert!(portal.is_bookmarked(4));
        assert!(portal.has_applied(8));
        assert_eq!(portal.session().profile.desired_career, "Teacher");

        let stored: SessionState = portal.storage().load(USER_AUTH_KEY, SessionState::default());
        assert_eq!(stored.profile.desired_career, "");
        assert!(portal.storage().raw(BOOKMARKS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_all_keys_round_trip_through_storage() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());
        portal.login_success(&account);
        portal.update_profile(ProfilePatch {
            education_details: Some(vec![EducationEntry {
                id: 1,
                course: "MBA".into(),
                is_saved: true,
                ..Default::default()
            }]),
            languages: Some(vec![LanguageEntry {
                id: 2,
                language: "Bengali".into(),
                read: true,
                ..Default::default()
            }]),
            ..Default::default()
        });
        portal.toggle_bookmark(10);
        portal.toggle_bookmark(20);
        portal.apply_job(30);

        let storage = portal.storage();
        let session: SessionState = storage.load(USER_AUTH_KEY, SessionState::default());
        assert_eq!(&session, portal.session());

        let users: Vec<AuthAccount> = storage.load(REGISTERED_USERS_KEY, Vec::new());
        assert_eq!(users.as_slice(), portal.session().registered_users.as_slice());

        let bookmarks: Vec<i64> = storage.load(BOOKMARKS_KEY, Vec::new());
        assert_eq!(bookmarks.as_slice(), portal.bookmarks());

        let applied: Vec<i64> = storage.load(APPLIED_KEY, Vec::new());
        assert_eq!(applied.as_slice(), portal.applied());
    }

    #[test]
    fn test_user_auth_json_layout() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());
        portal.login_success(&account);

        let raw = portal.storage().raw(USER_AUTH_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["isLoggedIn"], true);
        assert_eq!(json["userName"], "Asha");
        assert_eq!(json["profileCompletion"], 0);
        assert_eq!(json["profile"]["email"], "asha@x.com");
        assert_eq!(json["profile"]["nationality"], "India");
        assert!(json["registeredUsers"].is_array());
    }

    #[test]
    fn test_logout_keeps_candidate_sets() {
        let mut portal = Portal::open_in_memory().unwrap();
        let account = portal.register_user(asha());
        portal.login_success(&account);
        portal.toggle_bookmark(1);
        portal.apply_job(2);
        portal.logout();

        assert_eq!(portal.session().profile, ProfileRecord::default());
        assert_eq!(portal.bookmarks(), &[1]);
        assert_eq!(portal.applied(), &[2]);
    }
}
