use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::completion::profile_completion;
use crate::models::{AuthAccount, ProfilePatch, ProfileRecord, Registration, SessionState};
use crate::storage::Storage;

pub const USER_AUTH_KEY: &str = "userAuth";
pub const REGISTERED_USERS_KEY: &str = "registeredUsers";

/// Login state, the candidate profile, and the master list of accounts that
/// stands in for an authentication backend.
pub struct SessionStore {
    storage: Rc<Storage>,
    state: SessionState,
    last_id: i64,
}

impl SessionStore {
    /// Restore from storage. A persisted session never survives a reload:
    /// `is_logged_in` always comes back false, everything else is kept.
    pub fn load(storage: Rc<Storage>) -> Self {
        let mut state: SessionState = storage.load(USER_AUTH_KEY, SessionState::default());
        state.is_logged_in = false;
        // The separate key is authoritative for the master list
        state.registered_users = storage.load(REGISTERED_USERS_KEY, Vec::new());

        let last_id = state.registered_users.iter().map(|a| a.id).max().unwrap_or(0);
        debug!(
            accounts = state.registered_users.len(),
            completion = state.profile_completion,
            "session store loaded"
        );

        Self { storage, state, last_id }
    }

    pub fn snapshot(&self) -> &SessionState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in
    }

    pub fn user_name(&self) -> Option<&str> {
        self.state.user_name.as_deref()
    }

    pub fn profile(&self) -> &ProfileRecord {
        &self.state.profile
    }

    pub fn profile_completion(&self) -> u8 {
        self.state.profile_completion
    }

    pub fn registered_users(&self) -> &[AuthAccount] {
        &self.state.registered_users
    }

    /// Append a new account built on the blank profile template. Does not
    /// log the user in. Duplicate emails are accepted.
    pub fn register_user(&mut self, registration: Registration) -> AuthAccount {
        let mut profile = ProfileRecord::default();
        registration.fields.apply_to(&mut profile);

        if !profile.email.is_empty()
            && self.state.registered_users.iter().any(|a| a.profile.email == profile.email)
        {
            warn!(email = %profile.email, "registering a second account with an existing email");
        }

        let account = AuthAccount {
            id: self.next_id(),
            password: registration.password,
            profile,
        };
        self.state.registered_users.push(account.clone());
        self.persist_accounts();

        info!(id = account.id, email = %account.profile.email, "registered account");
        account
    }

    /// First account whose email or mobile equals `identifier` and whose
    /// password matches. Plain linear scan, exact string equality.
    pub fn authenticate(&self, identifier: &str, password: &str) -> Option<AuthAccount> {
        self.state
            .registered_users
            .iter()
            .find(|a| {
                let known = a.profile.email == identifier || a.profile.mobile == identifier;
                known && a.password == password
            })
            .cloned()
    }

    pub fn login_success(&mut self, account: &AuthAccount) {
        self.state.is_logged_in = true;
        self.state.user_name = first_name(&account.profile.name);
        // Accounts carry every profile field, so merging one in replaces the
        // whole record, including whatever a previous user left behind.
        ProfilePatch::from(account.profile.clone()).apply_to(&mut self.state.profile);
        self.state.profile.profile_picture = account.profile.profile_picture.clone();
        self.state.profile_completion = profile_completion(&self.state.profile);
        self.persist_session();

        info!(
            user = self.state.user_name.as_deref().unwrap_or(""),
            completion = self.state.profile_completion,
            "logged in"
        );
    }

    /// Shallow-merge `patch` into the profile, then mirror the result onto
    /// the account with the same email, if there is one.
    pub fn update_profile(&mut self, patch: ProfilePatch) {
        patch.apply_to(&mut self.state.profile);
        self.state.profile_completion = profile_completion(&self.state.profile);

        // Match on the merged profile, the patch may not carry an email
        let email = self.state.profile.email.clone();
        let matched = if email.is_empty() {
            None
        } else {
            self.state
                .registered_users
                .iter_mut()
                .find(|a| a.profile.email == email)
        };
        let mirrored = match matched {
            Some(account) => {
                account.profile = self.state.profile.clone();
                true
            }
            None => false,
        };

        self.persist_session();
        if mirrored {
            self.persist_accounts();
            info!(email = %email, completion = self.state.profile_completion, "profile updated");
        } else {
            debug!(email = %email, "no account matches profile email, master list unchanged");
        }
    }

    pub fn logout(&mut self) {
        self.state.is_logged_in = false;
        self.state.user_name = None;
        self.state.profile = ProfileRecord::default();
        self.state.profile_completion = 0;
        self.persist_session();
        info!("logged out");
    }

    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_id = if now > self.last_id { now } else { self.last_id + 1 };
        self.last_id
    }

    fn persist_session(&self) {
        self.storage.save(USER_AUTH_KEY, &self.state);
    }

    fn persist_accounts(&self) {
        self.storage.save(REGISTERED_USERS_KEY, &self.state.registered_users);
    }
}

fn first_name(name: &str) -> Option<String> {
    name.split_whitespace().next().map(str::to_string)
}
