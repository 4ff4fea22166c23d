//! The currently logged-in profile.
//!
//! A [`ProfileSession`] starts out unbound, gets bound with [`ProfileSession::init`] after a
//! successful login or signup, and is replaced by a fresh unbound one on logout. While bound
//! it mediates every note operation for its profile and keeps a snapshot of the profile's
//! notes that only changes when [`ProfileSession::reload`] is called.

use getset::{CopyGetters, Getters};
use tracing::{debug, warn};

use crate::{ConflictToken, Error, Note, NoteEdit, Result, Store};

/// Who a bound session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Identity {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    password: String,
    #[getset(get_copy = "pub")]
    created_at: i64,
}

#[derive(Debug)]
pub struct ProfileSession {
    store: Store,
    identity: Option<Identity>,
    notes: Vec<Note>,
}

impl ProfileSession {
    /// An unbound session over `store`.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            identity: None,
            notes: Vec::new(),
        }
    }

    /// Bind the session to an authenticated profile. Performs no I/O.
    pub fn init(&mut self, name: &str, password: &str, created_at: i64) {
        self.identity = Some(Identity {
            name: name.to_string(),
            password: password.to_string(),
            created_at,
        });
        self.notes.clear();

        debug!("Bound session to profile {name}");
    }

    /// Discard this session and hand back a fresh unbound one over the same store.
    pub fn logout(self) -> Self {
        if let Some(identity) = &self.identity {
            debug!("Logged out of profile {}", identity.name);
        }

        Self::new(self.store)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.identity.is_some()
    }

    /// Refetch the profile's notes. The cached list is replaced only once the new one has
    /// been read in full.
    pub fn reload(&mut self) -> Result<()> {
        let notes = self.store.read_notes(self.name()?)?;
        self.notes = notes;

        Ok(())
    }

    /// The notes as of the last [`reload`](Self::reload), oldest first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn favorites(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| n.favorite())
    }

    /// Every cached note that is not a favorite.
    pub fn others(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| !n.favorite())
    }

    /// Create an empty note under the first free title of `Note1`, `Note2`, ... and return
    /// that title.
    ///
    /// Gives up with [`Error::TitlesExhausted`] after the configured number of probes.
    pub fn create_note(&self) -> Result<String> {
        let name = self.name()?;
        let max_probes = self.store.config().read().max_title_probes();

        for n in 1..=max_probes {
            let title = format!("Note{n}");
            if self.store.create_note(name, &title)? {
                return Ok(title);
            }
        }

        warn!("Found no free note title for {name} within {max_probes} attempts");

        Err(Error::TitlesExhausted(max_probes))
    }

    pub fn read_note(&self, title: &str) -> Result<Option<Note>> {
        self.store.read_note(self.name()?, title)
    }

    /// See [`Store::update_note`].
    pub fn update_note(
        &self,
        old_title: &str,
        created_at: ConflictToken,
        edit: &NoteEdit,
    ) -> Result<bool> {
        self.store
            .update_note(self.name()?, old_title, created_at, edit)
    }

    pub fn delete_note(&self, title: &str) -> Result<()> {
        self.store.delete_note(self.name()?, title)
    }

    /// Mark or unmark a note as favorite, leaving its title and content alone.
    ///
    /// Returns `false` if the note does not exist.
    pub fn set_favorite(&self, title: &str, favorite: bool) -> Result<bool> {
        let Some(note) = self.read_note(title)? else {
            return Ok(false);
        };

        let edit = NoteEdit {
            favorite,
            ..note.edit()
        };

        self.update_note(note.title(), note.created_at(), &edit)
    }

    fn name(&self) -> Result<&str> {
        self.identity
            .as_ref()
            .map(|identity| identity.name.as_str())
            .ok_or(Error::Unbound)
    }
}
