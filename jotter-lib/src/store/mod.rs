use std::{fs, sync::Arc};

use parking_lot::RwLock;

use crate::store::{
    config::{Cfg, CoreConfig},
    db::Db,
    entities::{ConflictToken, Note, NoteEdit, Profile, Result},
};

mod db;

pub mod config;
pub mod entities;

/// Central access point for all persistent data.
///
/// The [`Store`] owns the note database and hands out [`Profile`] and [`Note`] snapshots.
/// Lookups that miss return `None`, and creations or updates that break a uniqueness rule
/// return `false`. Only faults of the storage engine itself surface as errors, after which
/// the store refuses every further call.
///
/// Clones share the same database. It is released by [`Store::close`], or when the last
/// clone is dropped.
#[derive(Clone, Debug)]
pub struct Store {
    db: Db,
    cfg: Cfg,
}

impl Store {
    /// Open the store described by the user's configuration file.
    pub fn new() -> Result<Self> {
        Self::open(CoreConfig::load()?)
    }

    /// Open (creating if needed) the database file named by `cfg`.
    pub fn open(cfg: CoreConfig) -> Result<Self> {
        let path = cfg.database_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(config::Error::from)?;
        }

        Ok(Self {
            db: Db::open(&path)?,
            cfg: Arc::new(RwLock::new(cfg)),
        })
    }

    pub fn config(&self) -> Cfg {
        self.cfg.clone()
    }

    // Profiles

    /// Every stored profile, in storage order.
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        Profile::list(&self.db)
    }

    pub fn read_profile(&self, name: &str) -> Result<Option<Profile>> {
        Profile::search(&self.db, name)
    }

    /// Create a profile with no icon, returning `false` if the name is already taken.
    pub fn create_profile(&self, name: &str, password: &str) -> Result<bool> {
        Profile::add(&self.db, name, password)
    }

    // Notes

    /// Create an empty, non-favorite note, returning `false` if the profile already has a
    /// note with this title.
    pub fn create_note(&self, profile_name: &str, title: &str) -> Result<bool> {
        Note::add(&self.db, profile_name, title)
    }

    pub fn read_note(&self, profile_name: &str, title: &str) -> Result<Option<Note>> {
        Note::search(&self.db, profile_name, title)
    }

    /// All notes of the profile, ordered by ascending creation instant.
    pub fn read_notes(&self, profile_name: &str) -> Result<Vec<Note>> {
        Note::list(&self.db, profile_name)
    }

    /// Rename and rewrite the note `old_title`, proving with `expected` that the caller read
    /// the current version of it.
    ///
    /// Returns `false` if a different note already uses `edit.title`, or if the note created
    /// at `expected` is no longer called `old_title`. Re-read before retrying.
    pub fn update_note(
        &self,
        profile_name: &str,
        old_title: &str,
        expected: ConflictToken,
        edit: &NoteEdit,
    ) -> Result<bool> {
        Note::update(&self.db, profile_name, old_title, expected, edit)
    }

    pub fn delete_note(&self, profile_name: &str, title: &str) -> Result<()> {
        Note::remove(&self.db, profile_name, title)
    }

    /// Release the database. Every call afterwards, through any clone, fails with
    /// [`Error::Closed`](entities::Error::Closed).
    pub fn close(&self) -> Result<()> {
        self.db.close()
    }

    #[cfg(test)]
    /// Return a mock version of a [`Store`] with an in-memory database and default
    /// configuration.
    pub(crate) fn mock() -> Self {
        Self {
            db: Db::in_memory().unwrap(),
            cfg: Arc::new(RwLock::new(CoreConfig::mock())),
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use crate::{ConflictToken, CoreConfig, Error, NoteEdit, Store};

    #[test]
    fn test_create_profile_once() {
        let store = Store::mock();

        assert!(store.create_profile("alice", "hunter2").unwrap());
        assert!(!store.create_profile("alice", "other").unwrap());

        // The losing attempt must not have touched the stored password
        assert_eq!(store.read_profile("alice").unwrap().unwrap().password(), "hunter2");
        assert_eq!(store.list_profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_read_profile() {
        let store = Store::mock();

        assert!(store.read_profile("bob").unwrap().is_none());

        store.create_profile("bob", "secret").unwrap();
        let profile = store.read_profile("bob").unwrap().unwrap();

        assert_eq!(profile.name(), "bob");
        assert_eq!(profile.password(), "secret");
        assert!(profile.icon().is_none());
        assert!(profile.created_at() > 0);

        // A second read returns the very same record
        assert_eq!(store.read_profile("bob").unwrap().unwrap(), profile);
    }

    #[test]
    fn test_list_profiles() {
        let store = Store::mock();

        assert!(store.list_profiles().unwrap().is_empty());

        store.create_profile("alice", "pass").unwrap();
        store.create_profile("bob", "pass").unwrap();

        let mut names: Vec<String> = store
            .list_profiles()
            .unwrap()
            .iter()
            .map(|p| p.name().clone())
            .collect();
        names.sort();

        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn test_create_note_duplicate() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();

        assert!(store.create_note("alice", "X").unwrap());
        assert!(!store.create_note("alice", "X").unwrap());

        let note = store.read_note("alice", "X").unwrap().unwrap();
        assert_eq!(note.content(), "");
        assert!(!note.favorite());
        assert_eq!(store.read_notes("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_titles_are_scoped_to_profile() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_profile("bob", "pass").unwrap();

        assert!(store.create_note("alice", "X").unwrap());
        assert!(store.create_note("bob", "X").unwrap());

        assert!(store.read_note("alice", "Y").unwrap().is_none());
        assert_eq!(store.read_notes("bob").unwrap().len(), 1);
    }

    #[test]
    fn test_create_note_without_profile() {
        let store = Store::mock();

        assert!(!store.create_note("ghost", "X").unwrap());
        assert!(store.read_notes("ghost").unwrap().is_empty());
    }

    #[test]
    fn test_read_notes_ordered_by_creation() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();

        for title in ["b", "a", "c"] {
            store.create_note("alice", title).unwrap();
        }

        let notes = store.read_notes("alice").unwrap();
        let titles: Vec<&str> = notes.iter().map(|n| n.title().as_str()).collect();
        assert_eq!(titles, ["b", "a", "c"]);

        assert!(
            notes
                .iter()
                .zip(notes.iter().skip(1))
                .all(|(older, newer)| older.created_at() < newer.created_at())
        );
    }

    #[test]
    fn test_update_round_trip() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "Draft").unwrap();

        let note = store.read_note("alice", "Draft").unwrap().unwrap();
        let edit = NoteEdit::new("Shopping", "milk, eggs", true);

        assert!(
            store
                .update_note("alice", "Draft", note.created_at(), &edit)
                .unwrap()
        );

        assert!(store.read_note("alice", "Draft").unwrap().is_none());
        let updated = store.read_note("alice", "Shopping").unwrap().unwrap();
        assert_eq!(updated.title(), "Shopping");
        assert_eq!(updated.content(), "milk, eggs");
        assert!(updated.favorite());
        assert_eq!(updated.created_at(), note.created_at());
    }

    #[test]
    fn test_update_to_own_title() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "A").unwrap();

        let note = store.read_note("alice", "A").unwrap().unwrap();
        let edit = NoteEdit::new("A", "new content", false);

        assert!(store.update_note("alice", "A", note.created_at(), &edit).unwrap());
        assert_eq!(
            store.read_note("alice", "A").unwrap().unwrap().content(),
            "new content"
        );
    }

    #[test]
    fn test_update_onto_taken_title() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "A").unwrap();
        store.create_note("alice", "B").unwrap();

        let a = store.read_note("alice", "A").unwrap().unwrap();
        let b = store.read_note("alice", "B").unwrap().unwrap();
        let edit = NoteEdit::new("B", "overwrite", true);

        assert!(!store.update_note("alice", "A", a.created_at(), &edit).unwrap());

        // Both notes are untouched
        assert_eq!(store.read_note("alice", "A").unwrap().unwrap(), a);
        assert_eq!(store.read_note("alice", "B").unwrap().unwrap(), b);
    }

    #[test]
    fn test_update_with_stale_token() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "A").unwrap();

        let a = store.read_note("alice", "A").unwrap().unwrap();
        let stale = ConflictToken::from(a.created_at().micros() - 1);
        let edit = NoteEdit::new("C", "content", false);

        assert!(!store.update_note("alice", "A", stale, &edit).unwrap());
        assert_eq!(store.read_note("alice", "A").unwrap().unwrap(), a);
        assert!(store.read_note("alice", "C").unwrap().is_none());
    }

    #[test]
    fn test_delete_note() {
        let store = Store::mock();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "A").unwrap();
        store.create_note("alice", "B").unwrap();

        store.delete_note("alice", "missing").unwrap();
        assert_eq!(store.read_notes("alice").unwrap().len(), 2);

        store.delete_note("alice", "A").unwrap();
        assert!(store.read_note("alice", "A").unwrap().is_none());
        assert_eq!(store.read_notes("alice").unwrap().len(), 1);

        // The freed title can be reused
        assert!(store.create_note("alice", "A").unwrap());
    }

    #[test]
    fn test_operations_after_close() {
        let store = Store::mock();
        let shared = store.clone();

        store.close().unwrap();

        assert!(matches!(shared.read_profile("alice"), Err(Error::Closed)));
        assert!(matches!(
            shared.create_profile("alice", "pass"),
            Err(Error::Closed)
        ));
        assert!(matches!(store.close(), Err(Error::Closed)));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let mut cfg = CoreConfig::default();
        cfg.set_database_path(dir.path().join("nested").join("notes.db"));

        let store = Store::open(cfg.clone()).unwrap();
        store.create_profile("alice", "pass").unwrap();
        store.create_note("alice", "Kept").unwrap();
        let created_at = store.read_profile("alice").unwrap().unwrap().created_at();
        store.close().unwrap();

        let reopened = Store::open(cfg).unwrap();
        let profile = reopened.read_profile("alice").unwrap().unwrap();
        assert_eq!(profile.created_at(), created_at);
        assert!(reopened.read_note("alice", "Kept").unwrap().is_some());
        assert!(!reopened.create_profile("alice", "again").unwrap());
        reopened.close().unwrap();
    }
}
