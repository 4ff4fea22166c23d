use agdb::{DbAny, DbError, DbId, DbKeyValue, QueryBuilder};
use getset::{CopyGetters, Getters};
use tracing::debug;

use crate::store::{
    db::{Db, models::NoteModel},
    entities::{ConflictToken, Result, profile},
};

/// A titled piece of content owned by exactly one profile.
///
/// This is a snapshot of the stored record; it does not follow later changes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Note {
    #[getset(get = "pub")]
    title: String,
    #[getset(get = "pub")]
    content: String,
    #[getset(get_copy = "pub")]
    favorite: bool,
    /// Creation instant, also the token an update has to present.
    #[getset(get_copy = "pub")]
    created_at: ConflictToken,
}

/// The fields an update overwrites. The creation instant is never among them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEdit {
    pub title: String,
    pub content: String,
    pub favorite: bool,
}

impl NoteEdit {
    pub fn new(title: impl Into<String>, content: impl Into<String>, favorite: bool) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            favorite,
        }
    }
}

impl Note {
    /// An edit that would leave this note exactly as it is.
    pub fn edit(&self) -> NoteEdit {
        NoteEdit::new(self.title.clone(), self.content.clone(), self.favorite)
    }

    /// Insert an empty note unless the profile already has one with this title.
    ///
    /// Returns `false` as well when no profile is called `profile_name`.
    pub(crate) fn add(db: &Db, profile_name: &str, title: &str) -> Result<bool> {
        let created = db.write(|db| {
            let Some(profile_id) = owner(db, profile_name)? else {
                return Ok(false);
            };

            let notes = owned(db, profile_id)?;
            if notes.iter().any(|n| n.title == title) {
                return Ok(false);
            }

            let newest = notes.iter().map(|n| ConflictToken::from(n.created_at)).max();
            let model = NoteModel::new(title, ConflictToken::next(newest).micros());

            db.transaction_mut(|t| -> std::result::Result<bool, DbError> {
                let note_id = t
                    .exec_mut(QueryBuilder::insert().element(model).query())?
                    .elements
                    .first()
                    .ok_or_else(|| DbError::from("NoteModel insertion returned no element"))?
                    .id;

                t.exec_mut(
                    QueryBuilder::insert()
                        .edges()
                        .from(profile_id)
                        .to(note_id)
                        .query(),
                )?;

                Ok(true)
            })
        })?;

        if created {
            debug!("Created note {title} for {profile_name}");
        } else {
            debug!("Refused to create note {title} for {profile_name}");
        }

        Ok(created)
    }

    /// Every note of the profile, oldest first.
    pub(crate) fn list(db: &Db, profile_name: &str) -> Result<Vec<Self>> {
        let mut models = db.read(|db| match owner(db, profile_name)? {
            Some(profile_id) => owned(db, profile_id),
            None => Ok(Vec::new()),
        })?;

        models.sort_by_key(|n| n.created_at);

        Ok(models.into_iter().map(Note::from).collect())
    }

    pub(crate) fn search(db: &Db, profile_name: &str, title: &str) -> Result<Option<Self>> {
        let model = db.read(|db| {
            let Some(profile_id) = owner(db, profile_name)? else {
                return Ok(None);
            };

            Ok(owned(db, profile_id)?.into_iter().find(|n| n.title == title))
        })?;

        Ok(model.map(Note::from))
    }

    /// Overwrite the title, content and favorite flag of the note `old_title` created at
    /// `expected`.
    ///
    /// Refused when another note of the profile already carries `edit.title`, or when no
    /// note matches both `old_title` and `expected`.
    pub(crate) fn update(
        db: &Db,
        profile_name: &str,
        old_title: &str,
        expected: ConflictToken,
        edit: &NoteEdit,
    ) -> Result<bool> {
        let updated = db.write(|db| {
            let Some(profile_id) = owner(db, profile_name)? else {
                return Ok(false);
            };

            let notes = owned(db, profile_id)?;

            // Renaming a note to its own title finds the note itself, which carries `expected`
            if notes
                .iter()
                .any(|n| n.title == edit.title && n.created_at != expected.micros())
            {
                return Ok(false);
            }

            let Some(target) = notes
                .iter()
                .find(|n| n.title == old_title && n.created_at == expected.micros())
                .and_then(|n| n.db_id)
            else {
                return Ok(false);
            };

            let values: Vec<DbKeyValue> = vec![
                DbKeyValue::from(("title", edit.title.as_str())),
                DbKeyValue::from(("content", edit.content.as_str())),
                DbKeyValue::from(("favorite", edit.favorite)),
            ];
            db.exec_mut(QueryBuilder::insert().values(vec![values]).ids(target).query())?;

            Ok(true)
        })?;

        if updated {
            debug!("Updated note {old_title} of {profile_name}");
        } else {
            debug!(
                "Refused to update note {old_title} of {profile_name}: stale token {expected} or title {} taken",
                edit.title
            );
        }

        Ok(updated)
    }

    /// Delete the note if it exists; a missing note is not an error.
    pub(crate) fn remove(db: &Db, profile_name: &str, title: &str) -> Result<()> {
        let removed = db.write(|db| {
            let Some(profile_id) = owner(db, profile_name)? else {
                return Ok(false);
            };

            let ids: Vec<DbId> = owned(db, profile_id)?
                .into_iter()
                .filter(|n| n.title == title)
                .filter_map(|n| n.db_id)
                .collect();

            if ids.is_empty() {
                return Ok(false);
            }

            db.exec_mut(QueryBuilder::remove().ids(ids).query())?;

            Ok(true)
        })?;

        if removed {
            debug!("Removed note {title} of {profile_name}");
        }

        Ok(())
    }
}

impl From<NoteModel> for Note {
    fn from(model: NoteModel) -> Self {
        Self {
            title: model.title,
            content: model.content,
            favorite: model.favorite,
            created_at: ConflictToken::from(model.created_at),
        }
    }
}

fn owner(db: &DbAny, profile_name: &str) -> std::result::Result<Option<DbId>, DbError> {
    Ok(profile::find(db, profile_name)?.and_then(|p| p.db_id))
}

/// All note records hanging off the given profile node, in no particular order.
fn owned(db: &DbAny, profile_id: DbId) -> std::result::Result<Vec<NoteModel>, DbError> {
    db.exec(
        QueryBuilder::select()
            .elements::<NoteModel>()
            .search()
            .from(profile_id)
            .where_()
            .neighbor()
            .query(),
    )?
    .try_into()
}
