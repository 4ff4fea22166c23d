use agdb::{Comparison, DbAny, DbError, QueryBuilder};
use chrono::Utc;
use getset::{CopyGetters, Getters};
use tracing::debug;

use crate::store::{
    db::{Db, PROFILES, models::ProfileModel},
    entities::Result,
};

/// A named account owning its own collection of notes.
///
/// This is a snapshot of the stored record; it does not follow later changes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Profile {
    #[getset(get = "pub")]
    name: String,
    /// Stored verbatim, see [`credentials`](crate::credentials) for the login check.
    #[getset(get = "pub")]
    password: String,
    /// Never set by any operation yet.
    #[getset(get = "pub")]
    icon: Option<Vec<u8>>,
    /// Seconds since the Unix epoch
    #[getset(get_copy = "pub")]
    created_at: i64,
}

impl Profile {
    /// Insert a new profile unless one with the same name already exists.
    pub(crate) fn add(db: &Db, name: &str, password: &str) -> Result<bool> {
        let created = db.write(|db| {
            if find(db, name)?.is_some() {
                return Ok(false);
            }

            let model = ProfileModel::new(name, password, Utc::now().timestamp());
            db.transaction_mut(|t| -> std::result::Result<bool, DbError> {
                let profile_id = t
                    .exec_mut(QueryBuilder::insert().element(model).query())?
                    .elements
                    .first()
                    .ok_or_else(|| DbError::from("ProfileModel insertion returned no element"))?
                    .id;

                // Link Profile to the root "profiles" node
                t.exec_mut(
                    QueryBuilder::insert()
                        .edges()
                        .from(PROFILES)
                        .to(profile_id)
                        .query(),
                )?;

                Ok(true)
            })
        })?;

        if created {
            debug!("Created profile: {name}");
        } else {
            debug!("Refused to create profile {name}: name already taken");
        }

        Ok(created)
    }

    pub(crate) fn list(db: &Db) -> Result<Vec<Self>> {
        let models = db.read(|db| -> std::result::Result<Vec<ProfileModel>, DbError> {
            db.exec(
                QueryBuilder::select()
                    .elements::<ProfileModel>()
                    .search()
                    .from(PROFILES)
                    .where_()
                    .neighbor()
                    .query(),
            )?
            .try_into()
        })?;

        Ok(models.into_iter().map(Profile::from).collect())
    }

    /// Search for a profile by its exact name
    pub(crate) fn search(db: &Db, name: &str) -> Result<Option<Self>> {
        Ok(db.read(|db| find(db, name))?.map(Profile::from))
    }
}

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        Self {
            name: model.name,
            password: model.password,
            icon: model.icon,
            created_at: model.created_at,
        }
    }
}

/// Look up the stored record of the profile called `name`.
pub(crate) fn find(db: &DbAny, name: &str) -> std::result::Result<Option<ProfileModel>, DbError> {
    let models: Vec<ProfileModel> = db
        .exec(
            QueryBuilder::select()
                .elements::<ProfileModel>()
                .search()
                .from(PROFILES)
                .where_()
                .neighbor()
                .and()
                .key("name")
                .value(Comparison::Equal(name.into()))
                .query(),
        )?
        .try_into()?;

    Ok(models.into_iter().next())
}
