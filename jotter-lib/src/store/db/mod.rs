use std::{mem, path::Path, sync::Arc};

use agdb::{DbAny, DbError, QueryBuilder};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::store::{
    db::models::{CURRENT_MODEL_VERSION, ModelVersion},
    entities::{Error, Result},
};

pub(crate) mod models;

/// Alias of the root node every profile hangs off.
pub(crate) const PROFILES: &str = "profiles";
const MODEL_VERSION: &str = "model_version";

#[derive(Debug)]
enum State {
    Open(DbAny),
    /// An engine error was seen; the handle has been released and nothing else may run.
    Faulted,
    Closed,
}

/// Shared handle to the note database.
///
/// Every query runs through [`Db::read`] or [`Db::write`], which refuse to touch the engine
/// once the handle is closed or has faulted. The first engine error latches the handle into
/// the faulted state.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    state: Arc<RwLock<State>>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?;
        let db = DbAny::new_file(path_str)?;

        debug!("Opened note database at {}", path.display());

        Self::init(db)
    }

    /// Create a memory backed database for use in tests
    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        Self::init(DbAny::new_memory("test")?)
    }

    fn init(db: DbAny) -> Result<Self> {
        let db = Self {
            state: Arc::new(RwLock::new(State::Open(db))),
        };

        let version = db.write(|db| {
            db.transaction_mut(|t| -> std::result::Result<u64, DbError> {
                let alias_count = t.exec(QueryBuilder::select().aliases().query())?.result;

                if alias_count == 0 {
                    t.exec_mut(
                        QueryBuilder::insert()
                            .nodes()
                            .aliases([PROFILES, MODEL_VERSION])
                            .query(),
                    )?;
                }

                // Fetch the current model version (if any)
                let versions: Vec<ModelVersion> = t
                    .exec(
                        QueryBuilder::select()
                            .elements::<ModelVersion>()
                            .search()
                            .from(MODEL_VERSION)
                            .where_()
                            .neighbor()
                            .query(),
                    )?
                    .try_into()?;

                if let Some(mv) = versions.first() {
                    return Ok(mv.version());
                }

                // Insert default ModelVersion if missing
                let model_version = ModelVersion::default();
                let version = model_version.version();
                let model_version_id = t
                    .exec_mut(QueryBuilder::insert().element(model_version).query())?
                    .elements
                    .first()
                    .ok_or_else(|| DbError::from("ModelVersion insertion returned no element"))?
                    .id;

                t.exec_mut(
                    QueryBuilder::insert()
                        .edges()
                        .from(MODEL_VERSION)
                        .to(model_version_id)
                        .query(),
                )?;

                Ok(version)
            })
        })?;

        if version != CURRENT_MODEL_VERSION {
            db.close()?;
            return Err(Error::ModelVersion {
                found: version,
                expected: CURRENT_MODEL_VERSION,
            });
        }

        Ok(db)
    }

    /// Run a read-only query against the engine.
    pub fn read<T>(&self, op: impl FnOnce(&DbAny) -> std::result::Result<T, DbError>) -> Result<T> {
        let outcome = match &*self.state.read() {
            State::Open(db) => op(db),
            State::Faulted => return Err(Error::Faulted),
            State::Closed => return Err(Error::Closed),
        };

        outcome.map_err(|err| self.fault(err))
    }

    /// Run a mutating query against the engine. Nothing else can touch the database until
    /// `op` returns, so check-then-act sequences inside it are atomic.
    pub fn write<T>(
        &self,
        op: impl FnOnce(&mut DbAny) -> std::result::Result<T, DbError>,
    ) -> Result<T> {
        let outcome = match &mut *self.state.write() {
            State::Open(db) => op(db),
            State::Faulted => return Err(Error::Faulted),
            State::Closed => return Err(Error::Closed),
        };

        outcome.map_err(|err| self.fault(err))
    }

    /// Release the underlying engine. Must happen exactly once.
    pub fn close(&self) -> Result<()> {
        match mem::replace(&mut *self.state.write(), State::Closed) {
            State::Open(db) => {
                drop(db);
                debug!("Closed note database");
                Ok(())
            }
            State::Faulted => Ok(()),
            State::Closed => Err(Error::Closed),
        }
    }

    fn fault(&self, err: DbError) -> Error {
        error!("Storage fault, refusing further operations: {err}");

        let mut state = self.state.write();
        if matches!(*state, State::Open(_)) {
            *state = State::Faulted;
        }

        Error::Storage(err)
    }
}
