use agdb::{DbElement, DbId};

#[derive(Debug, Clone, DbElement, PartialEq)]
pub(crate) struct ProfileModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) name: String,
    pub(crate) password: String,
    pub(crate) icon: Option<Vec<u8>>,
    /// Seconds since the Unix epoch
    pub(crate) created_at: i64,
}

impl ProfileModel {
    pub fn new(name: &str, password: &str, created_at: i64) -> Self {
        Self {
            db_id: None,
            name: name.to_string(),
            password: password.to_string(),
            icon: None,
            created_at,
        }
    }
}
