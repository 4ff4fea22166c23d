use agdb::{DbElement, DbId};

#[derive(Debug, Clone, DbElement, PartialEq)]
pub(crate) struct NoteModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) favorite: bool,
    /// Microseconds since the Unix epoch, doubles as the conflict token
    pub(crate) created_at: i64,
}

impl NoteModel {
    pub fn new(title: &str, created_at: i64) -> Self {
        Self {
            db_id: None,
            title: title.to_string(),
            content: String::new(),
            favorite: false,
            created_at,
        }
    }
}
