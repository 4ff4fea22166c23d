//! Core of the Jotter note-taking application.
//!
//! A [`Store`] owns the durable set of profiles and their notes. Once a profile has been
//! authenticated, a [`ProfileSession`] is bound to it and mediates every note operation.

pub mod credentials;
pub mod fs;
pub mod session;
pub mod store;

pub use session::ProfileSession;
pub use store::{
    Store,
    config::{Cfg, CoreConfig},
    entities::{ConflictToken, Error, Note, NoteEdit, Profile, Result},
};
