use colored::Colorize;
use jotter_lib::{Note, NoteEdit, ProfileSession};
use sysexits::ExitCode;

use crate::{fail, refuse};

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List notes, favorites first
    List,
    /// Create a new empty note with the next free default title
    New,
    /// Print a note
    Show { title: String },
    /// Change the title, content or favorite flag of a note
    Edit {
        title: String,
        /// New title
        #[arg(long)]
        rename: Option<String>,
        /// New content
        #[arg(long)]
        content: Option<String>,
        /// Mark or unmark as favorite
        #[arg(long)]
        favorite: Option<bool>,
    },
    /// Delete a note
    Delete { title: String },
    /// Add a note to the favorites
    Favorite { title: String },
    /// Remove a note from the favorites
    Unfavorite { title: String },
}

pub fn handle(session: &mut ProfileSession, cmd: &Command) -> ExitCode {
    match cmd {
        Command::List => {
            if let Err(err) = session.reload() {
                return fail(&err);
            }

            println!("{}", "FAVORITES".bold());
            for note in session.favorites() {
                println!("{} {}", "*".yellow(), note.title());
            }
            println!("{}", "NOTES".bold());
            for note in session.others() {
                println!("  {}", note.title());
            }

            ExitCode::Ok
        }
        Command::New => match session.create_note() {
            Ok(title) => {
                println!("Created {}", title.bold());
                ExitCode::Ok
            }
            Err(err) => fail(&err),
        },
        Command::Show { title } => with_note(session, title, |note| {
            let star = if note.favorite() { "*" } else { " " };
            println!("{} {}", star.yellow(), note.title().bold());
            if let Some(created_at) = note.created_at().created_at() {
                let stamp = created_at.format("Created %Y-%m-%d %H:%M UTC").to_string();
                println!("{}", stamp.dimmed());
            }
            println!("{}", note.content());
            ExitCode::Ok
        }),
        Command::Edit {
            title,
            rename,
            content,
            favorite,
        } => with_note(session, title, |note| {
            let current = note.edit();
            let edit = NoteEdit::new(
                rename.clone().unwrap_or(current.title),
                content.clone().unwrap_or(current.content),
                favorite.unwrap_or(current.favorite),
            );

            match session.update_note(note.title(), note.created_at(), &edit) {
                Ok(true) => ExitCode::Ok,
                Ok(false) => refuse("Title already exists.", ExitCode::DataErr),
                Err(err) => fail(&err),
            }
        }),
        Command::Delete { title } => match session.delete_note(title) {
            Ok(()) => ExitCode::Ok,
            Err(err) => fail(&err),
        },
        Command::Favorite { title } => set_favorite(session, title, true),
        Command::Unfavorite { title } => set_favorite(session, title, false),
    }
}

fn with_note(session: &ProfileSession, title: &str, f: impl FnOnce(Note) -> ExitCode) -> ExitCode {
    match session.read_note(title) {
        Ok(Some(note)) => f(note),
        Ok(None) => refuse(&format!("No note titled {title}"), ExitCode::NoInput),
        Err(err) => fail(&err),
    }
}

fn set_favorite(session: &ProfileSession, title: &str, favorite: bool) -> ExitCode {
    match session.set_favorite(title, favorite) {
        Ok(true) => ExitCode::Ok,
        Ok(false) => refuse(&format!("No note titled {title}"), ExitCode::NoInput),
        Err(err) => fail(&err),
    }
}
