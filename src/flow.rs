//! Save / discard / cancel flow
//!
//! Commands that may lose or persist work run as a small resumable state
//! machine: `begin` either finishes right away or asks a question, and each
//! `answer` resumes from the saved continuation. The window drives it one
//! event at a time; `drive` runs it to completion against `Dialogs`.

use crate::dialogs::{Choice, Dialogs};
use crate::error::NotepadError;
use crate::io::Filesystem;
use crate::session::Session;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    New,
    Open,
    Save,
    SaveAs,
    /// Close the document's tab
    Close,
    /// Leave the program
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    ConfirmDiscard { name: String },
    OpenPath,
    SavePath { suggested: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(Choice),
    /// `None` when the picker was cancelled
    Path(Option<PathBuf>),
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// The user backed out; nothing changed
    Cancelled,
    Failed(NotepadError),
    /// The tab may be closed
    Close,
    /// The program may terminate
    Exit,
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

#[derive(Debug)]
pub enum Step {
    Ask(Prompt),
    Done(Outcome),
}

/// What to do with the next answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Save / Discard / Cancel, then run the command if allowed
    Discard(Command),
    /// Save path; on a successful write, run the command (if any)
    SavePath(Option<Command>),
    OpenPath,
}

#[derive(Debug, Default)]
pub struct Flow {
    pending: Option<Continuation>,
    /// Path written since the flow began
    saved: Option<PathBuf>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a question is outstanding
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Path of the file written by this flow, if any. Cleared by the call.
    pub fn take_saved(&mut self) -> Option<PathBuf> {
        self.saved.take()
    }

    pub fn begin(&mut self, command: Command, session: &mut Session, fs: &dyn Filesystem) -> Step {
        self.pending = None;
        self.saved = None;
        tracing::debug!(?command, "Starting flow");

        match command {
            Command::Save => self.save_then(None, session, fs),
            Command::SaveAs => self.ask_save_path(None, session),
            Command::New | Command::Open | Command::Close | Command::Exit => {
                self.guard(command, session, fs)
            }
        }
    }

    pub fn answer(&mut self, answer: Answer, session: &mut Session, fs: &dyn Filesystem) -> Step {
        let Some(continuation) = self.pending.take() else {
            tracing::warn!(?answer, "Answer without a pending question");
            return Step::Done(Outcome::Cancelled);
        };

        match (continuation, answer) {
            (Continuation::Discard(command), Answer::Choice(Choice::Save)) => {
                self.save_then(Some(command), session, fs)
            }
            (Continuation::Discard(command), Answer::Choice(Choice::Discard)) => {
                tracing::info!(name = %session.display_name(), "Discarding unsaved changes");
                self.proceed(command, session, fs)
            }
            (Continuation::Discard(_), Answer::Choice(Choice::Cancel)) => {
                Step::Done(Outcome::Cancelled)
            }
            (Continuation::SavePath(then), Answer::Path(Some(path))) => {
                session.set_path(path);
                self.save_then(then, session, fs)
            }
            (Continuation::OpenPath, Answer::Path(Some(path))) => {
                match session.load(&path, fs) {
                    Ok(()) => Step::Done(Outcome::Completed),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Open failed: {}", e);
                        Step::Done(Outcome::Failed(e))
                    }
                }
            }
            (Continuation::SavePath(_) | Continuation::OpenPath, Answer::Path(None)) => {
                Step::Done(Outcome::Cancelled)
            }
            (continuation, answer) => {
                tracing::warn!(?continuation, ?answer, "Answer does not match the question");
                Step::Done(Outcome::Cancelled)
            }
        }
    }

    /// Run `command` right away when the document is clean, otherwise ask first
    fn guard(&mut self, command: Command, session: &mut Session, fs: &dyn Filesystem) -> Step {
        if !session.is_modified() {
            return self.proceed(command, session, fs);
        }
        self.pending = Some(Continuation::Discard(command));
        Step::Ask(Prompt::ConfirmDiscard {
            name: session.display_name(),
        })
    }

    /// Run `command` with the discard check already passed
    fn proceed(&mut self, command: Command, session: &mut Session, fs: &dyn Filesystem) -> Step {
        match command {
            Command::New => {
                session.clear();
                Step::Done(Outcome::Completed)
            }
            Command::Open => {
                self.pending = Some(Continuation::OpenPath);
                Step::Ask(Prompt::OpenPath)
            }
            Command::Close => Step::Done(Outcome::Close),
            Command::Exit => Step::Done(Outcome::Exit),
            Command::Save => self.save_then(None, session, fs),
            Command::SaveAs => self.ask_save_path(None, session),
        }
    }

    /// Save to the current path (asking for one if unset), then continue with `then`
    fn save_then(
        &mut self,
        then: Option<Command>,
        session: &mut Session,
        fs: &dyn Filesystem,
    ) -> Step {
        let Some(path) = session.path().map(Path::to_path_buf) else {
            return self.ask_save_path(then, session);
        };

        match session.write(&path, fs) {
            Ok(()) => {
                self.saved = Some(path);
                match then {
                    Some(command) => self.proceed(command, session, fs),
                    None => Step::Done(Outcome::Completed),
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Save failed: {}", e);
                Step::Done(Outcome::Failed(e))
            }
        }
    }

    fn ask_save_path(&mut self, then: Option<Command>, session: &Session) -> Step {
        self.pending = Some(Continuation::SavePath(then));
        Step::Ask(Prompt::SavePath {
            suggested: session.path().map(Path::to_path_buf),
        })
    }
}

/// Put a prompt to a synchronous `Dialogs`
pub fn ask(dialogs: &mut dyn Dialogs, prompt: &Prompt) -> Answer {
    match prompt {
        Prompt::ConfirmDiscard { name } => Answer::Choice(dialogs.confirm_discard(name)),
        Prompt::OpenPath => Answer::Path(dialogs.pick_open_path()),
        Prompt::SavePath { suggested } => Answer::Path(dialogs.pick_save_path(suggested.as_deref())),
    }
}

/// Run `command` to completion, reporting failures through `dialogs`
pub fn drive(
    command: Command,
    session: &mut Session,
    fs: &dyn Filesystem,
    dialogs: &mut dyn Dialogs,
) -> Outcome {
    let mut flow = Flow::new();
    let mut step = flow.begin(command, session, fs);

    loop {
        match step {
            Step::Ask(prompt) => {
                let answer = ask(dialogs, &prompt);
                step = flow.answer(answer, session, fs);
            }
            Step::Done(outcome) => {
                if let Some(path) = flow.take_saved() {
                    dialogs.show_info(&format!("Saved {}", path.display()));
                }
                if let Outcome::Failed(e) = &outcome {
                    dialogs.show_error(&e.to_string());
                }
                return outcome;
            }
        }
    }
}
