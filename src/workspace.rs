//! Workspace - the open tabs and the action dispatch table
//!
//! Every tab is a `Session`. At most one save/discard flow is pending at a
//! time; while it waits for an answer, other actions are ignored.

use crate::clipboard::Clipboard;
use crate::error::NotepadError;
use crate::flow::{Answer, Command, Flow, Outcome, Prompt, Step};
use crate::io::Filesystem;
use crate::session::{Session, SessionSettings};
use crate::shortcuts::Action;
use std::path::{Path, PathBuf};

/// What the window should do after an action or answer
#[derive(Debug)]
pub enum Response {
    /// Nothing visible changed
    Idle,
    Redraw,
    /// A file was written
    Saved(PathBuf),
    Ask(Prompt),
    Failed(NotepadError),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// A single-tab command on this tab
    Tab(usize),
    /// Exit sweep, currently confirming this tab
    Exit(usize),
}

pub struct Workspace {
    tabs: Vec<Session>,
    active: usize,
    settings: SessionSettings,
    flow: Flow,
    pending: Option<Pending>,
}

impl Workspace {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            tabs: vec![Session::new(settings)],
            active: 0,
            settings,
            flow: Flow::new(),
            pending: None,
        }
    }

    pub fn tabs(&self) -> &[Session] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Session {
        &self.tabs[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Session {
        &mut self.tabs[self.active]
    }

    pub fn title(&self) -> String {
        self.active().title()
    }

    /// True while a question is waiting for an answer
    pub fn is_prompting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn find_tab_by_path(&self, path: &Path) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.path() == Some(path))
    }

    /// Switch to a tab by index. Returns true if the tab actually changed.
    pub fn switch_to(&mut self, index: usize) -> bool {
        if self.pending.is_some() || index >= self.tabs.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    /// Open files named on the command line, one tab each.
    /// Missing files get an empty tab bound to the path; other failures are returned.
    pub fn open_paths(&mut self, paths: &[PathBuf], fs: &dyn Filesystem) -> Vec<NotepadError> {
        let mut errors = Vec::new();

        for path in paths {
            if let Some(index) = self.find_tab_by_path(path) {
                self.active = index;
                continue;
            }

            let mut session = Session::new(self.settings);
            match session.load(path, fs) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::info!(path = %path.display(), "New file");
                    session = Session::with_path(self.settings, path.clone());
                }
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            }
            self.add_tab(session);
        }

        errors
    }

    /// Add a tab, reusing the initial tab when it is still pristine
    fn add_tab(&mut self, session: Session) {
        let pristine = self.tabs.len() == 1
            && self.tabs[0].path().is_none()
            && !self.tabs[0].is_modified()
            && self.tabs[0].text().is_empty();

        if pristine {
            self.tabs[0] = session;
            self.active = 0;
        } else {
            self.tabs.push(session);
            self.active = self.tabs.len() - 1;
        }
    }

    /// Run a user action against the active tab
    pub fn dispatch(
        &mut self,
        action: Action,
        fs: &dyn Filesystem,
        clipboard: &mut dyn Clipboard,
    ) -> Response {
        if self.pending.is_some() {
            tracing::debug!(?action, "Ignoring action while a prompt is open");
            return Response::Idle;
        }

        let tab = self.active;
        let count = self.tabs.len();
        match action {
            Action::New => return self.run(Command::New, fs),
            Action::Open => return self.run(Command::Open, fs),
            Action::Save => return self.run(Command::Save, fs),
            Action::SaveAs => return self.run(Command::SaveAs, fs),
            Action::CloseTab => return self.run(Command::Close, fs),
            Action::Exit => return self.continue_exit(0, fs),
            Action::NewTab => {
                self.tabs.push(Session::new(self.settings));
                self.active = self.tabs.len() - 1;
                return Response::Redraw;
            }
            Action::NextTab => return Self::redraw_if(self.switch_to((tab + 1) % count)),
            Action::PreviousTab => {
                return Self::redraw_if(self.switch_to((tab + count - 1) % count))
            }
            _ => {}
        }

        let session = &mut self.tabs[tab];
        let changed = match action {
            Action::Undo => session.undo(),
            Action::Redo => session.redo(),
            Action::Cut => session.cut(clipboard),
            Action::Copy => {
                session.copy(clipboard);
                false
            }
            Action::Paste => session.paste(clipboard),
            Action::SelectAll => {
                session.select_all();
                true
            }
            _ => false,
        };

        Self::redraw_if(changed)
    }

    fn redraw_if(changed: bool) -> Response {
        if changed {
            Response::Redraw
        } else {
            Response::Idle
        }
    }

    /// Feed the answer to the outstanding prompt
    pub fn answer(&mut self, answer: Answer, fs: &dyn Filesystem) -> Response {
        match self.pending.take() {
            None => Response::Idle,
            Some(Pending::Tab(tab)) => {
                let step = self.flow.answer(answer, &mut self.tabs[tab], fs);
                self.finish(tab, step)
            }
            Some(Pending::Exit(tab)) => {
                match self.flow.answer(answer, &mut self.tabs[tab], fs) {
                    Step::Ask(prompt) => {
                        self.pending = Some(Pending::Exit(tab));
                        Response::Ask(prompt)
                    }
                    Step::Done(Outcome::Exit) => self.continue_exit(tab + 1, fs),
                    Step::Done(Outcome::Failed(e)) => Response::Failed(e),
                    Step::Done(_) => {
                        tracing::info!("Exit cancelled");
                        Response::Redraw
                    }
                }
            }
        }
    }

    fn run(&mut self, command: Command, fs: &dyn Filesystem) -> Response {
        let tab = self.active;
        let step = self.flow.begin(command, &mut self.tabs[tab], fs);
        self.finish(tab, step)
    }

    fn finish(&mut self, tab: usize, step: Step) -> Response {
        match step {
            Step::Ask(prompt) => {
                self.pending = Some(Pending::Tab(tab));
                Response::Ask(prompt)
            }
            Step::Done(Outcome::Completed) => match self.flow.take_saved() {
                Some(path) => Response::Saved(path),
                None => Response::Redraw,
            },
            Step::Done(Outcome::Cancelled) => Response::Redraw,
            Step::Done(Outcome::Failed(e)) => Response::Failed(e),
            Step::Done(Outcome::Close) => self.close_tab(tab),
            Step::Done(Outcome::Exit) => Response::Exit,
        }
    }

    fn close_tab(&mut self, index: usize) -> Response {
        self.tabs.remove(index);
        if self.tabs.is_empty() {
            return Response::Exit;
        }

        if self.active >= self.tabs.len() {
            self.active = self.tabs.len() - 1;
        } else if index < self.active {
            self.active -= 1;
        }
        Response::Redraw
    }

    /// Confirm each modified tab from `from` onward, then exit.
    /// Nothing is closed until every tab agreed.
    fn continue_exit(&mut self, from: usize, fs: &dyn Filesystem) -> Response {
        for tab in from..self.tabs.len() {
            if !self.tabs[tab].is_modified() {
                continue;
            }
            self.active = tab;
            match self.flow.begin(Command::Exit, &mut self.tabs[tab], fs) {
                Step::Ask(prompt) => {
                    self.pending = Some(Pending::Exit(tab));
                    return Response::Ask(prompt);
                }
                Step::Done(Outcome::Exit) => continue,
                Step::Done(Outcome::Failed(e)) => return Response::Failed(e),
                Step::Done(_) => return Response::Redraw,
            }
        }

        tracing::info!(tabs = self.tabs.len(), "Exiting");
        Response::Exit
    }
}
