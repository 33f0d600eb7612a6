mod common;

use common::MemoryFilesystem;
use std::path::{Path, PathBuf};
use tiny_notepad::accelerator::Modifiers;
use tiny_notepad::app::{route_key, KeyRoute};
use tiny_notepad::clipboard::MemoryClipboard;
use tiny_notepad::dialogs::Choice;
use tiny_notepad::flow::{Answer, Prompt};
use tiny_notepad::session::SessionSettings;
use tiny_notepad::shortcuts::{Action, ShortcutRegistry};
use tiny_notepad::workspace::{Response, Workspace};
use winit::keyboard::Key;

fn workspace_with_two_dirty_tabs() -> Workspace {
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("first");
    workspace.dispatch(Action::NewTab, &MemoryFilesystem::new(), &mut MemoryClipboard::default());
    workspace.active_mut().insert("second");
    assert_eq!(workspace.len(), 2);
    workspace
}

#[test]
fn test_exit_cancel_on_second_tab_keeps_both() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = workspace_with_two_dirty_tabs();

    let response = workspace.dispatch(Action::Exit, &fs, &mut clipboard);
    assert!(matches!(response, Response::Ask(Prompt::ConfirmDiscard { .. })));
    assert_eq!(workspace.active_index(), 0);

    let response = workspace.answer(Answer::Choice(Choice::Discard), &fs);
    assert!(matches!(response, Response::Ask(Prompt::ConfirmDiscard { .. })));
    assert_eq!(workspace.active_index(), 1);

    let response = workspace.answer(Answer::Choice(Choice::Cancel), &fs);
    assert!(matches!(response, Response::Redraw));
    assert_eq!(workspace.len(), 2);
    assert!(!workspace.is_prompting());
    assert!(workspace.tabs()[1].is_modified());
    assert_eq!(fs.writes(), 0);
}

#[test]
fn test_exit_after_every_tab_agreed() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = workspace_with_two_dirty_tabs();

    workspace.dispatch(Action::Exit, &fs, &mut clipboard);
    workspace.answer(Answer::Choice(Choice::Discard), &fs);
    let response = workspace.answer(Answer::Choice(Choice::Discard), &fs);

    assert!(matches!(response, Response::Exit));
    assert_eq!(fs.writes(), 0);
}

#[test]
fn test_exit_clean_workspace_does_not_ask() {
    let fs = MemoryFilesystem::new();
    let mut workspace = Workspace::new(SessionSettings::default());
    let response = workspace.dispatch(Action::Exit, &fs, &mut MemoryClipboard::default());
    assert!(matches!(response, Response::Exit));
}

#[test]
fn test_select_all_chord_selects_without_inserting() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let registry = ShortcutRegistry::with_defaults();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("abc");

    let key = Key::Character("a".into());
    let route = route_key(&registry, false, &Modifiers::primary(), &key, Some("a"), 1);
    let KeyRoute::Action(action) = route else {
        panic!("primary+a routed to {:?}", route);
    };
    assert_eq!(action, Action::SelectAll);

    workspace.dispatch(action, &fs, &mut clipboard);
    let document = workspace.active().document();
    assert_eq!(document.text(), "abc");
    assert_eq!(document.selection(), 0..3);
}

#[test]
fn test_cut_paste_through_dispatch() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("move me");

    workspace.dispatch(Action::SelectAll, &fs, &mut clipboard);
    assert!(matches!(workspace.dispatch(Action::Cut, &fs, &mut clipboard), Response::Redraw));
    assert_eq!(workspace.active().text(), "");

    workspace.dispatch(Action::Paste, &fs, &mut clipboard);
    workspace.dispatch(Action::Paste, &fs, &mut clipboard);
    assert_eq!(workspace.active().text(), "move memove me");
}

#[test]
fn test_save_prompt_answered_writes_file() {
    let fs = MemoryFilesystem::new();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("hello");

    let response = workspace.dispatch(Action::Save, &fs, &mut MemoryClipboard::default());
    assert!(matches!(response, Response::Ask(Prompt::SavePath { suggested: None })));

    // Other actions wait for the answer
    let ignored = workspace.dispatch(Action::SelectAll, &fs, &mut MemoryClipboard::default());
    assert!(matches!(ignored, Response::Idle));

    let response = workspace.answer(Answer::Path(Some(PathBuf::from("/tmp/a.txt"))), &fs);
    assert!(matches!(response, Response::Saved(ref path) if path == Path::new("/tmp/a.txt")));
    assert_eq!(fs.contents("/tmp/a.txt").as_deref(), Some("hello"));
    assert_eq!(workspace.title(), "a.txt - Tiny Notepad");
}

#[test]
fn test_failed_save_is_reported() {
    let fs = MemoryFilesystem::new();
    fs.fail_writes(true);
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("hello");

    workspace.dispatch(Action::Save, &fs, &mut MemoryClipboard::default());
    let response = workspace.answer(Answer::Path(Some(PathBuf::from("/ro/a.txt"))), &fs);
    assert!(matches!(response, Response::Failed(_)));
    assert!(workspace.active().is_modified());
}

#[test]
fn test_close_tabs_until_exit() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.dispatch(Action::NewTab, &fs, &mut clipboard);
    assert_eq!(workspace.active_index(), 1);

    assert!(matches!(workspace.dispatch(Action::CloseTab, &fs, &mut clipboard), Response::Redraw));
    assert_eq!(workspace.len(), 1);
    assert_eq!(workspace.active_index(), 0);

    assert!(matches!(workspace.dispatch(Action::CloseTab, &fs, &mut clipboard), Response::Exit));
}

#[test]
fn test_close_modified_tab_cancel_keeps_it() {
    let fs = MemoryFilesystem::new();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.active_mut().insert("x");

    workspace.dispatch(Action::CloseTab, &fs, &mut MemoryClipboard::default());
    let response = workspace.answer(Answer::Choice(Choice::Cancel), &fs);
    assert!(matches!(response, Response::Redraw));
    assert_eq!(workspace.len(), 1);
    assert_eq!(workspace.active().text(), "x");
}

#[test]
fn test_tab_cycling_wraps() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = Workspace::new(SessionSettings::default());
    workspace.dispatch(Action::NewTab, &fs, &mut clipboard);
    workspace.dispatch(Action::NewTab, &fs, &mut clipboard);
    assert_eq!(workspace.active_index(), 2);

    workspace.dispatch(Action::NextTab, &fs, &mut clipboard);
    assert_eq!(workspace.active_index(), 0);
    workspace.dispatch(Action::PreviousTab, &fs, &mut clipboard);
    assert_eq!(workspace.active_index(), 2);
}

#[test]
fn test_open_paths_from_command_line() {
    let fs = MemoryFilesystem::new().with_file("/work/a.txt", "alpha");
    let mut workspace = Workspace::new(SessionSettings::default());

    let errors = workspace.open_paths(
        &[
            PathBuf::from("/work/a.txt"),
            PathBuf::from("/work/new.txt"),
            PathBuf::from("/work/a.txt"),
        ],
        &fs,
    );

    assert!(errors.is_empty());
    // The empty starting tab was replaced
    assert_eq!(workspace.len(), 2);
    assert_eq!(workspace.tabs()[0].text(), "alpha");
    assert_eq!(workspace.tabs()[1].path(), Some(Path::new("/work/new.txt")));
    assert_eq!(workspace.tabs()[1].text(), "");
    assert!(!workspace.tabs()[1].is_modified());
    // Already-open path switches back to its tab
    assert_eq!(workspace.active_index(), 0);
    assert_eq!(workspace.find_tab_by_path(Path::new("/work/new.txt")), Some(1));
}

#[test]
fn test_undo_redo_through_dispatch() {
    let fs = MemoryFilesystem::new();
    let mut clipboard = MemoryClipboard::default();
    let mut workspace = Workspace::new(SessionSettings::default());

    assert!(matches!(workspace.dispatch(Action::Undo, &fs, &mut clipboard), Response::Idle));
    workspace.active_mut().insert("abc");
    assert!(matches!(workspace.dispatch(Action::Undo, &fs, &mut clipboard), Response::Redraw));
    assert_eq!(workspace.active().text(), "");
    workspace.dispatch(Action::Redo, &fs, &mut clipboard);
    assert_eq!(workspace.active().text(), "abc");
}
