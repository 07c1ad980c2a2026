use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keywedge_core::monitor_types::{MonitorState, UiCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Scans,
    Analyses,
    Logs,
}

/// Keystrokes that belong to the scanner stream rather than the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WedgeInput {
    Character(char),
    Terminator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    None,
    Quit,
    Command(UiCommand),
    Input(WedgeInput),
}

pub struct App {
    pub tab: Tab,
    pub state: MonitorState,
    pub should_quit: bool,
    pub logs: Arc<Mutex<VecDeque<String>>>,
    pub log_scroll: usize,
    pub log_auto_scroll: bool,
}

impl App {
    pub fn new(logs: Arc<Mutex<VecDeque<String>>>) -> Self {
        Self {
            tab: Tab::Scans,
            state: MonitorState::default(),
            should_quit: false,
            logs,
            log_scroll: 0,
            log_auto_scroll: true,
        }
    }

    pub fn update_state(&mut self, new_state: MonitorState) {
        self.state = new_state;
    }

    /// Printable keys go to the classifier; function keys drive the monitor.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return AppAction::Quit;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                AppAction::Quit
            }
            KeyCode::F(1) => self.switch_tab(Tab::Scans),
            KeyCode::F(2) => self.switch_tab(Tab::Analyses),
            KeyCode::F(3) => self.switch_tab(Tab::Logs),
            KeyCode::F(5) => AppAction::Command(UiCommand::SetModal(!self.state.modal_open)),
            KeyCode::Tab => AppAction::Command(UiCommand::SetContext(self.state.next_context())),
            KeyCode::Enter => AppAction::Input(WedgeInput::Terminator),
            KeyCode::Char(c) => AppAction::Input(WedgeInput::Character(c)),
            KeyCode::Up | KeyCode::Down | KeyCode::End if self.tab == Tab::Logs => {
                self.handle_logs_key(key)
            }
            _ => AppAction::None,
        }
    }

    pub fn handle_focus(&mut self, focused: bool) -> AppAction {
        AppAction::Command(UiCommand::SetFocused(focused))
    }

    fn switch_tab(&mut self, tab: Tab) -> AppAction {
        self.tab = tab;
        AppAction::None
    }

    fn handle_logs_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up => {
                self.log_scroll = self.log_scroll.saturating_add(1);
                self.log_auto_scroll = false;
            }
            KeyCode::Down => {
                self.log_scroll = self.log_scroll.saturating_sub(1);
            }
            KeyCode::End => {
                self.log_scroll = 0;
                self.log_auto_scroll = true;
            }
            _ => {}
        }
        AppAction::None
    }
}
