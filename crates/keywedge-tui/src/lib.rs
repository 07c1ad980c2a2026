pub mod app;
pub mod log_layer;
pub mod ui;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind};
use crossterm::execute;
use keywedge_classifier::ClassifierHandle;
use keywedge_core::monitor_types::{MonitorState, UiCommand};
use ratatui::DefaultTerminal;
use tokio::sync::{mpsc, watch};

pub use app::{App, AppAction, Tab, WedgeInput};
pub use log_layer::MonitorLogLayer;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Run the monitor event loop. Blocks until the user quits.
///
/// Keystrokes are timestamped as they are read and go straight to the
/// classifier, so a redraw never sits between two scanner characters.
pub async fn run(
    mut state_rx: watch::Receiver<MonitorState>,
    cmd_tx: mpsc::UnboundedSender<UiCommand>,
    handle: ClassifierHandle,
    log_buffer: Arc<Mutex<VecDeque<String>>>,
) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let _ = execute!(std::io::stdout(), EnableFocusChange);
    let result = run_loop(&mut terminal, &mut state_rx, &cmd_tx, &handle, &log_buffer).await;
    let _ = execute!(std::io::stdout(), DisableFocusChange);
    ratatui::restore();
    result
}

async fn run_loop(
    terminal: &mut DefaultTerminal,
    state_rx: &mut watch::Receiver<MonitorState>,
    cmd_tx: &mpsc::UnboundedSender<UiCommand>,
    handle: &ClassifierHandle,
    log_buffer: &Arc<Mutex<VecDeque<String>>>,
) -> std::io::Result<()> {
    let mut app = App::new(Arc::clone(log_buffer));
    app.update_state(state_rx.borrow_and_update().clone());

    loop {
        if state_rx.has_changed().unwrap_or(false) {
            app.update_state(state_rx.borrow_and_update().clone());
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        if !event::poll(FRAME_INTERVAL)? {
            continue;
        }
        // Drain everything queued so a burst is not split across frames.
        loop {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::FocusGained => app.handle_focus(true),
                Event::FocusLost => app.handle_focus(false),
                _ => AppAction::None,
            };
            if !dispatch(action, handle, cmd_tx) {
                return Ok(());
            }
            if !event::poll(Duration::ZERO)? {
                break;
            }
        }
    }
}

/// Apply an action. Returns false once the user has asked to quit.
///
/// Classifier-facing commands reach the handle before main sees them, which
/// keeps them ordered with the keystrokes around them.
pub fn dispatch(
    action: AppAction,
    handle: &ClassifierHandle,
    cmd_tx: &mpsc::UnboundedSender<UiCommand>,
) -> bool {
    match action {
        AppAction::None => {}
        AppAction::Quit => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return false;
        }
        AppAction::Input(WedgeInput::Character(ch)) => handle.on_character_now(ch),
        AppAction::Input(WedgeInput::Terminator) => handle.on_terminator(),
        AppAction::Command(cmd) => {
            match &cmd {
                UiCommand::SetContext(context) => handle.set_context(context.clone()),
                UiCommand::SetModal(open) => handle.on_modal_presented(*open),
                UiCommand::SetFocused(focused) => handle.on_focus_changed(*focused),
                UiCommand::Quit => {}
            }
            let _ = cmd_tx.send(cmd);
        }
    }
    true
}
