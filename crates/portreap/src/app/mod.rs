//! Interactive session runtime.
//!
//! One serialized loop owns the [`Session`] and is the only place its state
//! mutates. Background work (discovery, termination) runs in detached tasks
//! that report back with a single message; the input thread and the tick
//! interval feed the same channel.

pub mod session;

use std::io;
use std::sync::Arc;

use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use tokio::sync::mpsc;
use tracing::warn;

use portreap_kill::TerminateError;
use portreap_ports::DiscoveryError;
use portreap_ports::PortProvider;
use portreap_ports::PortRecord;

use crate::error::AppError;
use crate::terminal::TerminalGuard;
use crate::ui;

use session::Effect;
use session::KeyInput;
use session::Session;
use session::DISCOVERY_TIMEOUT;
use session::TICK_INTERVAL;

/// Everything that can wake the session loop.
enum AppMessage {
    Key(KeyInput),
    Resized,
    Discovered {
        generation: u64,
        result: Result<Vec<PortRecord>, DiscoveryError>,
    },
    Terminated {
        target: PortRecord,
        result: Result<(), TerminateError>,
    },
}

/// Runs the interactive session until the user quits.
///
/// Failing to set up the terminal is the one fatal path; everything after
/// that is recovered into session state.
pub async fn run(provider: Arc<dyn PortProvider>) -> Result<(), AppError> {
    let _guard = TerminalGuard::enter()?;

    let (tx, mut rx) = mpsc::channel::<AppMessage>(64);
    spawn_input_reader(tx.clone());

    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut stdout = io::stdout();
    let mut session = Session::new();
    let mut effects = session.start();

    loop {
        ui::draw(&mut stdout, &session)?;

        for effect in effects.drain(..) {
            match effect {
                Effect::Discover { generation } => {
                    spawn_discovery(Arc::clone(&provider), generation, tx.clone());
                }
                Effect::Kill { target } => {
                    spawn_termination(target, tx.clone());
                }
                Effect::Quit => return Ok(()),
            }
        }

        effects = tokio::select! {
            message = rx.recv() => match message {
                Some(AppMessage::Key(key)) => session.on_key(key),
                Some(AppMessage::Resized) => Vec::new(),
                Some(AppMessage::Discovered { generation, result }) => {
                    session.on_discovery(generation, result)
                }
                Some(AppMessage::Terminated { target, result }) => {
                    session.on_termination(target, result)
                }
                None => return Err(AppError::ChannelClosed),
            },
            _ = tick.tick() => session.on_tick(),
        };
    }
}

/// Forwards terminal events into the session channel from a dedicated
/// thread, since `event::read` blocks.
fn spawn_input_reader(tx: mpsc::Sender<AppMessage>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                if let Some(input) = decode_key(key.code, key.modifiers) {
                    if tx.blocking_send(AppMessage::Key(input)).is_err() {
                        break;
                    }
                }
            }
            Ok(Event::Resize(_, _)) => {
                if tx.blocking_send(AppMessage::Resized).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%err, "failed to read terminal event");
                break;
            }
        }
    });
}

fn decode_key(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyInput> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(KeyInput::CtrlC);
    }
    match code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        _ => None,
    }
}

fn spawn_discovery(
    provider: Arc<dyn PortProvider>,
    generation: u64,
    tx: mpsc::Sender<AppMessage>,
) {
    tokio::spawn(async move {
        let result = provider.list(DISCOVERY_TIMEOUT).await;
        let _ = tx
            .send(AppMessage::Discovered { generation, result })
            .await;
    });
}

/// Termination is synchronous by design (fixed grace waits, never cancelled
/// mid-escalation), so it runs on the blocking pool.
fn spawn_termination(target: PortRecord, tx: mpsc::Sender<AppMessage>) {
    tokio::task::spawn_blocking(move || {
        let result = portreap_kill::terminate(target.pid);
        let _ = tx.blocking_send(AppMessage::Terminated { target, result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_keys() {
        assert_eq!(
            decode_key(KeyCode::Char('j'), KeyModifiers::NONE),
            Some(KeyInput::Char('j'))
        );
        assert_eq!(
            decode_key(KeyCode::Enter, KeyModifiers::NONE),
            Some(KeyInput::Enter)
        );
        assert_eq!(decode_key(KeyCode::Up, KeyModifiers::NONE), Some(KeyInput::Up));
        assert_eq!(decode_key(KeyCode::Tab, KeyModifiers::NONE), None);
    }

    #[test]
    fn test_decode_ctrl_c() {
        assert_eq!(
            decode_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyInput::CtrlC)
        );
        assert_eq!(
            decode_key(KeyCode::Char('c'), KeyModifiers::NONE),
            Some(KeyInput::Char('c'))
        );
    }
}
