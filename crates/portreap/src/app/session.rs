//! Session state machine.
//!
//! Pure event→effects logic: the runtime loop feeds discrete events in
//! (keys, completed background operations, ticks) and executes the returned
//! effects. Nothing in here performs IO, which is what makes the transition
//! rules testable without a terminal or live processes.

use std::time::Duration;

use portreap_kill::TerminateError;
use portreap_ports::DiscoveryError;
use portreap_ports::PortRecord;

/// Bound on one discovery cycle; expiry is handled as a normal failure.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);
/// Cadence of the tick event driving toast expiry.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);
/// Toast lifetime, in ticks (3 seconds).
const TOAST_TICKS: u32 = 12;

/// Where the session currently is. The working list lives outside the phase
/// so `Failed` can keep showing the last known-good records.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Confirming { target: PortRecord, pending: bool },
    Failed { message: String },
}

/// Key events, already decoded from the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    CtrlC,
}

/// Work the runtime loop must start on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Discover { generation: u64 },
    Kill { target: PortRecord },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Transient notification shown in the footer until its ticks run out.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    remaining_ticks: u32,
}

#[derive(Debug, Default)]
struct FilterState {
    editing: bool,
    query: String,
}

pub struct Session {
    phase: Phase,
    records: Vec<PortRecord>,
    selected: usize,
    filter: FilterState,
    status: String,
    toast: Option<Toast>,
    help_visible: bool,
    /// Generation of the latest issued discovery request; results tagged
    /// with an older generation are stale and discarded.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            records: Vec::new(),
            selected: 0,
            filter: FilterState::default(),
            status: String::new(),
            toast: None,
            help_visible: false,
            generation: 0,
        }
    }

    /// Kicks off the first discovery.
    pub fn start(&mut self) -> Vec<Effect> {
        self.begin_discovery("Scanning ports...")
    }

    pub fn on_key(&mut self, key: KeyInput) -> Vec<Effect> {
        if key == KeyInput::CtrlC {
            return vec![Effect::Quit];
        }
        if matches!(self.phase, Phase::Confirming { .. }) {
            return self.on_confirm_key(key);
        }
        if self.filter.editing {
            return self.on_filter_key(key);
        }

        match key {
            KeyInput::Char('q') => vec![Effect::Quit],
            KeyInput::Char('j') | KeyInput::Down => {
                self.move_selection(1);
                Vec::new()
            }
            KeyInput::Char('k') | KeyInput::Up => {
                self.move_selection(-1);
                Vec::new()
            }
            KeyInput::Char('r') => match self.phase {
                Phase::Ready | Phase::Failed { .. } => self.begin_discovery("Refreshing..."),
                _ => Vec::new(),
            },
            KeyInput::Char('/') => {
                self.filter.editing = true;
                Vec::new()
            }
            KeyInput::Char('?') => {
                self.help_visible = !self.help_visible;
                Vec::new()
            }
            KeyInput::Char('d') | KeyInput::Enter => self.request_termination(),
            KeyInput::Esc => {
                if self.help_visible {
                    self.help_visible = false;
                } else if !self.filter.query.is_empty() {
                    self.filter.query.clear();
                    self.clamp_selection();
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Result of a discovery unit. Only the latest generation may install
    /// its list; anything older lost the race to a newer request.
    pub fn on_discovery(
        &mut self,
        generation: u64,
        result: Result<Vec<PortRecord>, DiscoveryError>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            return Vec::new();
        }
        match result {
            Ok(entries) => {
                self.records = entries;
                self.clamp_selection();
                self.phase = Phase::Ready;
                self.status = format!(
                    "Loaded {} ports @ {}",
                    self.records.len(),
                    chrono::Local::now().format("%-I:%M%p")
                );
            }
            Err(err) => {
                self.phase = Phase::Failed {
                    message: format!("error loading ports: {err}"),
                };
                self.status.clear();
            }
        }
        Vec::new()
    }

    /// Result of the in-flight termination. On success the target is removed
    /// optimistically and exactly one reconciling discovery is issued; the
    /// next completed scan is the ground truth.
    pub fn on_termination(
        &mut self,
        target: PortRecord,
        result: Result<(), TerminateError>,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                self.remove_record(&target);
                self.set_toast(
                    ToastKind::Success,
                    format!("Terminated {} ({})", target.process, target.pid),
                );
                self.begin_discovery("Refreshing port list...")
            }
            Err(err) => {
                self.phase = Phase::Ready;
                self.set_toast(
                    ToastKind::Error,
                    format!("Failed to terminate {} ({}): {err}", target.process, target.pid),
                );
                Vec::new()
            }
        }
    }

    pub fn on_tick(&mut self) -> Vec<Effect> {
        if let Some(toast) = self.toast.as_mut() {
            if toast.remaining_ticks == 0 {
                self.toast = None;
            } else {
                toast.remaining_ticks -= 1;
            }
        }
        Vec::new()
    }

    // --- accessors for the renderer ---

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// Records passing the current filter, in display order.
    pub fn visible_records(&self) -> Vec<&PortRecord> {
        if self.filter.query.is_empty() {
            return self.records.iter().collect();
        }
        let needle = self.filter.query.to_lowercase();
        self.records
            .iter()
            .filter(|record| filter_haystack(record).contains(&needle))
            .collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn filter_query(&self) -> &str {
        &self.filter.query
    }

    pub fn filter_editing(&self) -> bool {
        self.filter.editing
    }

    // --- internals ---

    fn begin_discovery(&mut self, status: &str) -> Vec<Effect> {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.status = status.to_string();
        vec![Effect::Discover {
            generation: self.generation,
        }]
    }

    fn request_termination(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Ready {
            return Vec::new();
        }
        let Some(target) = self.selected_record().cloned() else {
            return Vec::new();
        };
        self.status = format!("Target locked: {} ({})", target.process, target.pid);
        self.phase = Phase::Confirming {
            target,
            pending: false,
        };
        Vec::new()
    }

    fn on_confirm_key(&mut self, key: KeyInput) -> Vec<Effect> {
        let Phase::Confirming { target, pending } = &mut self.phase else {
            return Vec::new();
        };
        match key {
            KeyInput::Char('y') | KeyInput::Char('Y') | KeyInput::Enter => {
                // At most one termination in flight per confirmation.
                if *pending {
                    return Vec::new();
                }
                *pending = true;
                let target = target.clone();
                self.set_toast(
                    ToastKind::Info,
                    format!("Sending SIGTERM to pid {}", target.pid),
                );
                vec![Effect::Kill { target }]
            }
            KeyInput::Char('n') | KeyInput::Char('N') | KeyInput::Esc => {
                // Once a signal is out the operation runs to completion;
                // cancel only applies before confirmation.
                if *pending {
                    return Vec::new();
                }
                self.phase = Phase::Ready;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_filter_key(&mut self, key: KeyInput) -> Vec<Effect> {
        match key {
            KeyInput::Char(c) => {
                self.filter.query.push(c);
                self.clamp_selection();
            }
            KeyInput::Backspace => {
                self.filter.query.pop();
                self.clamp_selection();
            }
            KeyInput::Enter => {
                self.filter.editing = false;
            }
            KeyInput::Esc => {
                self.filter.editing = false;
                self.filter.query.clear();
                self.clamp_selection();
            }
            _ => {}
        }
        Vec::new()
    }

    fn selected_record(&self) -> Option<&PortRecord> {
        self.visible_records().get(self.selected).copied()
    }

    fn move_selection(&mut self, delta: i64) {
        let len = self.visible_records().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected as i64;
        self.selected = (current + delta).clamp(0, len as i64 - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_records().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn remove_record(&mut self, target: &PortRecord) {
        if let Some(index) = self.records.iter().position(|r| r.same_binding(target)) {
            self.records.remove(index);
        }
        self.clamp_selection();
    }

    fn set_toast(&mut self, kind: ToastKind, text: String) {
        self.toast = Some(Toast {
            text,
            kind,
            remaining_ticks: TOAST_TICKS,
        });
    }
}

fn filter_haystack(record: &PortRecord) -> String {
    format!(
        "{} {} {} {} {}",
        record.process, record.port, record.protocol, record.user, record.state
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, process: &str, port: u16) -> PortRecord {
        PortRecord {
            pid,
            process: process.to_string(),
            user: "dev".to_string(),
            protocol: "tcp".to_string(),
            port,
            address: "*".to_string(),
            state: "LISTEN".to_string(),
        }
    }

    fn sample() -> Vec<PortRecord> {
        vec![
            record(100, "nginx", 443),
            record(200, "node", 3000),
            record(300, "postgres", 5432),
        ]
    }

    /// Drives a session to Ready with the sample records installed.
    fn ready_session() -> Session {
        let mut session = Session::new();
        let effects = session.start();
        let Some(Effect::Discover { generation }) = effects.first().cloned() else {
            panic!("start issued no discovery");
        };
        session.on_discovery(generation, Ok(sample()));
        session
    }

    #[test]
    fn test_start_enters_loading_and_issues_one_discovery() {
        let mut session = Session::new();
        let effects = session.start();
        assert_eq!(effects, vec![Effect::Discover { generation: 1 }]);
        assert_eq!(*session.phase(), Phase::Loading);
    }

    #[test]
    fn test_discovery_success_installs_list() {
        let session = ready_session();
        assert_eq!(*session.phase(), Phase::Ready);
        assert_eq!(session.total_count(), 3);
        assert!(session.status().starts_with("Loaded 3 ports"));
    }

    #[test]
    fn test_discovery_failure_retains_previous_list() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('r'));
        session.on_discovery(
            2,
            Err(DiscoveryError::TimedOut {
                timeout: DISCOVERY_TIMEOUT,
            }),
        );

        assert!(matches!(session.phase(), Phase::Failed { .. }));
        assert_eq!(session.total_count(), 3);
    }

    #[test]
    fn test_stale_discovery_result_is_discarded() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('r')); // generation 2 in flight

        // A late response from generation 1 must not overwrite anything.
        session.on_discovery(1, Ok(vec![record(999, "stale", 9999)]));
        assert_eq!(*session.phase(), Phase::Loading);
        assert_eq!(session.total_count(), 3);

        session.on_discovery(2, Ok(vec![record(400, "redis-server", 6379)]));
        assert_eq!(*session.phase(), Phase::Ready);
        assert_eq!(session.total_count(), 1);
    }

    #[test]
    fn test_refresh_only_from_ready_or_failed() {
        let mut session = Session::new();
        session.start();
        // Loading: refresh is a no-op, keeping a single request in flight.
        assert!(session.on_key(KeyInput::Char('r')).is_empty());

        session.on_discovery(1, Ok(sample()));
        let effects = session.on_key(KeyInput::Char('r'));
        assert_eq!(effects, vec![Effect::Discover { generation: 2 }]);
    }

    #[test]
    fn test_select_and_confirm_issues_single_kill() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        assert!(matches!(
            session.phase(),
            Phase::Confirming { pending: false, .. }
        ));

        let effects = session.on_key(KeyInput::Char('y'));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Kill { ref target } if target.pid == 100));
        assert!(matches!(
            session.phase(),
            Phase::Confirming { pending: true, .. }
        ));

        // Confirming again while pending is a no-op.
        assert!(session.on_key(KeyInput::Char('y')).is_empty());
        assert!(session.on_key(KeyInput::Enter).is_empty());
    }

    #[test]
    fn test_cancel_returns_to_ready_unchanged() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('d'));
        let effects = session.on_key(KeyInput::Char('n'));

        assert!(effects.is_empty());
        assert_eq!(*session.phase(), Phase::Ready);
        assert_eq!(session.total_count(), 3);
    }

    #[test]
    fn test_cancel_ignored_while_pending() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        session.on_key(KeyInput::Char('y'));

        assert!(session.on_key(KeyInput::Esc).is_empty());
        assert!(matches!(
            session.phase(),
            Phase::Confirming { pending: true, .. }
        ));
    }

    #[test]
    fn test_termination_success_removes_and_reconciles() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        session.on_key(KeyInput::Char('y'));

        let target = record(100, "nginx", 443);
        let effects = session.on_termination(target, Ok(()));

        // Optimistic removal plus exactly one follow-up discovery.
        assert_eq!(session.total_count(), 2);
        assert_eq!(effects, vec![Effect::Discover { generation: 2 }]);
        assert_eq!(*session.phase(), Phase::Loading);
        assert_eq!(session.toast().unwrap().kind, ToastKind::Success);
    }

    #[test]
    fn test_termination_removal_ignores_protocol_case() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        session.on_key(KeyInput::Char('y'));

        let mut target = record(100, "nginx", 443);
        target.protocol = "TCP".to_string();
        session.on_termination(target, Ok(()));
        assert_eq!(session.total_count(), 2);
    }

    #[test]
    fn test_termination_failure_keeps_record() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        session.on_key(KeyInput::Char('y'));

        let target = record(100, "nginx", 443);
        let effects = session.on_termination(
            target,
            Err(TerminateError::Unresponsive { pid: 100 }),
        );

        assert!(effects.is_empty());
        assert_eq!(*session.phase(), Phase::Ready);
        assert_eq!(session.total_count(), 3);
        assert_eq!(session.toast().unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn test_selection_moves_and_clamps() {
        let mut session = ready_session();
        session.on_key(KeyInput::Down);
        session.on_key(KeyInput::Char('j'));
        session.on_key(KeyInput::Down); // past the end
        assert_eq!(session.selected_index(), 2);

        session.on_key(KeyInput::Char('k'));
        session.on_key(KeyInput::Up);
        session.on_key(KeyInput::Up); // past the start
        assert_eq!(session.selected_index(), 0);
    }

    #[test]
    fn test_filter_narrows_visible_records() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('/'));
        for c in "post".chars() {
            session.on_key(KeyInput::Char(c));
        }

        let visible = session.visible_records();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].process, "postgres");

        // Accept, then clear via esc from browse mode.
        session.on_key(KeyInput::Enter);
        assert!(!session.filter_editing());
        session.on_key(KeyInput::Esc);
        assert_eq!(session.visible_records().len(), 3);
    }

    #[test]
    fn test_filter_matches_port_number() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('/'));
        for c in "5432".chars() {
            session.on_key(KeyInput::Char(c));
        }
        assert_eq!(session.visible_records().len(), 1);
    }

    #[test]
    fn test_termination_requested_on_filtered_selection() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('/'));
        for c in "node".chars() {
            session.on_key(KeyInput::Char(c));
        }
        session.on_key(KeyInput::Enter); // leave filter editing
        session.on_key(KeyInput::Enter); // select for termination

        match session.phase() {
            Phase::Confirming { target, .. } => assert_eq!(target.pid, 200),
            other => panic!("expected Confirming, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_with_empty_list_is_noop() {
        let mut session = Session::new();
        session.start();
        session.on_discovery(1, Ok(Vec::new()));
        assert!(session.on_key(KeyInput::Enter).is_empty());
        assert_eq!(*session.phase(), Phase::Ready);
    }

    #[test]
    fn test_quit_keys() {
        let mut session = ready_session();
        assert_eq!(session.on_key(KeyInput::Char('q')), vec![Effect::Quit]);
        assert_eq!(session.on_key(KeyInput::CtrlC), vec![Effect::Quit]);
    }

    #[test]
    fn test_toast_expires_after_its_ticks() {
        let mut session = ready_session();
        session.on_key(KeyInput::Enter);
        session.on_key(KeyInput::Char('y'));
        assert!(session.toast().is_some());

        for _ in 0..=TOAST_TICKS {
            session.on_tick();
        }
        assert!(session.toast().is_none());
    }

    #[test]
    fn test_help_toggles_and_esc_dismisses() {
        let mut session = ready_session();
        session.on_key(KeyInput::Char('?'));
        assert!(session.help_visible());
        session.on_key(KeyInput::Esc);
        assert!(!session.help_visible());
    }
}
