use std::mem;
use std::time::Duration;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc::UnboundedSender;

use super::delimiter::final_text;
use crate::config::Settings;
use crate::console::{ConsoleWidget, KeyOutcome, TextStyle};
use crate::process::{ChannelError, ChannelEvent, OutputStream, ProcessChannel};
use crate::theme::ConsolePalette;

/// Things the host may want to react to, queued in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotification {
    BeforeSend,
    TextSent,
    ResultReceived,
    ErrorReceived,
    /// The interpreter went away without being stopped
    SessionExited,
}

/// One interpreter process wired to one console widget.
///
/// Output events arrive from the channel's reader threads through the
/// receiver paired with the sender given to [`Session::new`]; the owner feeds
/// them back in with [`Session::handle_event`].
pub struct Session {
    channel: ProcessChannel,
    widget: ConsoleWidget,
    settings: Settings,
    /// Generation whose output is still applied; None once stopped
    accepting: Option<u64>,
    /// Running as of the last start or poll
    live: bool,
    notifications: Vec<SessionNotification>,
}

impl Session {
    pub fn new(
        settings: Settings,
        palette: ConsolePalette,
        events: UnboundedSender<ChannelEvent>,
    ) -> Self {
        let widget = ConsoleWidget::new(
            settings.tab_policy(),
            settings.editor.restart_marker.clone(),
            palette,
        );
        Self {
            channel: ProcessChannel::new(events),
            widget,
            settings,
            accepting: None,
            live: false,
            notifications: Vec::new(),
        }
    }

    pub fn widget(&self) -> &ConsoleWidget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut ConsoleWidget {
        &mut self.widget
    }

    /// Adopt new settings; they apply to the next start and to the widget now
    pub fn apply_settings(&mut self, settings: Settings) {
        self.widget.set_tab_policy(settings.tab_policy());
        self.widget
            .set_restart_marker(settings.editor.restart_marker.clone());
        self.settings = settings;
    }

    pub fn is_running(&self) -> bool {
        self.channel.is_running()
    }

    /// Launch the configured interpreter; the widget is enabled on success
    pub fn start(&mut self) -> bool {
        self.try_start().is_ok()
    }

    /// Like [`Session::start`], keeping the reason for a failure
    pub fn try_start(&mut self) -> Result<(), ChannelError> {
        let process = &self.settings.process;
        match self.channel.start(&process.executable, &process.arguments) {
            Ok(()) => {
                self.accepting = Some(self.channel.generation());
                self.live = true;
                self.widget.set_enabled(true);
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to start interpreter: {e}");
                self.accepting = None;
                self.live = false;
                self.widget.set_enabled(false);
                Err(e)
            }
        }
    }

    /// Stop the interpreter; output still in flight is discarded
    pub fn stop(&mut self) {
        let timeout = Duration::from_millis(self.settings.process.stop_timeout_ms);
        self.channel.stop(timeout);
        self.accepting = None;
        self.live = false;
        self.widget.set_enabled(false);
    }

    /// Send `text` to the interpreter.
    ///
    /// Does nothing when `text` is empty or nothing is running. With
    /// `append_to_editor` the exact bytes written are echoed as input.
    pub fn send_text(
        &mut self,
        text: &str,
        add_delimiter: bool,
        append_to_editor: bool,
    ) -> Result<(), ChannelError> {
        if text.is_empty() || !self.channel.is_running() {
            return Ok(());
        }

        let text = final_text(text, add_delimiter, self.settings.tab_policy());
        if append_to_editor {
            self.widget.append(&text, TextStyle::Input);
        }

        self.notifications.push(SessionNotification::BeforeSend);
        if let Err(e) = self.channel.write(text.as_bytes()) {
            tracing::warn!("sending to interpreter failed: {e}");
            return Err(e);
        }
        tracing::debug!(bytes = text.len(), "text sent");
        self.notifications.push(SessionNotification::TextSent);
        Ok(())
    }

    /// Apply one chunk of interpreter output
    pub fn handle_event(&mut self, event: ChannelEvent) {
        if self.accepting != Some(event.generation) {
            tracing::trace!(generation = event.generation, "dropping stale output");
            return;
        }
        let (style, notification) = match event.stream {
            OutputStream::Result => (TextStyle::Result, SessionNotification::ResultReceived),
            OutputStream::Error => (TextStyle::Error, SessionNotification::ErrorReceived),
        };
        self.widget.append(&event.text, style);
        self.notifications.push(notification);
    }

    /// Route a key to the console; a submitted line goes to the interpreter
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let outcome = self.widget.handle_key(key);
        if let KeyOutcome::Submit(command) = &outcome {
            if let Err(e) = self.send_text(command, true, false) {
                self.widget
                    .append(&format!("{e}\n"), TextStyle::Error);
            }
        }
        outcome
    }

    /// Notice an interpreter that exited on its own
    pub fn poll(&mut self) {
        if self.live && !self.channel.is_running() {
            tracing::info!("interpreter exited");
            self.live = false;
            self.widget.set_enabled(false);
            self.notifications.push(SessionNotification::SessionExited);
        }
    }

    /// Take the notifications raised since the last call
    pub fn drain_notifications(&mut self) -> Vec<SessionNotification> {
        mem::take(&mut self.notifications)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::console::LINE_ENDING;
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use std::thread;
    use std::time::Instant;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const WAIT: Duration = Duration::from_secs(5);

    fn session_running(executable: &str, arguments: &str) -> (Session, UnboundedReceiver<ChannelEvent>) {
        let mut settings = Settings::default();
        settings.process.executable = executable.to_string();
        settings.process.arguments = arguments.to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(settings, ConsolePalette::default(), tx);
        (session, rx)
    }

    /// Feed events into the session until its console contains `needle`
    fn pump_until(session: &mut Session, rx: &mut UnboundedReceiver<ChannelEvent>, needle: &str) {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline && !session.widget().buffer().to_string().contains(needle) {
            match rx.try_recv() {
                Ok(event) => session.handle_event(event),
                Err(_) => thread::sleep(Duration::from_millis(10)),
            }
        }
    }

    #[test]
    fn start_enables_widget() {
        let (mut session, _rx) = session_running("cat", "");
        assert!(!session.widget().is_enabled());
        assert!(session.start());
        assert!(session.is_running());
        assert!(session.widget().is_enabled());
        session.stop();
        assert!(!session.widget().is_enabled());
    }

    #[test]
    fn failed_start_leaves_widget_disabled() {
        let (mut session, _rx) = session_running("/nonexistent/replpane-interpreter", "");
        assert!(!session.start());
        assert!(matches!(session.try_start(), Err(ChannelError::Spawn { .. })));
        assert!(!session.widget().is_enabled());
    }

    #[test]
    fn send_text_echoes_and_writes_terminated_statement() {
        let (mut session, mut rx) = session_running("cat", "");
        session.start();

        session.send_text("1+1", true, true).unwrap();
        let sent = format!("1+1;;{LINE_ENDING}");
        assert_eq!(session.widget().buffer().to_string(), sent);
        assert_eq!(session.widget().buffer().style_at(0), TextStyle::Input);
        assert_eq!(
            session.drain_notifications(),
            vec![SessionNotification::BeforeSend, SessionNotification::TextSent]
        );

        // cat writes back exactly what it was sent
        pump_until(&mut session, &mut rx, &format!("{sent}{sent}"));
        assert_eq!(session.widget().buffer().to_string(), format!("{sent}{sent}"));
        assert_eq!(session.widget().buffer().style_at(sent.chars().count()), TextStyle::Result);
        session.stop();
    }

    #[test]
    fn send_without_echo_still_notifies() {
        let (mut session, _rx) = session_running("cat", "");
        session.start();
        session.send_text("x", true, false).unwrap();
        assert!(session.widget().buffer().is_empty());
        assert_eq!(
            session.drain_notifications(),
            vec![SessionNotification::BeforeSend, SessionNotification::TextSent]
        );
        session.stop();
    }

    #[test]
    fn send_is_a_no_op_when_empty_or_stopped() {
        let (mut session, _rx) = session_running("cat", "");
        session.send_text("1+1", true, true).unwrap();
        assert!(session.widget().buffer().is_empty());

        session.start();
        session.send_text("", true, true).unwrap();
        assert!(session.widget().buffer().is_empty());
        assert!(session.drain_notifications().is_empty());
        session.stop();
    }

    #[test]
    fn stdout_and_stderr_are_styled() {
        let (mut session, mut rx) = session_running("/bin/sh", r#"-c "echo 2; sleep 0.1; echo 'error: oops' 1>&2""#);
        session.start();
        pump_until(&mut session, &mut rx, "error: oops\n");

        let buffer = session.widget().buffer();
        assert_eq!(buffer.to_string(), "2\nerror: oops\n");
        assert_eq!(buffer.style_at(0), TextStyle::Result);
        assert_eq!(buffer.style_at(2), TextStyle::Error);
        assert_eq!(session.widget().boundary().offset, buffer.len_chars());
        assert_eq!(
            session.drain_notifications(),
            vec![SessionNotification::ResultReceived, SessionNotification::ErrorReceived]
        );
        session.stop();
    }

    #[test]
    fn output_after_stop_is_dropped() {
        let (mut session, _rx) = session_running("cat", "");
        session.start();
        let generation = session.channel.generation();
        session.stop();

        session.handle_event(ChannelEvent {
            generation,
            stream: OutputStream::Result,
            text: "late\n".to_string(),
        });
        assert!(session.widget().buffer().is_empty());
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn enter_submits_line_with_terminator() {
        let (mut session, mut rx) = session_running("cat", "");
        session.start();
        for c in "let x = 5".chars() {
            session.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        let outcome = session.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(outcome, KeyOutcome::Submit(format!("let x = 5{LINE_ENDING}")));

        // No echo: the console holds the typed line, then cat's copy
        let expected = format!("let x = 5{LINE_ENDING}let x = 5;;{LINE_ENDING}");
        pump_until(&mut session, &mut rx, &expected);
        assert_eq!(session.widget().buffer().to_string(), expected);
        session.stop();
    }

    #[test]
    fn poll_reports_exit_once() {
        let (mut session, _rx) = session_running("/bin/sh", r#"-c "exit 0""#);
        session.start();

        let deadline = Instant::now() + WAIT;
        while session.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        session.poll();
        session.poll();
        assert_eq!(session.drain_notifications(), vec![SessionNotification::SessionExited]);
        assert!(!session.widget().is_enabled());
        session.stop();
    }

    #[test]
    fn stop_twice_is_same_as_once() {
        let (mut session, _rx) = session_running("cat", "");
        session.start();
        session.stop();
        session.stop();
        assert!(!session.is_running());
        session.poll();
        assert!(session.drain_notifications().is_empty());
    }
}
