use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use super::args::split_arguments;
use super::event::{ChannelEvent, OutputStream, Utf8Decoder};

/// Bytes read from a pipe per call
pub const READ_CHUNK: usize = 8_192;

/// How often `stop` checks whether the child has exited
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("no executable configured")]
    EmptyPath,

    #[error("failed to launch '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: io::Error,
    },

    #[error("child process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("failed to start output reader: {0}")]
    Reader(#[source] io::Error),

    #[error("process is not running")]
    NotRunning,

    #[error("write to process failed: {0}")]
    Write(#[source] io::Error),
}

/// A live child process and the threads draining its output
struct ProcessSession {
    executable: String,
    child: Child,
    stdin: Option<ChildStdin>,
    readers: Vec<JoinHandle<()>>,
    /// Cleared by `stop`; readers drop output once it is false
    deliver: Arc<AtomicBool>,
}

/// Owns one child process with piped standard streams.
///
/// Output is read on two background threads (stdout and stderr) and posted as
/// [`ChannelEvent`]s to the sender given at construction. The receiving side
/// lives on the control thread; readers never touch anything else.
pub struct ProcessChannel {
    events: UnboundedSender<ChannelEvent>,
    session: Option<ProcessSession>,
    running: Arc<AtomicBool>,
    generation: u64,
}

impl ProcessChannel {
    pub fn new(events: UnboundedSender<ChannelEvent>) -> Self {
        Self {
            events,
            session: None,
            running: Arc::new(AtomicBool::new(false)),
            generation: 0,
        }
    }

    /// True while the child is live and its readers are active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Generation of the most recent successful start
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Spawn `executable` with `arguments` and start reading its output.
    ///
    /// A previous process, if any, is stopped first.
    pub fn start(&mut self, executable: &str, arguments: &str) -> Result<(), ChannelError> {
        let executable = executable.trim();
        if executable.is_empty() {
            return Err(ChannelError::EmptyPath);
        }

        if self.session.is_some() {
            self.stop(Duration::ZERO);
        }

        let args = split_arguments(arguments);
        let mut command = Command::new(executable);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command.spawn().map_err(|source| ChannelError::Spawn {
            executable: executable.to_string(),
            source,
        })?;

        let (stdin, stdout, stderr) = match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            (stdin, stdout, _) => {
                let missing = if stdin.is_none() {
                    "stdin"
                } else if stdout.is_none() {
                    "stdout"
                } else {
                    "stderr"
                };
                reap(&mut child);
                return Err(ChannelError::MissingPipe(missing));
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let deliver = Arc::new(AtomicBool::new(true));
        let open_readers = Arc::new(AtomicUsize::new(2));
        self.running.store(true, Ordering::Release);

        let mut readers = Vec::with_capacity(2);
        let spawned = [
            (Box::new(stdout) as Box<dyn Read + Send>, OutputStream::Result),
            (Box::new(stderr) as Box<dyn Read + Send>, OutputStream::Error),
        ]
        .into_iter()
        .try_for_each(|(source, stream)| {
            let reader = Reader {
                stream,
                generation,
                events: self.events.clone(),
                deliver: Arc::clone(&deliver),
                open_readers: Arc::clone(&open_readers),
                running: Arc::clone(&self.running),
            };
            readers.push(reader.spawn(source)?);
            Ok::<(), io::Error>(())
        });

        if let Err(e) = spawned {
            deliver.store(false, Ordering::Release);
            drop(stdin);
            reap(&mut child);
            join_readers(&mut readers);
            self.running.store(false, Ordering::Release);
            return Err(ChannelError::Reader(e));
        }

        tracing::info!(executable, ?args, pid = child.id(), generation, "child process started");

        self.session = Some(ProcessSession {
            executable: executable.to_string(),
            child,
            stdin: Some(stdin),
            readers,
            deliver,
        });
        Ok(())
    }

    /// Write raw bytes to the child's stdin.
    ///
    /// Blocks only on pipe backpressure.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        if !self.is_running() {
            return Err(ChannelError::NotRunning);
        }
        let stdin = self
            .session
            .as_mut()
            .and_then(|s| s.stdin.as_mut())
            .ok_or(ChannelError::NotRunning)?;

        stdin.write_all(bytes).map_err(ChannelError::Write)?;
        stdin.flush().map_err(ChannelError::Write)?;
        Ok(())
    }

    /// Close stdin and give the child `timeout` to exit, then kill it.
    ///
    /// Returns once both readers have finished. Safe to call when nothing is
    /// running.
    pub fn stop(&mut self, timeout: Duration) {
        let Some(mut session) = self.session.take() else {
            self.running.store(false, Ordering::Release);
            return;
        };

        session.deliver.store(false, Ordering::Release);
        drop(session.stdin.take());

        let deadline = Instant::now() + timeout;
        loop {
            match session.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!(executable = %session.executable, %status, "child process exited");
                    break;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(STOP_POLL_INTERVAL),
                Ok(None) => {
                    tracing::info!(executable = %session.executable, "killing child process");
                    reap(&mut session.child);
                    break;
                }
                Err(e) => {
                    tracing::warn!("waiting on child process failed: {e}");
                    reap(&mut session.child);
                    break;
                }
            }
        }

        join_readers(&mut session.readers);
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.stop(Duration::ZERO);
    }
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!("kill failed (child may already be gone): {e}");
    }
    if let Err(e) = child.wait() {
        tracing::debug!("wait after kill failed: {e}");
    }
}

fn join_readers(readers: &mut Vec<JoinHandle<()>>) {
    for reader in readers.drain(..) {
        if reader.join().is_err() {
            tracing::warn!("output reader thread panicked");
        }
    }
}

/// State moved into one reader thread
struct Reader {
    stream: OutputStream,
    generation: u64,
    events: UnboundedSender<ChannelEvent>,
    deliver: Arc<AtomicBool>,
    open_readers: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl Reader {
    fn spawn(self, source: Box<dyn Read + Send>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("replpane-{}", self.stream.label()))
            .spawn(move || self.run(source))
    }

    fn run(self, mut source: Box<dyn Read + Send>) {
        let mut buf = [0u8; READ_CHUNK];
        let mut decoder = Utf8Decoder::new();

        loop {
            match source.read(&mut buf) {
                Ok(0) => {
                    let tail = decoder.finish();
                    self.post(tail);
                    break;
                }
                Ok(n) => {
                    let text = decoder.decode(&buf[..n]);
                    if !self.post(text) {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(stream = self.stream.label(), "pipe read failed: {e}");
                    break;
                }
            }
        }

        tracing::debug!(stream = self.stream.label(), generation = self.generation, "reader finished");
        if self.open_readers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.running.store(false, Ordering::Release);
        }
    }

    /// Post a chunk; false once delivery has been cut off
    fn post(&self, text: String) -> bool {
        if !self.deliver.load(Ordering::Acquire) {
            return false;
        }
        if text.is_empty() {
            return true;
        }
        let event = ChannelEvent {
            generation: self.generation,
            stream: self.stream,
            text,
        };
        self.events.send(event).is_ok()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const WAIT: Duration = Duration::from_secs(5);

    fn channel() -> (ProcessChannel, UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ProcessChannel::new(tx), rx)
    }

    /// Collect text from `stream` until it contains `needle` or time runs out
    fn collect_until(
        rx: &mut UnboundedReceiver<ChannelEvent>,
        stream: OutputStream,
        needle: &str,
    ) -> String {
        let deadline = Instant::now() + WAIT;
        let mut text = String::new();
        while Instant::now() < deadline && !text.contains(needle) {
            match rx.try_recv() {
                Ok(event) if event.stream == stream => text.push_str(&event.text),
                Ok(_) => {}
                Err(_) => thread::sleep(Duration::from_millis(10)),
            }
        }
        text
    }

    fn wait_until_stopped(channel: &ProcessChannel) -> bool {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if !channel.is_running() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn start_rejects_empty_path() {
        let (mut channel, _rx) = channel();
        assert!(matches!(channel.start("  ", ""), Err(ChannelError::EmptyPath)));
        assert!(!channel.is_running());
    }

    #[test]
    fn start_reports_missing_executable() {
        let (mut channel, _rx) = channel();
        let result = channel.start("/nonexistent/replpane-test-binary", "");
        assert!(matches!(result, Err(ChannelError::Spawn { .. })));
        assert!(!channel.is_running());
        assert_eq!(channel.generation(), 0);
    }

    #[test]
    fn stdout_is_tagged_as_result() {
        let (mut channel, mut rx) = channel();
        channel.start("/bin/sh", r#"-c "echo 2""#).unwrap();
        let text = collect_until(&mut rx, OutputStream::Result, "2\n");
        assert_eq!(text, "2\n");
        channel.stop(Duration::from_secs(1));
    }

    #[test]
    fn stderr_is_tagged_as_error() {
        let (mut channel, mut rx) = channel();
        channel
            .start("/bin/sh", r#"-c "echo 'error: syntax' 1>&2""#)
            .unwrap();
        let text = collect_until(&mut rx, OutputStream::Error, "error: syntax\n");
        assert_eq!(text, "error: syntax\n");
        channel.stop(Duration::from_secs(1));
    }

    #[test]
    fn write_reaches_child_stdin() {
        let (mut channel, mut rx) = channel();
        channel.start("cat", "").unwrap();
        assert!(channel.is_running());

        channel.write(b"1+1;;\n").unwrap();
        let text = collect_until(&mut rx, OutputStream::Result, "1+1;;\n");
        assert_eq!(text, "1+1;;\n");

        channel.stop(Duration::from_secs(1));
        assert!(!channel.is_running());
    }

    #[test]
    fn write_when_not_running_is_rejected() {
        let (mut channel, _rx) = channel();
        assert!(matches!(channel.write(b"x"), Err(ChannelError::NotRunning)));
    }

    #[test]
    fn stop_closes_stdin_for_graceful_exit() {
        let (mut channel, _rx) = channel();
        channel.start("cat", "").unwrap();
        channel.stop(Duration::from_secs(2));
        assert!(!channel.is_running());
    }

    #[test]
    fn stop_kills_child_that_ignores_eof() {
        let (mut channel, _rx) = channel();
        channel.start("/bin/sh", r#"-c "exec sleep 30""#).unwrap();
        let started = Instant::now();
        channel.stop(Duration::from_millis(50));
        assert!(!channel.is_running());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut channel, _rx) = channel();
        channel.stop(Duration::ZERO);
        channel.start("cat", "").unwrap();
        channel.stop(Duration::ZERO);
        channel.stop(Duration::ZERO);
        assert!(!channel.is_running());
        assert!(matches!(channel.write(b"x"), Err(ChannelError::NotRunning)));
    }

    #[test]
    fn no_events_after_stop_returns() {
        let (mut channel, mut rx) = channel();
        channel.start("/bin/sh", r#"-c "while true; do echo tick; done""#).unwrap();
        collect_until(&mut rx, OutputStream::Result, "tick");
        channel.stop(Duration::ZERO);

        // Drain whatever was queued before stop, then nothing more may arrive
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(100));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn running_drops_when_child_exits_on_its_own() {
        let (mut channel, mut rx) = channel();
        channel.start("/bin/sh", r#"-c "echo bye""#).unwrap();
        collect_until(&mut rx, OutputStream::Result, "bye");
        assert!(wait_until_stopped(&channel));
        channel.stop(Duration::ZERO);
    }

    #[test]
    fn restart_bumps_generation() {
        let (mut channel, mut rx) = channel();
        channel.start("cat", "").unwrap();
        assert_eq!(channel.generation(), 1);
        channel.start("cat", "").unwrap();
        assert_eq!(channel.generation(), 2);

        channel.write(b"again\n").unwrap();
        let deadline = Instant::now() + WAIT;
        let event = loop {
            if let Ok(event) = rx.try_recv() {
                break Some(event);
            }
            if Instant::now() > deadline {
                break None;
            }
            thread::sleep(Duration::from_millis(10));
        };
        assert_eq!(event.map(|e| e.generation), Some(2));
        channel.stop(Duration::ZERO);
    }
}
