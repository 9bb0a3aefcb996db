//! The exeq runner.
//!
//! A high-level layer over process spawning. It gives the embedding
//! application one call that decides how a program is launched.
//!
//! Example:
//! ```no_run
//! use exeq::config::Config;
//! use exeq::core::{RunRequest, Runner};
//!
//! let mut run = Runner::new(Config::default(), None, Box::new(()), None);
//! run.execute(RunRequest::new().action("sleep 2").wait(true));
//! run.execute(RunRequest::new().action(vec!["ls".into(), "--help".into()]).flags("p"));
//! run.execute(RunRequest::new()); // logs an error, returns NoProcess
//! ```
//!
//! List of honored flags:
//! s: silent mode. output will be discarded.
//! f: fork the process.
//! p: redirect output to the pager.
//! c: run only the current file (not handled here).
//! w: wait for enter-press afterward.
//! r: run with root privilege (requires sudo or doas).
//! t: run in a new terminal window.
//! (An uppercase flag negates the respective lowercase flag.)

use crate::config::Config;
use crate::core::context::{Action, RunRequest};
use crate::core::lookup;
use crate::core::spawn::{self, SpawnOptions, StreamSpec};
use crate::core::terminal::Ui;
use crate::core::zombies::Zombies;

use std::io::{self, BufRead, PipeReader, Write};
use std::process::Child;

/// Message sink for user-visible runner errors, usually a status line.
pub type LogFn = Box<dyn Fn(&str)>;

/// Notifications the runner emits to its owning manager.
#[derive(Debug)]
pub enum Event<'a> {
    ExecuteBefore {
        options: &'a SpawnOptions,
        request: &'a RunRequest,
    },
    ExecuteAfter {
        options: &'a SpawnOptions,
        request: &'a RunRequest,
        error: Option<&'a io::Error>,
    },
}

impl Event<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ExecuteBefore { .. } => "runner.execute.before",
            Event::ExecuteAfter { .. } => "runner.execute.after",
        }
    }
}

/// Receiver for runner notifications, implemented by the owning manager.
pub trait EventSink {
    fn emit(&mut self, event: Event<'_>);
}

/// Sink for embeddings that have nothing to observe.
impl EventSink for () {
    fn emit(&mut self, _event: Event<'_>) {}
}

/// What one execute call produced.
///
/// `NoProcess` means a recoverable failure already went to the log sink.
/// A `Waited` child has exited; calling `wait()` on it again returns the
/// stored status. A `Detached` child lives on in the zombie set.
#[derive(Debug)]
pub enum Outcome {
    NoProcess,
    Waited(Child),
    Detached(u32),
}

/// The concrete launch decisions derived from one request's flags.
#[derive(Debug)]
struct Plan {
    action: Action,
    options: SpawnOptions,
    toggle_ui: bool,
    pipe_output: bool,
    wait: bool,
    wait_for_enter: bool,
    detached: bool,
}

/// Evaluate the flags of a squashed request into a [Plan].
///
/// Clause order matters: later flags read state earlier flags wrote (the
/// terminal flag must wrap the already-elevated action, the enter-press
/// flag must see whether piping cleared the wait intent). An `Err` carries
/// the message for the log sink and leaves the request untouched.
fn interpret(request: &RunRequest, config: &Config) -> Result<Plan, String> {
    let Some(mut action) = request.action.clone() else {
        return Err("No way of determining the action".to_owned());
    };

    let mut options = request.options.clone();
    if options.shell.is_none() {
        options.shell = Some(action.is_shell());
    }

    let mut toggle_ui = true;
    let mut pipe_output = false;
    let mut wait = request.wait.unwrap_or(true);
    let mut wait_for_enter = false;

    // p: redirect output to the pager
    if request.has_flag('p') {
        options.stdout = StreamSpec::Piped;
        options.stderr = StreamSpec::Stdout;
        toggle_ui = false;
        pipe_output = true;
        wait = false;
    }
    // s: silent mode, all streams to the null device
    if request.has_flag('s') {
        options.stdout = StreamSpec::Null;
        options.stderr = StreamSpec::Null;
        options.stdin = StreamSpec::Null;
        toggle_ui = false;
    }
    // f: fork the process
    if request.has_flag('f') {
        toggle_ui = false;
        wait = false;
    }
    // w: wait for enter-press afterward (pointless when piping or forking)
    if request.has_flag('w') && !pipe_output && wait {
        wait_for_enter = true;
    }
    // r: run with root privilege
    // TODO: a waited privileged child with piped output can fill the pipe
    // buffer before the pager starts reading; make 'r' work with 'p'.
    if request.has_flag('r') {
        let Some(tool) = lookup::find_privilege_tool(config.privilege_tool()) else {
            return Err("Cannot run with the 'r' flag, no privilege tool found".to_owned());
        };
        action = action.elevated(&tool, request.has_flag('f'));
        toggle_ui = true;
        wait = true;
    }
    // t: run in a new terminal window
    if request.has_flag('t') {
        if !lookup::has_display() {
            return Err("Cannot run with the 't' flag, no display found".to_owned());
        }
        let term = lookup::find_terminal_emulator(config.terminal());
        action = action.in_terminal(&term);
        toggle_ui = false;
        wait = false;
    }

    Ok(Plan {
        action,
        options,
        toggle_ui,
        pipe_output,
        wait,
        wait_for_enter,
        detached: request.has_flag('f') && !request.has_flag('r'),
    })
}

/// The process launcher of the embedding application.
///
/// Built once per UI session with its collaborators passed in explicitly:
/// the UI to suspend around foreground children (`None` for headless use),
/// the manager's event sink, and the message sink for recoverable errors.
/// No failure escapes [Runner::execute]; every error path ends in a log
/// line and [Outcome::NoProcess].
pub struct Runner {
    config: Config,
    ui: Option<Box<dyn Ui>>,
    events: Box<dyn EventSink>,
    log: Option<LogFn>,
    zombies: Zombies,
}

impl Runner {
    pub fn new(
        config: Config,
        ui: Option<Box<dyn Ui>>,
        events: Box<dyn EventSink>,
        log: Option<LogFn>,
    ) -> Self {
        Runner {
            config,
            ui,
            events,
            log,
            zombies: Zombies::new(),
        }
    }

    /// Children spawned without waiting; prune through [Zombies::reap].
    #[inline]
    pub fn zombies(&self) -> &Zombies {
        &self.zombies
    }

    #[inline]
    pub fn zombies_mut(&mut self) -> &mut Zombies {
        &mut self.zombies
    }

    fn log(&self, message: &str) {
        if let Some(log) = &self.log {
            log(message);
        }
    }

    fn fail(&self, message: &str) -> Outcome {
        self.log(message);
        Outcome::NoProcess
    }

    fn activate_ui(&mut self, value: bool) {
        let Some(ui) = self.ui.as_mut() else {
            return;
        };
        let result = if value { ui.initialize() } else { ui.suspend() };
        if let Err(err) = result {
            let verb = if value { "initialize" } else { "suspend" };
            self.log(&format!("Failed to {} UI ({})", verb, err));
        }
    }

    fn prompt_for_enter(&self) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "Press ENTER to continue");
        let _ = stdout.flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }

    /// Run a request in the way its flags specify.
    ///
    /// Returns [Outcome::NoProcess] if nothing could be done, the waited or
    /// detached child otherwise. When output is piped, the pager's outcome
    /// replaces this call's outcome.
    ///
    /// Piping is a flat two-step pipeline: the primary child is spawned
    /// first, then the pager runs as a second, ordinary step with the
    /// primary's output stream as its stdin.
    pub fn execute(&mut self, request: RunRequest) -> Outcome {
        let (outcome, pager_stdin, piped) = self.run_step(request, None);

        if piped
            && let Some(reader) = pager_stdin
            && !matches!(outcome, Outcome::NoProcess)
        {
            let pager = RunRequest::new()
                .action(self.config.pager().to_owned())
                .app("pager")
                .try_app_first(true);
            let (pager_outcome, _, _) = self.run_step(pager, Some(reader));
            return pager_outcome;
        }

        outcome
    }

    /// One interpret-suspend-spawn-resume round. Also returns the capture
    /// pipe's read end and whether the flags asked for pager piping.
    fn run_step(
        &mut self,
        mut request: RunRequest,
        stdin_pipe: Option<PipeReader>,
    ) -> (Outcome, Option<PipeReader>, bool) {
        request.squash();

        let plan = match interpret(&request, &self.config) {
            Ok(plan) => plan,
            Err(message) => return (self.fail(&message), None, false),
        };

        // The request carries the final action and options from here on,
        // so both notifications see what is actually spawned.
        request.action = Some(plan.action.clone());
        request.options = plan.options.clone();
        request.wait = Some(plan.wait);

        if plan.toggle_ui {
            self.activate_ui(false);
        }
        self.events.emit(Event::ExecuteBefore {
            options: &plan.options,
            request: &request,
        });

        let (outcome, pager_stdin, error) = self.spawn_and_settle(&plan, stdin_pipe);

        // Emitted and resumed on every path out of the spawn, including
        // failure, before any pager step runs.
        self.events.emit(Event::ExecuteAfter {
            options: &plan.options,
            request: &request,
            error: error.as_ref(),
        });
        if plan.toggle_ui {
            self.activate_ui(true);
        }

        (outcome, pager_stdin, plan.pipe_output)
    }

    /// Spawn the planned child and wait on it or register it, capturing
    /// rather than raising every error along the way.
    fn spawn_and_settle(
        &mut self,
        plan: &Plan,
        stdin_pipe: Option<PipeReader>,
    ) -> (Outcome, Option<PipeReader>, Option<io::Error>) {
        let (mut cmd, capture) =
            match spawn::prepare(&plan.action, &plan.options, plan.detached, stdin_pipe) {
                Ok(prepared) => prepared,
                Err(err) => {
                    self.log(&format!("Failed to run: {} ({})", plan.action, err));
                    return (Outcome::NoProcess, None, Some(err));
                }
            };

        let spawned = if plan.detached {
            spawn::spawn_detached(&mut cmd)
        } else {
            cmd.spawn()
        };
        // Dropping the command closes the parent's copies of the capture
        // pipe's write end; the pager would never see EOF otherwise.
        drop(cmd);

        match spawned {
            Err(err) => {
                self.log(&format!("Failed to run: {} ({})", plan.action, err));
                (Outcome::NoProcess, None, Some(err))
            }
            Ok(mut child) => {
                let mut error = None;
                let outcome = if plan.wait {
                    if let Err(err) = child.wait() {
                        self.log(&format!("Failed to wait on: {} ({})", plan.action, err));
                        error = Some(err);
                    }
                    Outcome::Waited(child)
                } else {
                    let pid = child.id();
                    self.zombies.register(child);
                    Outcome::Detached(pid)
                };
                if plan.wait_for_enter {
                    self.prompt_for_enter();
                }
                (outcome, capture, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    fn squashed(request: RunRequest) -> RunRequest {
        let mut request = request;
        request.squash();
        request
    }

    #[test]
    fn pipe_flag_clears_wait_and_ui_toggle() -> Result<(), Box<dyn std::error::Error>> {
        for flags in ["p", "pw", "ps"] {
            let request = squashed(RunRequest::new().action("ls").flags(flags));
            let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
            assert!(!plan.wait, "flags {:?}", flags);
            assert!(!plan.toggle_ui, "flags {:?}", flags);
            assert!(plan.pipe_output, "flags {:?}", flags);
            assert!(!plan.wait_for_enter, "flags {:?}", flags);
        }

        // The silent flag runs later and may rebind the captured streams;
        // on its own, p pipes stdout.
        let request = squashed(RunRequest::new().action("ls").flags("p"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert_eq!(plan.options.stdout, StreamSpec::Piped);
        Ok(())
    }

    #[test]
    fn pipe_flag_merges_stderr() -> Result<(), Box<dyn std::error::Error>> {
        let request = squashed(RunRequest::new().action("ls").flags("p"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert_eq!(plan.options.stderr, StreamSpec::Stdout);
        Ok(())
    }

    #[test]
    fn silent_flag_binds_null_streams() -> Result<(), Box<dyn std::error::Error>> {
        let request = squashed(RunRequest::new().action("ls").flags("s"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert_eq!(plan.options.stdout, StreamSpec::Null);
        assert_eq!(plan.options.stderr, StreamSpec::Null);
        assert_eq!(plan.options.stdin, StreamSpec::Null);
        assert!(!plan.toggle_ui);
        assert!(plan.wait);
        Ok(())
    }

    #[test]
    fn fork_flag_detaches_and_disarms_enter_press() -> Result<(), Box<dyn std::error::Error>> {
        let request = squashed(RunRequest::new().action("ls").flags("fw"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert!(plan.detached);
        assert!(!plan.wait);
        assert!(!plan.toggle_ui);
        assert!(!plan.wait_for_enter);
        Ok(())
    }

    #[test]
    fn enter_press_arms_only_while_waiting() -> Result<(), Box<dyn std::error::Error>> {
        let request = squashed(RunRequest::new().action("ls").flags("w"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert!(plan.wait_for_enter);

        let request = squashed(RunRequest::new().action("ls").flags("w").wait(false));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert!(!plan.wait_for_enter);
        Ok(())
    }

    #[test]
    fn missing_privilege_tool_fails_without_touching_the_action() {
        let config = Config::with_run_settings(
            "less",
            None,
            Some("definitely-not-a-real-binary-v9".to_owned()),
        );
        let request = squashed(RunRequest::new().action("mount /dev/sda1").flags("r"));
        let result = interpret(&request, &config);
        assert!(result.is_err());
        assert_eq!(
            request.get_action(),
            Some(&Action::Shell("mount /dev/sda1".into()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn privilege_flag_rewrites_the_action() -> Result<(), Box<dyn std::error::Error>> {
        // "sh" stands in for a real escalation tool; only the rewrite
        // mechanics are under test here.
        let config = Config::with_run_settings("less", None, Some("sh".to_owned()));

        let request = squashed(RunRequest::new().action("mount /dev/sda1").flags("r"));
        let plan = interpret(&request, &config).map_err(io::Error::other)?;
        assert_eq!(plan.action, Action::Shell("sh mount /dev/sda1".into()));
        assert!(plan.wait);
        assert!(plan.toggle_ui);
        assert!(!plan.detached);

        let request = squashed(RunRequest::new().action("mount /dev/sda1").flags("rf"));
        let plan = interpret(&request, &config).map_err(io::Error::other)?;
        assert_eq!(plan.action, Action::Shell("sh -b mount /dev/sda1".into()));
        assert!(plan.wait, "escalation overrides the fork's wait intent");
        assert!(!plan.detached);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn negated_fork_behaves_as_plain_privilege_run() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::with_run_settings("less", None, Some("sh".to_owned()));
        let request = squashed(RunRequest::new().action("mount /dev/sda1").flags("rfF"));
        assert_eq!(request.get_flags(), "r");

        let plan = interpret(&request, &config).map_err(io::Error::other)?;
        assert_eq!(plan.action, Action::Shell("sh mount /dev/sda1".into()));
        assert!(plan.wait);
        Ok(())
    }

    #[test]
    fn terminal_flag_without_display_fails_early() -> Result<(), Box<dyn std::error::Error>> {
        // Only meaningful on hosts without a graphical session.
        if lookup::has_display() {
            return Ok(());
        }
        let request = squashed(RunRequest::new().action("htop").flags("t"));
        let result = interpret(&request, &Config::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn unknown_flags_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let request = squashed(RunRequest::new().action("ls").flags("cxz"));
        let plan = interpret(&request, &Config::default()).map_err(io::Error::other)?;
        assert!(plan.wait);
        assert!(plan.toggle_ui);
        assert!(!plan.pipe_output);
        Ok(())
    }

    // Runner-level coordination tests

    #[derive(Default)]
    struct RecordingSink {
        seen: Rc<RefCell<Vec<(String, bool)>>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&mut self, event: Event<'_>) {
            let failed = matches!(event, Event::ExecuteAfter { error: Some(_), .. });
            self.seen.borrow_mut().push((event.name().to_owned(), failed));
        }
    }

    struct RecordingUi {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Ui for RecordingUi {
        fn initialize(&mut self) -> io::Result<()> {
            self.calls.borrow_mut().push("initialize");
            Ok(())
        }

        fn suspend(&mut self) -> io::Result<()> {
            self.calls.borrow_mut().push("suspend");
            Ok(())
        }
    }

    fn logging_runner(events: Box<dyn EventSink>) -> (Runner, Rc<RefCell<Vec<String>>>) {
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let log: LogFn = Box::new(move |msg| sink.borrow_mut().push(msg.to_owned()));
        let runner = Runner::new(Config::default(), None, events, Some(log));
        (runner, messages)
    }

    #[test]
    fn missing_action_is_logged_not_raised() {
        let (mut runner, messages) = logging_runner(Box::new(()));
        let outcome = runner.execute(RunRequest::new());
        assert!(matches!(outcome, Outcome::NoProcess));
        assert_eq!(messages.borrow().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn ui_is_suspended_and_resumed_around_a_waited_child()
    -> Result<(), Box<dyn std::error::Error>> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let ui = RecordingUi {
            calls: Rc::clone(&calls),
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingSink {
            seen: Rc::clone(&seen),
        };
        let mut runner = Runner::new(Config::default(), Some(Box::new(ui)), Box::new(sink), None);

        let outcome = runner.execute(RunRequest::new().action(vec!["true".to_owned()]));
        let Outcome::Waited(mut child) = outcome else {
            return Err("expected a waited child".into());
        };
        assert!(child.wait()?.success());

        assert_eq!(&*calls.borrow(), &["suspend", "initialize"]);
        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ("runner.execute.before".to_owned(), false));
        assert_eq!(events[1], ("runner.execute.after".to_owned(), false));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn spawn_failure_still_emits_the_after_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingSink {
            seen: Rc::clone(&seen),
        };
        let (mut runner, messages) = {
            let messages = Rc::new(RefCell::new(Vec::new()));
            let log_sink = Rc::clone(&messages);
            let log: LogFn = Box::new(move |msg| log_sink.borrow_mut().push(msg.to_owned()));
            (
                Runner::new(Config::default(), None, Box::new(sink), Some(log)),
                messages,
            )
        };

        let outcome = runner.execute(
            RunRequest::new().action(vec!["definitely-not-a-real-binary-v9".to_owned()]),
        );
        assert!(matches!(outcome, Outcome::NoProcess));
        assert!(!messages.borrow().is_empty());

        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ("runner.execute.after".to_owned(), true));
    }
}
