//! Action handlers.
//!
//! A handler observes every action the executor processes and, in apply
//! mode, decides whether the action's mutation goes ahead.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use tracing::debug;

use super::plan::{Action, ActionKind};

/// Answer to a per-action confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Perform the mutation.
    Approved,
    /// Skip this action's mutation and continue with the next one.
    Declined,
    /// Stop the run before this action.
    Quit,
}

/// Capability invoked by the executor for every action.
pub trait ActionHandler: Send {
    /// Observes one action. Called in every mode, before any mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler's output cannot be written.
    fn handle(&mut self, action: &Action) -> io::Result<()>;

    /// Gates the mutation of one action in apply mode.
    ///
    /// # Errors
    ///
    /// Returns an error if confirmation input cannot be obtained; the run
    /// is aborted.
    fn confirm(&mut self, _action: &Action) -> io::Result<Confirmation> {
        Ok(Confirmation::Approved)
    }
}

/// Formats the report line for an action (without trailing newline).
#[must_use]
pub fn report_line(action: &Action) -> String {
    match action.kind() {
        ActionKind::Create => format!("CREATE- key: {}", action.key()),
        ActionKind::Delete => format!("DELETE- key: {}", action.key()),
        ActionKind::SetValue => {
            let mut line = format!(
                "VALUE- key: {} value: {}",
                action.key(),
                action.new_value().unwrap_or_default()
            );
            if let Some(old) = action.old_value().filter(|old| !old.is_empty()) {
                line.push_str(" old: ");
                line.push_str(old);
            }
            line
        }
    }
}

/// Prints one line per action; performs no mutation itself.
#[derive(Debug)]
pub struct ReportingHandler<W> {
    out: W,
}

impl ReportingHandler<Stdout> {
    /// A reporting handler writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ReportingHandler<W> {
    /// A reporting handler writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ActionHandler for ReportingHandler<W> {
    fn handle(&mut self, action: &Action) -> io::Result<()> {
        writeln!(self.out, "{}", report_line(action))?;
        self.out.flush()
    }
}

/// Produces no output and approves every action.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentHandler;

impl ActionHandler for SilentHandler {
    fn handle(&mut self, action: &Action) -> io::Result<()> {
        debug!("{}", report_line(action));
        Ok(())
    }
}

/// Reports each action and asks for confirmation before applying it.
///
/// `y`/`yes` approves, `q`/`quit` stops the run, anything else declines.
/// End of input is treated as an input failure.
#[derive(Debug)]
pub struct InteractiveHandler<R, W> {
    input: R,
    out: W,
}

impl InteractiveHandler<BufReader<Stdin>, Stdout> {
    /// An interactive handler on standard input and output.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> InteractiveHandler<R, W> {
    /// An interactive handler reading answers from `input`.
    #[must_use]
    pub const fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Returns the underlying writer.
    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<R: BufRead + Send, W: Write + Send> ActionHandler for InteractiveHandler<R, W> {
    fn handle(&mut self, action: &Action) -> io::Result<()> {
        writeln!(self.out, "{}", report_line(action))?;
        self.out.flush()
    }

    fn confirm(&mut self, action: &Action) -> io::Result<Confirmation> {
        write!(self.out, "Apply {}? [y/N/q]: ", action.key())?;
        self.out.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input while waiting for confirmation",
            ));
        }

        let answer = answer.trim().to_ascii_lowercase();
        Ok(match answer.as_str() {
            "y" | "yes" => Confirmation::Approved,
            "q" | "quit" => Confirmation::Quit,
            _ => Confirmation::Declined,
        })
    }
}
