//! GitHub Actions workflow commands.
//!
//! See <https://docs.github.com/en/actions/using-workflows/workflow-commands-for-github-actions>.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn command(name: &str, message: &str) -> String {
    format!("::{}::{}", name, escape_data(message))
}

pub fn notice(message: &str) {
    println!("{}", command("notice", message));
}

pub fn group(name: &str) {
    println!("{}", command("group", name));
}

pub fn end_group() {
    println!("::endgroup::");
}

/// Appends an output to the file the runner exposes as `GITHUB_OUTPUT`.
/// Multi-line values use the `name<<delimiter` form.
pub fn set_output(output_file: &Path, name: &str, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    if !value.contains(['\n', '\r']) {
        return writeln!(file, "{}={}", name, value);
    }

    let mut delimiter = format!("ghadelimiter_{}", std::process::id());
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    writeln!(file, "{}<<{}\n{}\n{}", name, delimiter, value, delimiter)
}

/// Turns warnings and errors into workflow annotations,
/// so they show up on the run summary.
#[derive(Clone)]
pub struct WorkflowCommands<W = fn() -> io::Stdout> {
    make_writer: W,
}

impl WorkflowCommands {
    pub fn stdout() -> Self {
        Self {
            make_writer: io::stdout,
        }
    }
}

impl<W> WorkflowCommands<W>
where
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    pub fn with_writer(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> tracing_subscriber::Layer<S> for WorkflowCommands<W>
where
    S: Subscriber,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let name = match *event.metadata().level() {
            Level::ERROR => "error",
            Level::WARN => "warning",
            _ => return,
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut writer = self.make_writer.make_writer();
        // Nowhere left to report a failing stdout
        let _ = writeln!(writer, "{}", command(name, &visitor.to_string()));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl fmt::Display for MessageVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
