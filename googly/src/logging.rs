use std::io::{self, Write};
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging to stdout and mirror every line onto the provided
/// broadcast channel, which feeds the `/log` socket.
pub fn init(tx: broadcast::Sender<String>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(move || TeeWriter {
            stdout: io::stdout(),
            tx: tx.clone(),
        })
        .init();
}

/// Writer that duplicates all output to a broadcast channel.
struct TeeWriter {
    stdout: io::Stdout,
    tx: broadcast::Sender<String>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.stdout.write(buf)?;
        if let Ok(s) = std::str::from_utf8(buf) {
            let _ = self.tx.send(s.trim_end().to_string());
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
