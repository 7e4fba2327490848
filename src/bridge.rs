//! JSON-lines transport between a dashboard and a [`Host`].
//!
//! One request per input line, one push per output line. Blank lines are
//! ignored. A line that does not decode is answered with an error
//! notification and the loop keeps going; only I/O failures end it.

use crate::host::{Host, Workbench};
use crate::message::{self, PushEnvelope};
use std::io::{self, BufRead, Write};

/// Serve requests from `input` until end of input.
pub fn serve<W, R, O>(host: &mut Host<W>, input: R, mut output: O) -> io::Result<()>
where
    W: Workbench,
    R: BufRead,
    O: Write,
{
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let pushes = match message::decode_request(line) {
            Ok(envelope) => host.handle(envelope),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting message");
                vec![host.reject(&e)]
            }
        };
        for push in &pushes {
            write_push(&mut output, push)?;
        }
        output.flush()?;
    }
    tracing::debug!("input closed, bridge stopping");
    Ok(())
}

fn write_push(output: &mut impl Write, push: &PushEnvelope) -> io::Result<()> {
    let line = message::encode(push).map_err(io::Error::other)?;
    writeln!(output, "{line}")
}
