#![forbid(unsafe_code)]

use std::io::{self, Write};

use gemlikes_tools::{logging, respond, Program};

fn main() {
    logging::init();
    if let Err(err) = run() {
        tracing::error!("failed to write response: {err}");
    }
}

fn run() -> io::Result<()> {
    let out = respond(Program::AddComment);
    let mut stdout = io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()
}
