//! Interactive session.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use remote_repl_client::ClientConfig;
use remote_repl_core::{ExecOutcome, ExecResult, Instruction, OutputStream};
use remote_repl_session::{ReplError, ReplSession};
use remote_repl_transport::Transport;
use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{account::require_client, cli::ReplArgs};

pub async fn run(config: &ClientConfig, args: ReplArgs) -> Result<()> {
    let client = require_client(config)?;
    let machine_name = args.machine.unwrap_or_default();
    let mut session = client
        .repl(machine_name)
        .await
        .context("failed to open REPL session")?;

    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    loop {
        let prompt = format!("{}> ", session.machine_name());
        let line = match tokio::task::block_in_place(|| editor.readline(&prompt)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(anyhow!("failed to read input: {error}")),
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Err(error) = editor.add_history_entry(line.as_str()) {
            tracing::debug!(%error, "history not updated");
        }

        let mut instruction = Instruction::new(line);
        if let Some(timeout) = args.timeout_seconds {
            instruction = instruction.with_timeout(timeout);
        }

        match execute(&mut session, instruction, &mut io::stdout(), &mut io::stderr()).await {
            Ok(()) => {}
            Err(ReplError::ReplProtocol { code }) => eprintln!("error: {code}"),
            Err(error) => return Err(error.into()),
        }
    }

    session.close().await.context("failed to close session")?;
    Ok(())
}

/// Run one instruction, streaming its output and printing the result.
async fn execute<T: Transport>(
    session: &mut ReplSession<T>,
    instruction: Instruction,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<(), ReplError> {
    let mut handle = session.submit_instruction(instruction).await?;

    {
        let mut output = std::pin::pin!(handle.output_stream());
        while let Some(chunk) = output.next().await {
            let chunk = chunk?;
            let sink: &mut dyn Write = match chunk.stream() {
                OutputStream::Stdout => &mut *stdout,
                OutputStream::Stderr => &mut *stderr,
            };
            // Losing terminal output is not a session failure.
            let _ = writeln!(sink, "{}", chunk.data());
        }
    }

    let result = handle.result().await?;
    if let Err(error) = print_result(&result, stdout, stderr) {
        tracing::debug!(%error, "result not printed");
    }
    Ok(())
}

fn print_result(result: &ExecResult, stdout: &mut impl Write, stderr: &mut impl Write) -> io::Result<()> {
    match result.outcome() {
        ExecOutcome::Value { value: Some(value), .. } => writeln!(stdout, "{value}"),
        ExecOutcome::Value { value: None, data: Some(data) } => writeln!(stdout, "{data}"),
        ExecOutcome::Value { value: None, data: None } => Ok(()),
        ExecOutcome::Error { error } => writeln!(stderr, "{error}"),
        ExecOutcome::Raw(raw) if raw.is_null() => Ok(()),
        ExecOutcome::Raw(raw) => writeln!(stdout, "{raw}"),
    }
}
