mod cli;
mod printer;

use std::{
    io::{self, Read},
    sync::Arc,
};

use anyhow::{anyhow, bail, Result};
use is_terminal::IsTerminal;
use printer::ResultPrinter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use zeppelin_interpreters::{
    completion::LINE_SEPARATOR,
    springxd::{ResourceStatus, StatusHandle},
    Config, Interpreter, InterpreterContext, InterpreterGroup, InterpreterResult,
    SpringXdInterpreter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    // Load config, then apply --set overrides
    let mut cfg = match args.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    for (key, value) in args.overrides() {
        cfg.set(key, value);
    }

    let printer = ResultPrinter { color: io::stdout().is_terminal() };
    let group = InterpreterGroup::builtin();
    let ctx = InterpreterContext::new(args.note.clone(), args.paragraph.clone());

    match args.command {
        cli::Command::List => {
            println!("# properties file: {}", cfg.config_path.display());
            for entry in group.entries() {
                println!("%{}.{}", entry.group, entry.name);
                for p in &entry.properties {
                    let value = cfg.get(p.key).unwrap_or_default();
                    println!("  {:<32} {:<28} {}", p.key, value, p.description);
                }
            }
            Ok(())
        }
        cli::Command::Exec { interpreter, text } => {
            let text = match text {
                Some(t) => t,
                None => read_stdin()?,
            };
            if text.trim().is_empty() {
                bail!("Provide the paragraph text as an argument or via stdin");
            }
            let (interp, _) = create(&group, &interpreter, &cfg)?;
            interp.open().await;
            let result = run_cancellable(interp.as_ref(), &text, &ctx).await;
            printer.print(&result);
            interp.close().await;
            if result.is_success() {
                Ok(())
            } else {
                std::process::exit(1)
            }
        }
        cli::Command::Complete { interpreter, buffer, cursor } => {
            let (interp, _) = create(&group, &interpreter, &cfg)?;
            interp.open().await;
            let cursor = cursor.unwrap_or_else(|| buffer.chars().count());
            let suggestions = interp.completion(&buffer, cursor).await;
            printer.print_completions(suggestions.as_deref());
            interp.close().await;
            Ok(())
        }
        cli::Command::Repl { interpreter } => {
            let (interp, status) = create(&group, &interpreter, &cfg)?;
            interp.open().await;
            let outcome = repl(interp.as_ref(), status, ctx, &printer).await;
            interp.close().await;
            outcome
        }
    }
}

/// Builds the interpreter; SpringXD ones also hand back their status channel.
fn create(
    group: &InterpreterGroup,
    id: &str,
    cfg: &Config,
) -> Result<(Arc<dyn Interpreter>, Option<StatusHandle>)> {
    let entry = group
        .resolve(id)
        .ok_or_else(|| anyhow!("unknown interpreter: {} (try `zint list`)", id))?;

    let xd = match (entry.group, entry.name) {
        ("xd", "stream") => Some(SpringXdInterpreter::stream(cfg)),
        ("xd", "job") => Some(SpringXdInterpreter::job(cfg)),
        _ => None,
    };
    Ok(match xd {
        Some(xd) => {
            let status = xd.status_handle();
            (Arc::new(xd), Some(status))
        }
        None => (entry.create(cfg), None),
    })
}

/// Runs a paragraph; Ctrl-C cancels it and waits for the interpreter's answer.
async fn run_cancellable(
    interp: &dyn Interpreter,
    text: &str,
    ctx: &InterpreterContext,
) -> InterpreterResult {
    let run = interp.interpret(text, ctx);
    tokio::pin!(run);
    tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(paragraph = %ctx.paragraph_id, "cancel requested");
            interp.cancel(ctx).await;
            run.await
        }
    }
}

async fn repl(
    interp: &dyn Interpreter,
    status: Option<StatusHandle>,
    mut ctx: InterpreterContext,
    printer: &ResultPrinter,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut paragraph = String::new();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();

        if let Some(command) = trimmed.strip_prefix(':') {
            let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
            match name {
                "quit" | "q" => break,
                "paragraph" if !arg.trim().is_empty() => ctx.paragraph_id = arg.trim().to_string(),
                "note" if !arg.trim().is_empty() => ctx.note_id = arg.trim().to_string(),
                "destroy" | "status" => {
                    let value = if name == "destroy" { ResourceStatus::Destroyed.as_str() } else { arg.trim() };
                    match (&status, ResourceStatus::parse(value)) {
                        (Some(handle), Some(next)) => {
                            if !handle.set(&ctx, next) {
                                eprintln!("status watcher has stopped; {} was not applied", next.as_str());
                            }
                        }
                        (None, _) => eprintln!("this interpreter does not track resource status"),
                        (_, None) => eprintln!("unknown status: {} (DEPLOYED or DESTROYED)", value),
                    }
                }
                "complete" => {
                    let suggestions = interp.completion(arg, arg.chars().count()).await;
                    printer.print_completions(suggestions.as_deref());
                }
                _ => eprintln!("unknown command: :{}", name),
            }
            continue;
        }

        if trimmed.is_empty() {
            if !paragraph.trim().is_empty() {
                let result = run_cancellable(interp, &paragraph, &ctx).await;
                printer.print(&result);
            }
            paragraph.clear();
            continue;
        }

        if !paragraph.is_empty() {
            paragraph.push_str(LINE_SEPARATOR);
        }
        paragraph.push_str(&line);
    }

    if !paragraph.trim().is_empty() {
        let result = run_cancellable(interp, &paragraph, &ctx).await;
        printer.print(&result);
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    if !io::stdin().is_terminal() {
        io::stdin().read_to_string(&mut buf)?;
    }
    Ok(buf)
}
