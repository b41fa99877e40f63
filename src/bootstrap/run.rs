//! Line-oriented terminal host for the tour.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::debug;

use tg_core::{TourEvent, UserLevel};

use super::wiring::TourHost;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Start(Option<String>),
    Resume,
    Next,
    Previous,
    Skip,
    Finish,
    Reset,
    GoTo(String),
    Level(UserLevel),
    Connect,
    Disconnect,
    Route(Option<String>),
    Set(String, serde_json::Value),
    Status,
    Steps,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  start [step]   resume         next           prev
  skip           finish         reset          goto <step>
  level <beginner|intermediate|expert>
  connect        disconnect     route <path|->  set <field> <value>
  status         steps          help           quit";

pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".into());
    };
    let arg = words.next();

    let command = match (verb, arg) {
        ("start", step) => ReplCommand::Start(step.map(str::to_owned)),
        ("resume", None) => ReplCommand::Resume,
        ("next" | "n", None) => ReplCommand::Next,
        ("prev" | "p", None) => ReplCommand::Previous,
        ("skip", None) => ReplCommand::Skip,
        ("finish", None) => ReplCommand::Finish,
        ("reset", None) => ReplCommand::Reset,
        ("goto", Some(step)) => ReplCommand::GoTo(step.to_owned()),
        ("level", Some(level)) => ReplCommand::Level(level.parse().map_err(|_| {
            format!("unknown level '{level}', expected beginner, intermediate or expert")
        })?),
        ("connect", None) => ReplCommand::Connect,
        ("disconnect", None) => ReplCommand::Disconnect,
        ("route", Some("-")) => ReplCommand::Route(None),
        ("route", Some(route)) => ReplCommand::Route(Some(route.to_owned())),
        ("set", Some(field)) => {
            let raw = words.collect::<Vec<_>>().join(" ");
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            ReplCommand::Set(field.to_owned(), value)
        }
        ("status", None) => ReplCommand::Status,
        ("steps", None) => ReplCommand::Steps,
        ("help" | "?", None) => ReplCommand::Help,
        ("quit" | "exit" | "q", None) => ReplCommand::Quit,
        _ => return Err(format!("unrecognized command: {}", line.trim())),
    };
    Ok(command)
}

/// Read commands from `input` until EOF or `quit`, rendering to `output`.
pub fn run_repl<R: BufRead, W: Write>(host: &mut TourHost, input: R, mut output: W) -> Result<()> {
    let outbox: Arc<Mutex<Vec<TourEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = outbox.clone();
    let subscription = host.engine.subscribe(move |event| {
        sink.lock()
            .map_err(|_| anyhow::anyhow!("renderer outbox poisoned"))?
            .push(event.clone());
        Ok(())
    });

    writeln!(output, "{HELP}")?;
    render_step(host, &mut output)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "? {message}")?;
                continue;
            }
        };
        debug!(?command, "repl command");
        if command == ReplCommand::Quit {
            break;
        }

        apply(host, command, &mut output)?;

        let events: Vec<TourEvent> = match outbox.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        let mut changed = false;
        for event in &events {
            match event {
                TourEvent::Nudge { hint, .. } => {
                    writeln!(output, "! {}", hint.as_deref().unwrap_or("finish this step first"))?
                }
                TourEvent::Advisory { hint, .. } => {
                    writeln!(output, "~ {}", hint.as_deref().unwrap_or("this step looks unfinished"))?
                }
                TourEvent::StateChanged(_) => changed = true,
            }
        }
        if changed {
            render_step(host, &mut output)?;
        }
    }

    subscription.unsubscribe();
    host.engine.teardown();
    Ok(())
}

fn apply<W: Write>(host: &mut TourHost, command: ReplCommand, output: &mut W) -> Result<()> {
    let engine = &mut host.engine;
    match command {
        ReplCommand::Start(step) => {
            if let Err(err) = engine.start(step.as_deref()) {
                writeln!(output, "? {err}")?;
            }
        }
        ReplCommand::Resume => {
            if let Err(err) = engine.resume() {
                writeln!(output, "? {err}")?;
            }
        }
        ReplCommand::Next => {
            engine.next();
        }
        ReplCommand::Previous => engine.previous(),
        ReplCommand::Skip => engine.skip(),
        ReplCommand::Finish => engine.finish(),
        ReplCommand::Reset => engine.reset(),
        ReplCommand::GoTo(step) => engine.go_to_step(&step),
        ReplCommand::Level(level) => engine.set_user_level(level),
        ReplCommand::Connect => engine.set_wallet_connected(true),
        ReplCommand::Disconnect => engine.set_wallet_connected(false),
        ReplCommand::Route(route) => engine.set_route(route),
        ReplCommand::Set(field, value) => engine.set_form_value(field, value),
        ReplCommand::Status => {
            let state = engine.state();
            writeln!(output, "{}", serde_json::to_string_pretty(&state)?)?;
            writeln!(
                output,
                "facts: wallet={} route={:?} form={}",
                engine.facts().is_wallet_connected,
                engine.facts().current_route,
                serde_json::to_string(&engine.facts().form_data)?
            )?;
        }
        ReplCommand::Steps => {
            let current = engine.state().current_step_id;
            for (index, step) in engine.steps().steps().iter().enumerate() {
                let marker = if current.as_deref() == Some(step.id.as_str()) {
                    '>'
                } else {
                    ' '
                };
                writeln!(output, "{marker} {}. {} ({})", index + 1, step.title, step.id)?;
            }
        }
        ReplCommand::Help => writeln!(output, "{HELP}")?,
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn render_step<W: Write>(host: &TourHost, output: &mut W) -> Result<()> {
    let engine = &host.engine;
    let Some(step) = engine.current_step().filter(|_| engine.is_active()) else {
        match engine.state().current_step_id {
            Some(id) => writeln!(output, "(tour paused at '{id}', type 'resume')")?,
            None => writeln!(output, "(tour idle, type 'start')")?,
        }
        return Ok(());
    };

    let position = engine.current_step_index().map(|index| index + 1).unwrap_or(0);
    let copy = step.copy_for(engine.state().user_level);
    writeln!(
        output,
        "[{position}/{} {:.0}%] {}",
        engine.total_steps(),
        engine.progress(),
        copy.title
    )?;
    writeln!(output, "  {}", copy.body)?;
    if let Some(extra) = copy.extra {
        writeln!(output, "  > {extra}")?;
    }

    if step.target.is_some() {
        match engine.current_target_element() {
            Some(element) => writeln!(output, "  @ {}", element.as_str())?,
            None => writeln!(output, "  @ (target not on this page)")?,
        }
    }
    if step.required_action {
        if let Some(hint) = &step.hint {
            writeln!(output, "  * {hint}")?;
        }
    }
    if step.skippable {
        writeln!(output, "  (skippable)")?;
    }
    Ok(())
}
