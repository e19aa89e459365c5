//! Workflow lookups: `rtc actions`, `rtc action` and `rtc states`.

use crate::cmd::fail;
use crate::output::{OutputMode, render};
use clap::Args;
use rtc_core::RtcClient;
use rtc_core::model::{Action, State};
use rtc_core::transport::Transport;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// Work item id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    /// Work item id.
    pub id: String,

    /// Exact action title, e.g. "Resolve".
    pub name: String,
}

fn write_action(action: &Action, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}  {}",
        action.title,
        action.identifier.as_deref().unwrap_or("-"),
        action.url
    )
}

fn write_state(state: &State, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}  {}",
        state.title,
        state.group.as_deref().unwrap_or("-"),
        state.url
    )
}

pub fn run_actions<T: Transport>(
    args: &WorkflowArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let actions = client
        .get_workitem(&args.id)
        .and_then(|item| item.get_actions())
        .map_err(|e| fail(output, e))?;

    render(output, &actions, |rows, w| {
        for action in rows {
            write_action(action, w)?;
        }
        Ok(())
    })
}

pub fn run_action<T: Transport>(
    args: &ActionArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let action = client
        .get_workitem(&args.id)
        .and_then(|item| item.get_action(&args.name))
        .map_err(|e| fail(output, e))?;

    render(output, &action, |a, w| write_action(a, w))
}

pub fn run_states<T: Transport>(
    args: &WorkflowArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let states = client
        .get_workitem(&args.id)
        .and_then(|item| item.get_states())
        .map_err(|e| fail(output, e))?;

    render(output, &states, |rows, w| {
        for state in rows {
            write_state(state, w)?;
        }
        Ok(())
    })
}
