//! `rtc subscribe`, `rtc unsubscribe` and `rtc subscribers`.

use crate::cmd::fail;
use crate::output::{OutputMode, render};
use clap::Args;
use rtc_core::model::Member;
use rtc_core::transport::Transport;
use rtc_core::{MutationOutcome, RtcClient};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Work item id.
    pub id: String,

    /// Email addresses to subscribe.
    #[arg(required = true, num_args = 1..)]
    pub emails: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SubscribersArgs {
    /// Work item id.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct SubscriptionOutput<'a> {
    ok: bool,
    workitem: &'a str,
    action: &'static str,
    #[serde(flatten)]
    outcome: &'a MutationOutcome,
}

fn write_outcome(output: &SubscriptionOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    let (done, already) = match output.action {
        "subscribe" => ("subscribed", "already subscribed"),
        _ => ("unsubscribed", "not subscribed"),
    };
    for member in &output.outcome.changed {
        writeln!(w, "✓ {}: {done} {}", output.workitem, member.email)?;
    }
    for member in &output.outcome.unchanged {
        writeln!(w, "{}: {} {already}", output.workitem, member.email)?;
    }
    Ok(())
}

fn write_member(member: &Member, w: &mut dyn Write) -> io::Result<()> {
    match &member.name {
        Some(name) => writeln!(w, "{}  {}  {name}", member.email, member.url),
        None => writeln!(w, "{}  {}", member.email, member.url),
    }
}

pub fn run_subscribe<T: Transport>(
    args: &SubscribeArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let outcome = client
        .workitem(&args.id)
        .add_subscribers(&args.emails)
        .map_err(|e| fail(output, e))?;

    let result = SubscriptionOutput {
        ok: true,
        workitem: &args.id,
        action: "subscribe",
        outcome: &outcome,
    };
    render(output, &result, |r, w| write_outcome(r, w))
}

pub fn run_unsubscribe<T: Transport>(
    args: &SubscribeArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let outcome = client
        .workitem(&args.id)
        .remove_subscribers(&args.emails)
        .map_err(|e| fail(output, e))?;

    let result = SubscriptionOutput {
        ok: true,
        workitem: &args.id,
        action: "unsubscribe",
        outcome: &outcome,
    };
    render(output, &result, |r, w| write_outcome(r, w))
}

pub fn run_subscribers<T: Transport>(
    args: &SubscribersArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let members = client
        .workitem(&args.id)
        .get_subscribers()
        .map_err(|e| fail(output, e))?;

    render(output, &members, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "No subscribers on {}", args.id);
        }
        for member in rows {
            write_member(member, w)?;
        }
        Ok(())
    })
}
