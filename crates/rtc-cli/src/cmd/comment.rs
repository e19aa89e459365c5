//! `rtc comment` and `rtc comments`: append to and read a work item's
//! comment thread.

use crate::cmd::fail;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_error};
use clap::{Args, Subcommand};
use rtc_core::RtcClient;
use rtc_core::model::Comment;
use rtc_core::transport::Transport;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    #[command(
        about = "Add a comment to a work item",
        after_help = "EXAMPLES:\n    # Add a progress note\n    rtc comment add 161 \"Investigating the timeout path\""
    )]
    Add(CommentAddArgs),

    #[command(
        about = "Show one comment by its position",
        after_help = "EXAMPLES:\n    # Show the first comment\n    rtc comment show 161 0"
    )]
    Show(CommentShowArgs),
}

#[derive(Args, Debug)]
pub struct CommentAddArgs {
    /// Work item id.
    pub id: String,

    /// Comment text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct CommentShowArgs {
    /// Work item id.
    pub id: String,

    /// Zero-based comment position.
    pub comment: String,
}

#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Work item id.
    pub id: String,
}

fn validate_comment_text(text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("comment text must not be empty");
    }

    if text
        .chars()
        .any(|ch| ch.is_control() && ch != '\n' && ch != '\t')
    {
        anyhow::bail!("comment text must not contain control characters");
    }

    Ok(())
}

fn write_comment_row(comment: &Comment, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}  {}  {}",
        comment.id,
        comment.created.as_deref().unwrap_or("-"),
        comment.creator.as_deref().unwrap_or("-"),
        comment.description.as_deref().unwrap_or_default()
    )
}

fn write_comment_pretty(comment: &Comment, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Comment {}", comment.id))?;
    pretty_kv(w, "URL", &comment.url)?;
    if let Some(creator) = &comment.creator {
        pretty_kv(w, "Creator", creator)?;
    }
    if let Some(created) = &comment.created {
        pretty_kv(w, "Created", created)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", comment.description.as_deref().unwrap_or_default())
}

pub fn run_comment<T: Transport>(
    args: &CommentArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    match &args.command {
        CommentCommand::Add(add) => run_comment_add(add, client, output),
        CommentCommand::Show(show) => run_comment_show(show, client, output),
    }
}

fn run_comment_add<T: Transport>(
    args: &CommentAddArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    if let Err(e) = validate_comment_text(&args.text) {
        let msg = e.to_string();
        render_error(
            output,
            &CliError::with_details(&msg, "Use plain UTF-8 text", "E1001"),
        )?;
        anyhow::bail!("{}", msg);
    }

    let comment = client
        .workitem(&args.id)
        .add_comment(&args.text)
        .map_err(|e| fail(output, e))?;

    render(output, &comment, |c, w| {
        writeln!(w, "✓ {}: comment {} added", args.id, c.id)
    })
}

fn run_comment_show<T: Transport>(
    args: &CommentShowArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let comment = client
        .workitem(&args.id)
        .get_comment_by_id(args.comment.as_str())
        .map_err(|e| fail(output, e))?;

    render(output, &comment, |c, w| {
        if output.is_pretty() {
            write_comment_pretty(c, w)
        } else {
            write_comment_row(c, w)
        }
    })
}

pub fn run_comments<T: Transport>(
    args: &CommentsArgs,
    client: &RtcClient<T>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let comments = client
        .workitem(&args.id)
        .get_comments()
        .map_err(|e| fail(output, e))?;

    render(output, &comments, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "No comments on {}", args.id);
        }
        for comment in rows {
            if output.is_pretty() {
                write_comment_pretty(comment, w)?;
                writeln!(w)?;
            } else {
                write_comment_row(comment, w)?;
            }
        }
        Ok(())
    })
}
