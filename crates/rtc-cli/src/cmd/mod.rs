pub mod comment;
pub mod subscriber;
pub mod workflow;

use rtc_core::RtcError;

use crate::output::{CliError, OutputMode, render_error};

/// Report a library error on stderr and hand it back for the exit status.
pub fn fail(output: OutputMode, err: RtcError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(&err)) {
        tracing::warn!("failed to render error: {render_err}");
    }
    anyhow::Error::new(err)
}
