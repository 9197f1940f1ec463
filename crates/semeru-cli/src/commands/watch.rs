//! Watch command
//!
//! Runs the poll loop until Ctrl-C, or until the target date shows up
//! (`--stop-when-listed`) or opens (`--stop-when-available`).

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use semeru_core::{EventCallback, PollEvent, PollLoop, SlotEvent};

use super::{Context, TargetArgs};
use crate::output::{print_info, OutputFormat, Reporter};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Exit after the first event showing the slot as available
    #[arg(long)]
    pub stop_when_available: bool,

    /// Exit as soon as the target date is listed, whatever its status
    #[arg(long)]
    pub stop_when_listed: bool,

    /// Also report cycles where nothing changed
    #[arg(long)]
    pub emit_unchanged: bool,
}

/// When a slot event should end the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopRule {
    Never,
    Listed,
    Available,
}

impl StopRule {
    fn from_args(args: &WatchArgs) -> Self {
        if args.stop_when_listed {
            StopRule::Listed
        } else if args.stop_when_available {
            StopRule::Available
        } else {
            StopRule::Never
        }
    }

    fn is_met(self, event: &SlotEvent) -> bool {
        match self {
            StopRule::Never => false,
            StopRule::Listed => true,
            StopRule::Available => event.slot.is_available(),
        }
    }
}

pub async fn execute(ctx: &Context, args: WatchArgs, cancel: CancellationToken) -> Result<()> {
    let config = args.target.poll_config(args.emit_unchanged)?;
    let client = args.target.client(&config)?;

    if ctx.format == OutputFormat::Text {
        print_info(
            &format!(
                "Watching {} on {} (every {}s, Ctrl-C to stop)",
                config.target,
                client.config().base_url,
                config.interval.as_secs()
            ),
            ctx.quiet,
        );
    }

    let reporter = Reporter::new(ctx.format, ctx.quiet);
    let stop_rule = StopRule::from_args(&args);
    let stop = cancel.clone();
    let on_event: EventCallback = Box::new(move |event: &PollEvent| {
        reporter.report(event);
        if let Some(slot_event) = event.as_slot() {
            if stop_rule.is_met(slot_event) {
                log::info!("[cli] {} reached, stopping", slot_event.slot.status);
                stop.cancel();
            }
        }
    });

    let mut poller = PollLoop::new(client, config, on_event)?;
    poller.run(cancel).await;
    Ok(())
}
