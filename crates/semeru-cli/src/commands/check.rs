//! Check command
//!
//! One polling step, no retries. Prints the target slot, or the whole month
//! with `--all`. Ctrl-C abandons the request in flight.

use anyhow::{bail, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use semeru_core::{CapacitySlot, EventCallback, HttpSessionClient, PollEvent, PollLoop};

use super::{Context, TargetArgs};
use crate::output::{print_output, SlotRow};

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print every slot of the month instead of only the target
    #[arg(long)]
    pub all: bool,
}

pub async fn execute(ctx: &Context, args: CheckArgs, cancel: CancellationToken) -> Result<()> {
    let config = args.target.poll_config(false)?;
    let client = args.target.client(&config)?;
    let target = config.target;
    let year_month = config.query().year_month;

    // Results are printed below, not as events
    let on_event: EventCallback = Box::new(|_: &PollEvent| {});
    let mut poller = PollLoop::new(client, config, on_event)?;

    let slots = tokio::select! {
        biased;
        _ = cancel.cancelled() => bail!("interrupted"),
        slots = fetch(&mut poller, args.all) => slots?,
    };
    log::info!("[cli] {} slot(s) for {}", slots.len(), year_month);

    if !args.all && slots.is_empty() {
        bail!("{} is not listed in the {} capacity table", target, year_month);
    }
    let rows: Vec<SlotRow> = slots.iter().map(SlotRow::from).collect();
    print_output(&rows, ctx.format)
}

async fn fetch(
    poller: &mut PollLoop<HttpSessionClient>,
    all: bool,
) -> semeru_core::Result<Vec<CapacitySlot>> {
    if all {
        poller.fetch_slots().await
    } else {
        Ok(poller.poll_once().await?.into_iter().collect())
    }
}
