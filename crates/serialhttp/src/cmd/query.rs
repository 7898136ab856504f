use serialhttp_bridge::Reply;
use tokio_util::sync::CancellationToken;

use crate::cmd::link::open_bridge;
use crate::cmd::QueryArgs;
use crate::exit::{bridge_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: QueryArgs, format: OutputFormat) -> CliResult<i32> {
    let bridge = open_bridge(&args.link)?;

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let reply = bridge
        .exchange(&cancel)
        .map_err(|err| bridge_error("query failed", err))?;
    print_reply(&reply, &args.link.endpoint, format);

    Ok(match reply {
        Reply::Body(_) => SUCCESS,
        Reply::NoData => TIMEOUT,
    })
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
