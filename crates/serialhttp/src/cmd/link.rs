use std::time::Duration;

use serialhttp_bridge::{decode_value, Bridge, BridgeConfig, ResponseFilter};
use serialhttp_frame::FrameConfig;
use serialhttp_transport::{Endpoint, Link, LinkOptions};
use tracing::info;

use crate::cmd::LinkArgs;
use crate::exit::{bridge_error, frame_error, transport_error, CliError, CliResult, USAGE};

/// Validate the link settings, open the endpoint and build a bridge over it.
pub fn open_bridge(args: &LinkArgs) -> CliResult<Bridge> {
    let config = bridge_config(args)?;
    let endpoint: Endpoint = args
        .endpoint
        .parse()
        .map_err(|err| transport_error("invalid endpoint", err))?;
    let options = LinkOptions {
        poll_retries: args.poll_retries,
    };
    let link = Link::open(&endpoint, &options)
        .map_err(|err| transport_error(&format!("open {endpoint} failed"), err))?;

    info!(
        %endpoint,
        timeout_ms = config.frame.total_timeout().as_millis() as u64,
        filtered = config.filter.is_some(),
        "bridge ready"
    );
    Ok(Bridge::new(link, config))
}

/// Build the exchange configuration without touching the endpoint.
pub fn bridge_config(args: &LinkArgs) -> CliResult<BridgeConfig> {
    let query = decode_value(&args.query).map_err(|err| bridge_error("--query", err))?;
    let header = decode_value(&args.header).map_err(|err| bridge_error("--header", err))?;
    let terminator =
        decode_value(&args.terminator).map_err(|err| bridge_error("--terminator", err))?;
    let timeout = parse_duration(&args.timeout)?;

    let frame = FrameConfig::with_timeout(header, terminator, timeout)
        .map_err(|err| frame_error("invalid frame delimiters", err))?;

    let filter = args
        .response_pattern
        .as_deref()
        .map(|pattern| ResponseFilter::new(pattern, args.response_replacement.clone()))
        .transpose()
        .map_err(|err| bridge_error("--response-pattern", err))?;

    Ok(BridgeConfig {
        query,
        frame,
        filter,
    })
}

/// Parse `500ms`, `5s`, or a bare number of milliseconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(header: &str, terminator: &str) -> LinkArgs {
        LinkArgs {
            endpoint: "tcp://127.0.0.1:1".to_string(),
            query: "hex:52454144".to_string(),
            header: header.to_string(),
            terminator: terminator.to_string(),
            timeout: "300ms".to_string(),
            poll_retries: 5,
            response_pattern: None,
            response_replacement: None,
        }
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("750").unwrap(), Duration::from_millis(750));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("bad").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("-5ms").unwrap_err().code, USAGE);
    }

    #[test]
    fn config_decodes_hex_values() {
        let config = bridge_config(&args("hex:02", "hex:03")).unwrap();
        assert_eq!(config.query.as_ref(), b"READ");
        assert_eq!(config.frame.header(), b"\x02");
        assert_eq!(config.frame.terminator(), b"\x03");
        assert_eq!(config.frame.total_timeout(), Duration::from_millis(300));
        assert!(config.filter.is_none());
    }

    #[test]
    fn empty_delimiters_are_usage_errors() {
        assert_eq!(bridge_config(&args("", ">")).unwrap_err().code, USAGE);
        assert_eq!(bridge_config(&args("<", "")).unwrap_err().code, USAGE);
    }

    #[test]
    fn bad_hex_and_bad_pattern_are_usage_errors() {
        assert_eq!(bridge_config(&args("hex:0", ">")).unwrap_err().code, USAGE);

        let mut bad = args("<", ">");
        bad.response_pattern = Some("([".to_string());
        assert_eq!(bridge_config(&bad).unwrap_err().code, USAGE);
    }

    #[test]
    fn malformed_endpoint_fails_before_opening() {
        let mut bad = args("<", ">");
        bad.endpoint = "tcp://no-port".to_string();
        assert_eq!(open_bridge(&bad).unwrap_err().code, USAGE);
    }
}
