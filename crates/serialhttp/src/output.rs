use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serialhttp_bridge::Reply;

const REPLY_SCHEMA_ID: &str = "https://schemas.3leaps.dev/serialhttp/cli/v1/reply.schema.json";

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    schema_id: &'a str,
    endpoint: &'a str,
    status: &'a str,
    size: usize,
    body: Option<String>,
    timestamp: String,
}

pub fn print_reply(reply: &Reply, endpoint: &str, format: OutputFormat) {
    let (status, body) = match reply {
        Reply::Body(body) => ("reply", Some(body.as_ref())),
        Reply::NoData => ("no-data", None),
    };
    let size = body.map_or(0, <[u8]>::len);

    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                schema_id: REPLY_SCHEMA_ID,
                endpoint,
                status,
                size,
                body: body.map(body_preview),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ENDPOINT", "STATUS", "SIZE", "BODY"])
                .add_row(vec![
                    endpoint.to_string(),
                    status.to_string(),
                    size.to_string(),
                    body.map(body_preview).unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match body {
            Some(body) => println!(
                "endpoint={endpoint} status={status} size={size} body={}",
                body_preview(body)
            ),
            None => println!("endpoint={endpoint} status={status}"),
        },
        OutputFormat::Raw => {
            if let Some(body) = body {
                print_raw(body);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("hex:{}", hex::encode(body)),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
