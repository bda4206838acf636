//! Rendering of fingerprint results for the terminal.

use crate::config::OutputFormat;
use crate::streaming::frame::ChunkResult;
use serde_json::json;

/// Render the chunks of one input.
///
/// `name` is the input as given on the command line. Chunks without a
/// fingerprint are skipped. The result has no trailing newline and is empty
/// when nothing is left to print.
pub fn render(name: &str, chunks: &[ChunkResult], format: OutputFormat, chunked: bool) -> String {
    let usable = chunks.iter().filter(|chunk| chunk.has_fingerprint());

    let lines: Vec<String> = match format {
        OutputFormat::Plain => usable.map(|chunk| fingerprint(chunk).to_string()).collect(),
        OutputFormat::Json => usable
            .map(|chunk| {
                let mut value = json!({
                    "timestamp": chunk.timestamp,
                    "duration": chunk.duration,
                    "fingerprint": fingerprint(chunk),
                });
                if !chunked {
                    value["file"] = json!(name);
                }
                value.to_string()
            })
            .collect(),
        OutputFormat::Text if chunked => usable
            .map(|chunk| {
                format!(
                    "TIMESTAMP={:.2}\nDURATION={:.2}\nFINGERPRINT={}\n",
                    chunk.timestamp,
                    chunk.duration,
                    fingerprint(chunk)
                )
            })
            .collect(),
        OutputFormat::Text => usable
            .map(|chunk| {
                format!(
                    "FILE={}\nDURATION={}\nFINGERPRINT={}",
                    name,
                    chunk.duration as u64,
                    fingerprint(chunk)
                )
            })
            .collect(),
    };

    lines.join("\n").trim_end().to_string()
}

fn fingerprint(chunk: &ChunkResult) -> &str {
    chunk.fingerprint.as_deref().unwrap_or_default()
}
