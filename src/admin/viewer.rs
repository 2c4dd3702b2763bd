//! HTML rendering of the request log.
//!
//! Pure function of `(records, total, target)`; no state of its own.

use std::fmt::Write;

use crate::store::record::parse_headers;
use crate::store::{LogRecord, Payload};

const STYLE: &str = "body{font-family:sans-serif;margin:2em;background:#fafafa}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ddd;padding:6px;vertical-align:top;text-align:left}\
th{background:#333;color:#fff}\
pre{margin:0;white-space:pre-wrap;word-break:break-all;font-size:12px}\
.empty{color:#888;font-style:italic}\
button{padding:6px 14px;background:#c0392b;color:#fff;border:0;cursor:pointer}";

const SCRIPT: &str = "async function clearLogs(){\
if(!confirm('Delete all request logs?'))return;\
const r=await fetch('/log/delete',{method:'POST'});\
const j=await r.json();\
if(j.success){alert('Deleted '+j.deleted_count+' records');location.reload();}\
else{alert('Failed: '+j.error);}}";

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Pretty-printed structured payloads, literal text, or `(empty)`.
pub fn format_payload(payload: Option<&Payload>) -> String {
    match payload {
        Some(Payload::Json(value)) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Some(Payload::Text(text)) if !text.is_empty() => text.clone(),
        _ => "(empty)".to_string(),
    }
}

/// One `name: value` line per header; unparsable text is shown as-is.
pub fn format_headers(headers: &str) -> String {
    match parse_headers(headers) {
        Some(pairs) => pairs
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n"),
        None => headers.to_string(),
    }
}

/// Render the log viewer page.
pub fn render_log_page(records: &[LogRecord], total: u64, target: &str) -> String {
    let mut html = String::with_capacity(4096 + records.len() * 512);

    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Request Log</title>\
         <style>{}</style><script>{}</script></head><body>\
         <h1>Request Log</h1>\
         <p>Proxy: <code>{}</code></p>\
         <p>Total records: <strong>{}</strong> (showing {})</p>\
         <p><button onclick=\"clearLogs()\">Delete all logs</button></p>",
        STYLE,
        SCRIPT,
        escape_html(target),
        total,
        records.len(),
    );

    if records.is_empty() {
        html.push_str("<p class=\"empty\">No requests logged yet.</p></body></html>");
        return html;
    }

    html.push_str(
        "<table><thead><tr><th>ID</th><th>Timestamp</th><th>Endpoint</th>\
         <th>Remote address</th><th>User agent</th><th>Payload</th><th>Headers</th>\
         </tr></thead><tbody>",
    );

    for record in records {
        let payload_class = if record.payload.is_none() { " class=\"empty\"" } else { "" };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><pre{}>{}</pre></td><td><pre>{}</pre></td></tr>",
            record.id,
            escape_html(&record.timestamp),
            escape_html(&record.endpoint),
            escape_html(&record.remote_addr),
            escape_html(record.user_agent.as_deref().unwrap_or("-")),
            payload_class,
            escape_html(&format_payload(record.payload.as_ref())),
            escape_html(&format_headers(&record.headers)),
        );
    }

    html.push_str("</tbody></table></body></html>");
    html
}
