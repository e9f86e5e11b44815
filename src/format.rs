use crate::record::{ErrorInfo, LogRecord};

/// Render a record into the exact line format stored by the remote service.
///
/// Layout: `{millis:03} | {LVL4} {ShortLogger} (thread): message`, where the
/// leading field is the sub-second millisecond component of the timestamp
/// (the full timestamp travels separately in the write entry), the level is
/// truncated to its first four characters and the logger name is stripped of
/// any package-style prefix.
pub fn render(record: &LogRecord) -> String {
    let level = record.level.as_str();
    let level = &level[..level.len().min(4)];
    let logger = short_logger_name(&record.logger);

    let mut out = format!(
        "{:03} | {} {} ({}): {}",
        record.timestamp.timestamp_subsec_millis(),
        level,
        logger,
        record.thread,
        record.message
    );

    if let Some(error) = &record.error {
        out.push('\n');
        out.push_str(&render_error(error));
    }

    out
}

fn short_logger_name(logger: &str) -> &str {
    match logger.rfind('.') {
        Some(idx) => &logger[idx + 1..],
        None => logger,
    }
}

fn render_error(error: &ErrorInfo) -> String {
    let mut out = format!("{}: {}", error.kind, error.message);
    for frame in &error.frames {
        out.push_str("\n\tat ");
        out.push_str(frame);
    }
    out
}
