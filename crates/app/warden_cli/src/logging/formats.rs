use flexi_logger::DeferredNow;
use flexi_logger::style;
use log::{Level, Record};

/// `LEVEL message`, with the level colored; info lines print the bare message.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    if level == Level::Info {
        return write!(w, "{}", record.args());
    }
    write!(
        w,
        "{} {}",
        style(level).paint(level.as_str().to_lowercase()),
        record.args()
    )
}
