use log::LevelFilter;
use std::io::Write;

/// Target for records emitted by the binary itself
pub(crate) const TARGET: &str = "nbridge::cli";

pub(crate) fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the stderr logger for the `nbridge` targets
pub(crate) fn init(verbose: u8) {
    // Ignore a logger that is already installed
    let _ = env_logger::Builder::new()
        .filter_module("nbridge", level_for(verbose))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            if record.level() <= log::Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                let mut target = record.target().to_string();
                if let Some(line_no) = record.line() {
                    target.push(':');
                    target.push_str(&line_no.to_string());
                }
                writeln!(buf, "{} - {} - {}", record.level(), target, record.args())
            }
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(3), LevelFilter::Trace);
        assert_eq!(level_for(u8::MAX), LevelFilter::Trace);
    }
}
