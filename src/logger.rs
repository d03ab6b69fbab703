use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// Timestamped logs on stderr, `RUST_LOG` overrides the default `info` level
pub fn init() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();
}
