use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::AppSettings;

/// 初始化日志
///
/// 开发环境输出文件与行号，其他环境输出 JSON。已有全局订阅者时保持原样，
/// 返回的 guard 需要在进程生命周期内持有，否则缓冲的日志会丢失。
pub fn init_tracing(settings: &AppSettings) -> WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(true);

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    let installed = if settings.environment == "development" {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .try_init()
    } else {
        tracing_builder.json().try_init()
    };
    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let settings = AppSettings {
            environment: "production".to_string(),
            log_level: "not a [valid filter".to_string(),
        };
        let _first = init_tracing(&settings);
        let _second = init_tracing(&AppSettings::default());
    }
}
