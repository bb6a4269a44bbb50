use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// stdout + 일별 로그 파일 동시 출력
/// 반환된 guard는 main이 끝날 때까지 들고 있어야 버퍼가 flush 된다
/// RUST_LOG로 필터 지정 (기본 info), LOG_DIR로 로그 디렉토리 지정 (기본 logs)
pub fn init_tracing() -> Vec<WorkerGuard> {
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

    let file_appender = tracing_appender::rolling::daily(&log_dir, "mirror.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(stdout_writer))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }

    vec![stdout_guard, file_guard]
}
