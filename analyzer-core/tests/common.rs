use std::sync::Once;

use analyzer_common::observability::{LogConfig, LogFormat, init_logging};

static TRACING: Once = Once::new();

/// Route test logs to stderr and a scratch directory; `RUST_LOG` still wins.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let json = std::env::var("PAGE_ANALYZER_LOG_FORMAT")
            .is_ok_and(|f| f.trim().eq_ignore_ascii_case("json"));
        let _ = init_logging(LogConfig {
            app_name: "page-analyzer-tests",
            log_dir: Some(std::env::temp_dir().join("page-analyzer-tests")),
            emit_stderr: true,
            format: if json { LogFormat::Json } else { LogFormat::Text },
            default_filter: "debug".into(),
        });
    });
}
