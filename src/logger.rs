//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 设置了 `RUST_LOG` 时以其为准；重复调用不会报错
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "guided_interview=debug"
    } else {
        "guided_interview=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
