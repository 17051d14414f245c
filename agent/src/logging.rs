//! ロギング初期化ユーティリティ
//!
//! `PSLS_LOG`（未設定なら`RUST_LOG`）のフィルタでtracingの購読者を設定する。

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// ログフィルタを指定する環境変数
pub const LOG_ENV: &str = "PSLS_LOG";

/// フィルタ未指定時のログレベル
const DEFAULT_DIRECTIVE: &str = "info";

/// 環境変数からフィルタを決める
pub fn env_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); defaulting to {}",
                LOG_ENV, err, DEFAULT_DIRECTIVE
            );
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

/// tracingの購読者を標準エラー出力へ設定する
///
/// 既に設定済みの場合は何もしない。
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .ok();
}
