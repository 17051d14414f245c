//! 設定管理
//!
//! ClientConfig, AgentConfig等の設定構造体

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LsError, LsResult};
use crate::types::ServiceDescriptor;

/// 環境変数の接頭辞（`PSLS__LS_URL`, `PSLS__CLIENT__REQUEST_TIMEOUT_SECS`など）
pub const ENV_PREFIX: &str = "PSLS";

/// HTTPクライアント設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// リクエストタイムアウト（秒）(デフォルト: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// リクエストメッセージの上限バイト数 (デフォルト: 65536)
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// レスポンス本文の上限バイト数 (デフォルト: 1MiB)
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_request_bytes() -> usize {
    64 * 1024
}

fn default_max_response_bytes() -> usize {
    1024 * 1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_request_bytes: default_max_request_bytes(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// 登録エージェント設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Lookup ServiceのURL (デフォルト: "http://localhost:8095/perfSONAR_PS/services/hLS")
    #[serde(default = "default_ls_url")]
    pub ls_url: String,

    /// keepalive送信間隔（秒）(デフォルト: 1800)
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    /// グローバルLookup Serviceのヒントファイル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints_url: Option<String>,

    /// HTTPクライアント設定
    #[serde(default)]
    pub client: ClientConfig,

    /// 登録するサービス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceDescriptor>,

    /// 登録時にdataへ埋め込むmetadata断片
    #[serde(default)]
    pub metadata: Vec<String>,
}

fn default_ls_url() -> String {
    "http://localhost:8095/perfSONAR_PS/services/hLS".to_string()
}

fn default_keepalive_interval() -> u64 {
    1800
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            ls_url: default_ls_url(),
            keepalive_interval_secs: default_keepalive_interval(),
            hints_url: None,
            client: ClientConfig::default(),
            service: None,
            metadata: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// 設定ファイル（任意）と環境変数から読み込む
    ///
    /// 環境変数はファイルより優先される。入れ子のキーは`__`で区切る。
    pub fn load(path: Option<&Path>) -> LsResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX).separator("__"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 値の整合性を検証する
    pub fn validate(&self) -> LsResult<()> {
        if self.ls_url.trim().is_empty() {
            return Err(LsError::Config("ls_url must not be empty".to_string()));
        }
        if self.keepalive_interval_secs == 0 {
            return Err(LsError::Config(
                "keepalive_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.client.max_request_bytes == 0 || self.client.max_response_bytes == 0 {
            return Err(LsError::Config(
                "byte limits must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
