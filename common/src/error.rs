//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! Lookup Serviceクライアントの全操作は`LsError`で失敗を返す。
//! 分類は ConstructionError / TransportError / ParseError / ProtocolError の4系統。

use thiserror::Error;

/// Lookup Serviceクライアントのエラー型
#[derive(Debug, Error)]
pub enum LsError {
    /// サービス記述子から必要なXMLを組み立てられない
    #[error("Construction error: {0}")]
    Construction(String),

    /// リクエストメッセージがバイト上限を超える
    #[error("Message exceeds capacity of {limit} bytes")]
    CapacityExceeded {
        /// 上限バイト数
        limit: usize,
    },

    /// 接続・送信・受信の失敗
    #[error("Transport error: {0}")]
    Transport(String),

    /// レスポンス本文がバイト上限を超える
    #[error("Response exceeds limit of {limit} bytes")]
    ResponseTooLarge {
        /// 上限バイト数
        limit: usize,
    },

    /// レスポンスがXMLとして解析できない
    #[error("Parse error: {0}")]
    Parse(String),

    /// レスポンスの内容がプロトコルの期待と一致しない
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// XPath式のコンパイル・評価失敗
    #[error("XPath error: {0}")]
    XPath(String),

    /// 設定の読み込み・検証失敗
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LsError {
    /// ConstructionError系か
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_) | Self::CapacityExceeded { .. })
    }

    /// TransportError系か
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ResponseTooLarge { .. })
    }

    /// ProtocolError系か
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::XPath(_))
    }
}

impl From<config::ConfigError> for LsError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Lookup Serviceクライアント用Result型
pub type LsResult<T> = Result<T, LsError>;
