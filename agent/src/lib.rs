//! perfSONAR Lookup Service Agent
//!
//! Lookup Serviceへのサービス登録・keepalive・問い合わせを行うクライアント

#![warn(missing_docs)]

/// Lookup Service通信クライアント（登録・keepalive・問い合わせ）
pub mod client;

/// グローバルLookup Serviceのヒントファイル
pub mod hints;

/// ロギング初期化ユーティリティ
pub mod logging;

/// サービス登録の維持
pub mod registration;

/// Lookup Serviceレスポンス
pub mod response;

/// XPath検索ヘルパー
pub mod xpath;

pub use client::{LookupClient, LsQuery};
pub use registration::{RegistrationStatus, Registrar};
pub use response::ResponseMessage;
