//! perfSONAR Lookup Service Common
//!
//! Lookup Serviceクライアントとエージェントで共有する型・メッセージ組み立て

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;

/// メッセージ組み立て
pub mod message;

/// 通信プロトコル定義
pub mod protocol;

/// subject要素の描画
pub mod subject;

/// 共通型定義
pub mod types;
