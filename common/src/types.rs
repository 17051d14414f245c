//! 共通型定義
//!
//! Lookup Serviceへ登録するサービス記述子

use serde::{Deserialize, Serialize};

/// サービスの種別
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// perfSONAR自身のサービス（固定の名前空間で描画）
    FirstParty,
    /// 任意のサードパーティサービス（独自の接頭辞・名前空間で描画）
    Generic,
}

/// サービスのアドレス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceAddress {
    /// アドレス種別（例: "ipv4", "url"）
    #[serde(rename = "type")]
    pub address_type: String,
    /// アドレス値
    pub address: String,
}

/// 登録可能なサービスの記述子
///
/// 種別は生成時に固定される。その他のフィールドは独立して設定・消去でき、
/// 組み合わせの検証は描画時（[`crate::subject::render_subject`]）に行う。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    kind: ServiceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_point: Option<String>,
    #[serde(default)]
    addresses: Vec<ServiceAddress>,
}

/// 空文字列は未設定として扱う
fn normalize(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl ServiceDescriptor {
    /// 全フィールド未設定の記述子を作成
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            prefix: None,
            namespace: None,
            name: None,
            service_type: None,
            description: None,
            access_point: None,
            addresses: Vec::new(),
        }
    }

    /// サービス種別
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// XML接頭辞（Generic種別で使用）
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// XML名前空間（Generic種別で使用）
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// サービス名
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// サービスタイプ
    pub fn service_type(&self) -> Option<&str> {
        self.service_type.as_deref()
    }

    /// 説明
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// アクセスポイント
    pub fn access_point(&self) -> Option<&str> {
        self.access_point.as_deref()
    }

    /// 登録済みアドレス（追加順）
    pub fn addresses(&self) -> &[ServiceAddress] {
        &self.addresses
    }

    /// XML接頭辞を設定（`None`または空文字列で消去）
    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = normalize(prefix);
    }

    /// XML名前空間を設定（`None`または空文字列で消去）
    pub fn set_namespace(&mut self, namespace: Option<&str>) {
        self.namespace = normalize(namespace);
    }

    /// サービス名を設定（`None`または空文字列で消去）
    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = normalize(name);
    }

    /// サービスタイプを設定（`None`または空文字列で消去）
    pub fn set_service_type(&mut self, service_type: Option<&str>) {
        self.service_type = normalize(service_type);
    }

    /// 説明を設定（`None`または空文字列で消去）
    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = normalize(description);
    }

    /// アクセスポイントを設定（`None`または空文字列で消去）
    pub fn set_access_point(&mut self, access_point: Option<&str>) {
        self.access_point = normalize(access_point);
    }

    /// アドレスを末尾に追加（重複可、削除操作はない）
    pub fn add_address(&mut self, address_type: &str, address: &str) {
        self.addresses.push(ServiceAddress {
            address_type: address_type.to_string(),
            address: address.to_string(),
        });
    }
}
