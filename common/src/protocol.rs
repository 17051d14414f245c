//! 通信プロトコル定義
//!
//! NMWGベースプロトコルの名前空間・メッセージ種別・イベントタイプ

use serde::{Deserialize, Serialize};
use std::fmt;

/// NMWGベース名前空間
pub const NMWG_NS: &str = "http://ggf.org/ns/nmwg/base/2.0/";
/// NMWGベース名前空間の接頭辞
pub const NMWG_PREFIX: &str = "nmwg";
/// perfSONAR名前空間（subject要素）
pub const PERFSONAR_NS: &str = "http://ggf.org/ns/nmwg/tools/org/perfsonar/1.0/";
/// perfSONARサービス名前空間（service要素）
pub const PSSERVICE_NS: &str = "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/1.0/";
/// XQuery名前空間
pub const XQUERY_NS: &str = "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/lookup/xquery/1.0/";

/// XQueryによる問い合わせを示すイベントタイプ
pub const XQUERY_EVENT_TYPE: &str =
    "http://ggf.org/ns/nmwg/tools/org/perfsonar/service/lookup/xquery/1.0";

/// SOAPエンベロープ名前空間
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAPエンベロープ（Body開始まで）
pub const SOAP_HEADER: &str = concat!(
    "<SOAP-ENV:Envelope",
    " xmlns:SOAP-ENC=\"http://schemas.xmlsoap.org/soap/encoding/\"",
    " xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"",
    " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
    " xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\">",
    "<SOAP-ENV:Header/>",
    "<SOAP-ENV:Body>"
);

/// SOAPエンベロープ（Body終了以降）
pub const SOAP_FOOTER: &str = "</SOAP-ENV:Body></SOAP-ENV:Envelope>";

/// 成功を示すイベントタイプの接頭辞
pub const SUCCESS_EVENT_PREFIX: &str = "success";

/// 登録キーのパラメータ名
pub const LS_KEY_PARAMETER: &str = "lsKey";

/// レスポンスのイベントタイプを指すXPath（message要素基準）
pub const EVENT_TYPE_XPATH: &str = "./nmwg:metadata/nmwg:eventType";

/// 登録レスポンスのキーを指すXPath（message要素基準）
pub const LS_KEY_XPATH: &str =
    "./nmwg:metadata/nmwg:key/nmwg:parameters/nmwg:parameter[@name=\"lsKey\"]";

/// レスポンス中のmessage要素を探すXPath（ドキュメント基準）
pub const MESSAGE_XPATH: &str =
    "//*[local-name()='message' and namespace-uri()='http://ggf.org/ns/nmwg/base/2.0/']";

/// メッセージ種別
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageType {
    /// サービス登録
    #[serde(rename = "LSRegisterRequest")]
    Register,
    /// 登録の維持
    #[serde(rename = "LSKeepaliveRequest")]
    Keepalive,
    /// 登録解除
    #[serde(rename = "LSDeregisterRequest")]
    Deregister,
    /// XQuery問い合わせ
    #[serde(rename = "LSQueryRequest")]
    Query,
}

impl MessageType {
    /// `type`属性に書き込む文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "LSRegisterRequest",
            Self::Keepalive => "LSKeepaliveRequest",
            Self::Deregister => "LSDeregisterRequest",
            Self::Query => "LSQueryRequest",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// イベントタイプが成功を示すか判定する
///
/// 先頭7文字が`"success"`と一致すれば成功とみなす。`"success.ls.register"`のような
/// 階層付きイベントタイプも`"success!!!"`も成功扱いになる。
pub fn is_success_event(event_type: &str) -> bool {
    event_type.starts_with(SUCCESS_EVENT_PREFIX)
}

/// テキスト・属性値用にXMLの特殊文字をエスケープする
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_strings() {
        assert_eq!(MessageType::Register.as_str(), "LSRegisterRequest");
        assert_eq!(MessageType::Keepalive.to_string(), "LSKeepaliveRequest");
        assert_eq!(MessageType::Deregister.as_str(), "LSDeregisterRequest");
        assert_eq!(
            serde_json::to_string(&MessageType::Query).unwrap(),
            "\"LSQueryRequest\""
        );
    }

    #[test]
    fn test_success_event_prefix_match() {
        assert!(is_success_event("success"));
        assert!(is_success_event("success!!!"));
        assert!(is_success_event("success.ls.register"));
        assert!(!is_success_event("failure"));
        assert!(!is_success_event("succes"));
        assert!(!is_success_event(" success"));
        assert!(!is_success_event(""));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Router1"), "Router1");
        assert_eq!(
            escape_xml(r#"a<b>&"c"'d'"#),
            "a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;"
        );
    }

    #[test]
    fn test_soap_envelope_wraps_body() {
        let envelope = format!("{}<x/>{}", SOAP_HEADER, SOAP_FOOTER);
        assert!(envelope.starts_with("<SOAP-ENV:Envelope"));
        assert!(envelope.contains("<SOAP-ENV:Header/><SOAP-ENV:Body><x/></SOAP-ENV:Body>"));
        assert!(envelope.contains(SOAP_ENV_NS));
    }
}
