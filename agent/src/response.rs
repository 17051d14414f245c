//! Lookup Serviceレスポンス
//!
//! SOAPレスポンスを解析し、NMWGベース名前空間のmessage要素が
//! ちょうど1つ含まれることを確認したうえで保持する。

use perfsonar_ls_common::error::{LsError, LsResult};
use perfsonar_ls_common::protocol::{EVENT_TYPE_XPATH, MESSAGE_XPATH, NMWG_NS};
use sxd_document::dom::{Document, Element};
use sxd_document::{parser, Package};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

use crate::xpath::{find_node, find_value, XPathEvaluator};

/// 解析済みのレスポンス
///
/// 所有するドキュメントから論理ルート（message要素）を取り出して使う。
pub struct ResponseMessage {
    package: Package,
    message_type: Option<String>,
}

impl std::fmt::Debug for ResponseMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseMessage")
            .field("message_type", &self.message_type)
            .finish()
    }
}

impl ResponseMessage {
    /// レスポンス本文を解析する
    ///
    /// XMLとして不正なら[`LsError::Parse`]、message要素が0個または複数なら
    /// [`LsError::Protocol`]。
    pub fn parse(body: &str) -> LsResult<Self> {
        let package = parser::parse(body)
            .map_err(|e| LsError::Parse(format!("malformed response XML: {:?}", e)))?;

        let message_type = {
            let document = package.as_document();
            let message = locate_message(&document)?;
            message.attribute_value("type").map(str::to_string)
        };

        Ok(Self {
            package,
            message_type,
        })
    }

    /// message要素の`type`属性
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    /// 解析済みドキュメント
    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }

    /// message要素を`f`に渡して処理する
    pub fn with_message<T>(&self, f: impl FnOnce(Element<'_>) -> LsResult<T>) -> LsResult<T> {
        let document = self.package.as_document();
        let message = locate_message(&document)?;
        f(message)
    }

    /// message要素を起点にXPathを評価し、一意な要素のテキストを返す
    pub fn find_value(&self, xpath: &str) -> LsResult<String> {
        self.with_message(|message| find_value(message, xpath, None))
    }

    /// message要素を起点にXPathで選ばれるノード数を返す
    pub fn count(&self, xpath: &str) -> LsResult<usize> {
        self.with_message(|message| Ok(find_node(message, xpath, None)?.size()))
    }

    /// 各metadataのeventTypeを文書順に返す
    ///
    /// 要素数はmetadataの数と一致する。eventTypeが一意に決まらないmetadataは`None`。
    pub fn event_types(&self) -> LsResult<Vec<Option<String>>> {
        self.with_message(|message| {
            let evaluator = XPathEvaluator::new(message);
            let metadata = evaluator.evaluate(message, "./nmwg:metadata")?;

            let mut event_types = Vec::new();
            for node in metadata.document_order() {
                if let Node::Element(element) = node {
                    let event_type =
                        match find_value(element, "./nmwg:eventType", Some(&evaluator)) {
                            Ok(value) => Some(value),
                            Err(LsError::Protocol(_)) => None,
                            Err(e) => return Err(e),
                        };
                    event_types.push(event_type);
                }
            }
            Ok(event_types)
        })
    }

    /// レスポンスのeventType（metadataが1つのときのみ）
    pub fn event_type(&self) -> LsResult<String> {
        self.find_value(EVENT_TYPE_XPATH)
    }
}

/// ドキュメント中のNMWG message要素をちょうど1つ見つける
fn locate_message<'d>(document: &Document<'d>) -> LsResult<Element<'d>> {
    let xpath = Factory::new()
        .build(MESSAGE_XPATH)
        .map_err(|e| LsError::XPath(format!("invalid expression {}: {}", MESSAGE_XPATH, e)))?
        .ok_or_else(|| LsError::XPath(format!("empty expression {:?}", MESSAGE_XPATH)))?;
    let context = Context::new();

    let nodes = match xpath
        .evaluate(&context, document.root())
        .map_err(|e| LsError::XPath(format!("failed to evaluate {}: {}", MESSAGE_XPATH, e)))?
    {
        Value::Nodeset(nodes) => nodes,
        _ => {
            return Err(LsError::XPath(format!(
                "expression {} did not select a node-set",
                MESSAGE_XPATH
            )))
        }
    };

    match nodes.size() {
        0 => Err(LsError::Protocol(format!(
            "response contains no message element in {}",
            NMWG_NS
        ))),
        1 => match nodes.document_order_first() {
            Some(Node::Element(message)) => Ok(message),
            _ => Err(LsError::Protocol(
                "response message is not an element".to_string(),
            )),
        },
        n => Err(LsError::Protocol(format!(
            "response contains {} message elements, expected exactly one",
            n
        ))),
    }
}
