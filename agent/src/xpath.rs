//! XPath検索ヘルパー
//!
//! ノード配下で宣言された全名前空間を登録したうえでXPathを評価し、
//! 単一要素またはそのテキストを取り出す。

use perfsonar_ls_common::error::{LsError, LsResult};
use sxd_document::dom::{ChildOfElement, Element};
use sxd_xpath::nodeset::{Node, Nodeset};
use sxd_xpath::{Context, Factory, Value};

/// 再利用可能なXPath評価コンテキスト
///
/// 生成時に基準ノードとその子孫の名前空間を一度だけ登録する。
/// 同じドキュメント内の任意のノードを起点に評価できる。
pub struct XPathEvaluator<'d> {
    factory: Factory,
    context: Context<'d>,
}

impl<'d> XPathEvaluator<'d> {
    /// `root`とその子孫で有効な名前空間を登録したコンテキストを作成
    pub fn new(root: Element<'d>) -> Self {
        let mut context = Context::new();
        register_namespaces(root, &mut context);

        Self {
            factory: Factory::new(),
            context,
        }
    }

    /// `node`を文脈ノードとしてXPathを評価し、ノード集合を返す
    pub fn evaluate(&self, node: Element<'d>, xpath: &str) -> LsResult<Nodeset<'d>> {
        let compiled = self
            .factory
            .build(xpath)
            .map_err(|e| LsError::XPath(format!("invalid expression {}: {}", xpath, e)))?
            .ok_or_else(|| LsError::XPath(format!("empty expression {:?}", xpath)))?;

        let value = compiled
            .evaluate(&self.context, node)
            .map_err(|e| LsError::XPath(format!("failed to evaluate {}: {}", xpath, e)))?;

        match value {
            Value::Nodeset(nodes) => Ok(nodes),
            other => Err(LsError::XPath(format!(
                "expression {} did not select a node-set: {:?}",
                xpath, other
            ))),
        }
    }
}

fn register_namespaces<'d>(element: Element<'d>, context: &mut Context<'d>) {
    for namespace in element.namespaces_in_scope() {
        context.set_namespace(namespace.prefix(), namespace.uri());
    }

    for child in element.children() {
        if let ChildOfElement::Element(child) = child {
            register_namespaces(child, context);
        }
    }
}

/// `root`を起点にXPathを評価する
///
/// `evaluator`を渡さない場合は`root`配下の名前空間を登録した新しいコンテキストを使う。
pub fn find_node<'d>(
    root: Element<'d>,
    xpath: &str,
    evaluator: Option<&XPathEvaluator<'d>>,
) -> LsResult<Nodeset<'d>> {
    match evaluator {
        Some(evaluator) => evaluator.evaluate(root, xpath),
        None => XPathEvaluator::new(root).evaluate(root, xpath),
    }
}

/// XPathで一意に選ばれる要素の最初のテキスト子ノードを返す
///
/// 一致なし・複数一致・テキスト子ノードなしは[`LsError::Protocol`]。
pub fn find_value<'d>(
    root: Element<'d>,
    xpath: &str,
    evaluator: Option<&XPathEvaluator<'d>>,
) -> LsResult<String> {
    let element = find_single_element(root, xpath, evaluator)?;

    element
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfElement::Text(text) => Some(text.text().to_string()),
            _ => None,
        })
        .ok_or_else(|| LsError::Protocol(format!("element matched by {} has no text", xpath)))
}

/// XPathで一意に選ばれる要素を返す
pub fn find_single_element<'d>(
    root: Element<'d>,
    xpath: &str,
    evaluator: Option<&XPathEvaluator<'d>>,
) -> LsResult<Element<'d>> {
    let nodes = find_node(root, xpath, evaluator)?;

    match nodes.size() {
        0 => {
            return Err(LsError::Protocol(format!("no node matches {}", xpath)));
        }
        1 => {}
        n => {
            return Err(LsError::Protocol(format!(
                "expected exactly one node for {}, found {}",
                xpath, n
            )));
        }
    }

    match nodes.document_order_first() {
        Some(Node::Element(element)) => Ok(element),
        _ => Err(LsError::Protocol(format!(
            "node matched by {} is not an element",
            xpath
        ))),
    }
}
