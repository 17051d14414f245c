//! subject要素の描画
//!
//! サービス記述子を登録メッセージのmetadataに埋め込むXML断片へ変換する。

use crate::error::{LsError, LsResult};
use crate::protocol::{escape_xml, LS_KEY_PARAMETER, PERFSONAR_NS, PSSERVICE_NS};
use crate::types::{ServiceDescriptor, ServiceKind};

/// サービス記述子をsubject断片に描画する
///
/// Generic種別で接頭辞または名前空間が未設定なら[`LsError::Construction`]。
pub fn render_subject(service: &ServiceDescriptor) -> LsResult<String> {
    match service.kind() {
        ServiceKind::FirstParty => Ok(render_first_party(service)),
        ServiceKind::Generic => render_generic(service),
    }
}

fn render_first_party(service: &ServiceDescriptor) -> String {
    let mut xml = String::new();
    xml.push_str(&format!(
        "<perfsonar:subject xmlns:perfsonar=\"{}\"><psservice:service xmlns:psservice=\"{}\">",
        PERFSONAR_NS, PSSERVICE_NS
    ));

    let children = [
        ("serviceName", service.name()),
        ("serviceType", service.service_type()),
        ("description", service.description()),
        ("accessPoint", service.access_point()),
    ];
    for (tag, value) in children {
        if let Some(value) = value {
            xml.push_str(&format!(
                "<psservice:{tag}>{}</psservice:{tag}>",
                escape_xml(value)
            ));
        }
    }

    xml.push_str("</psservice:service></perfsonar:subject>");
    xml
}

fn render_generic(service: &ServiceDescriptor) -> LsResult<String> {
    let (prefix, namespace) = match (service.prefix(), service.namespace()) {
        (Some(prefix), Some(namespace)) => (prefix, namespace),
        _ => {
            return Err(LsError::Construction(
                "generic service requires both a prefix and a namespace".to_string(),
            ))
        }
    };

    let mut xml = String::new();
    xml.push_str(&format!(
        "<nmwg:subject><{prefix}:service xmlns:{prefix}=\"{}\">",
        escape_xml(namespace)
    ));

    let children = [
        ("name", service.name()),
        ("type", service.service_type()),
        ("description", service.description()),
    ];
    for (tag, value) in children {
        if let Some(value) = value {
            xml.push_str(&format!(
                "<{prefix}:{tag}>{}</{prefix}:{tag}>",
                escape_xml(value)
            ));
        }
    }

    for address in service.addresses() {
        xml.push_str(&format!(
            "<{prefix}:address type=\"{}\">{}</{prefix}:address>",
            escape_xml(&address.address_type),
            escape_xml(&address.address)
        ));
    }

    xml.push_str(&format!("</{prefix}:service></nmwg:subject>"));
    Ok(xml)
}

/// keepalive・deregisterで送る登録キー断片を描画する
pub fn render_ls_key(ls_key: &str) -> String {
    format!(
        "<nmwg:key id=\"key1\"><nmwg:parameters id=\"parameters.1\">\
         <nmwg:parameter name=\"{}\">{}</nmwg:parameter>\
         </nmwg:parameters></nmwg:key>",
        LS_KEY_PARAMETER,
        escape_xml(ls_key)
    )
}
