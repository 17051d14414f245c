//! Contract Test: LookupClient ⇔ Lookup Service
//!
//! wiremockでLookup Serviceを模擬し、登録・keepalive・登録解除・問い合わせの
//! 送信内容とレスポンス判定を検証する。

use perfsonar_ls_agent::{LookupClient, LsQuery};
use perfsonar_ls_common::config::ClientConfig;
use perfsonar_ls_common::error::LsError;
use perfsonar_ls_common::types::{ServiceDescriptor, ServiceKind};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LS_PATH: &str = "/perfSONAR_PS/services/hLS";

fn envelope(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <SOAP-ENV:Envelope xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <SOAP-ENV:Header/><SOAP-ENV:Body>{}</SOAP-ENV:Body></SOAP-ENV:Envelope>",
        body
    )
}

fn ls_reply(event_type: &str, ls_key: Option<&str>) -> String {
    let key = ls_key
        .map(|k| {
            format!(
                "<nmwg:key id=\"k1\"><nmwg:parameters id=\"p1\">\
                 <nmwg:parameter name=\"lsKey\">{}</nmwg:parameter>\
                 </nmwg:parameters></nmwg:key>",
                k
            )
        })
        .unwrap_or_default();
    envelope(&format!(
        "<nmwg:message xmlns:nmwg=\"http://ggf.org/ns/nmwg/base/2.0/\" \
         type=\"LSRegisterResponse\" id=\"resp1\">\
         <nmwg:metadata id=\"meta1\">\
         <nmwg:eventType>{}</nmwg:eventType>{}\
         </nmwg:metadata>\
         <nmwg:data metadataIdRef=\"meta1\" id=\"data1\"><nmwg:datum>ok</nmwg:datum></nmwg:data>\
         </nmwg:message>",
        event_type, key
    ))
}

fn ls_url(mock: &MockServer) -> String {
    format!("{}{}", mock.uri(), LS_PATH)
}

fn router_service() -> ServiceDescriptor {
    let mut service = ServiceDescriptor::new(ServiceKind::FirstParty);
    service.set_name(Some("Router1"));
    service.set_service_type(Some("MA"));
    service.set_access_point(Some("http://ma.example.net:8080/perfSONAR_PS/services/snmpMA"));
    service
}

async fn mount_reply(mock: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path(LS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(mock)
        .await;
}

#[tokio::test]
async fn register_sends_subject_and_metadata_and_returns_key() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LS_PATH))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .and(body_string_contains("type=\"LSRegisterRequest\""))
        .and(body_string_contains(
            "<psservice:serviceName>Router1</psservice:serviceName>",
        ))
        .and(body_string_contains("<nmwg:metadata id=\"extra1\"/><nmwg:metadata id=\"extra2\"/>"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ls_reply("success.ls.register", Some("ls-key-42"))),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let client = LookupClient::new().unwrap();
    let ls_key = client
        .register(
            &ls_url(&mock),
            &router_service(),
            &["<nmwg:metadata id=\"extra1\"/>", "<nmwg:metadata id=\"extra2\"/>"],
        )
        .await
        .unwrap();

    assert_eq!(ls_key, "ls-key-42");
}

#[tokio::test]
async fn register_accepts_event_type_with_success_prefix() {
    // 先頭7文字のみを比較するため "success!!!" も成功として扱われる
    let mock = MockServer::start().await;
    mount_reply(&mock, ls_reply("success!!!", Some("loose-key"))).await;

    let client = LookupClient::new().unwrap();
    let ls_key = client
        .register(&ls_url(&mock), &router_service(), &[] as &[&str])
        .await
        .unwrap();

    assert_eq!(ls_key, "loose-key");
}

#[tokio::test]
async fn register_fails_without_key() {
    let mock = MockServer::start().await;
    mount_reply(&mock, ls_reply("success.ls.register", None)).await;

    let client = LookupClient::new().unwrap();
    let err = client
        .register(&ls_url(&mock), &router_service(), &[] as &[&str])
        .await
        .unwrap_err();

    assert!(matches!(err, LsError::Protocol(_)));
}

#[tokio::test]
async fn register_fails_on_error_event_type() {
    let mock = MockServer::start().await;
    mount_reply(&mock, ls_reply("error.ls.register", Some("ignored"))).await;

    let client = LookupClient::new().unwrap();
    let err = client
        .register(&ls_url(&mock), &router_service(), &[] as &[&str])
        .await
        .unwrap_err();

    assert!(matches!(err, LsError::Protocol(_)));
}

#[tokio::test]
async fn register_generic_service_without_namespace_never_sends() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let mut service = ServiceDescriptor::new(ServiceKind::Generic);
    service.set_prefix(Some("bwctl"));
    service.add_address("ipv4", "192.0.2.20");

    let client = LookupClient::new().unwrap();
    let err = client
        .register(&ls_url(&mock), &service, &[] as &[&str])
        .await
        .unwrap_err();

    assert!(matches!(err, LsError::Construction(_)));
}

#[tokio::test]
async fn keepalive_sends_key_and_accepts_success() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LS_PATH))
        .and(body_string_contains("type=\"LSKeepaliveRequest\""))
        .and(body_string_contains(
            "<nmwg:parameter name=\"lsKey\">ls-key-42</nmwg:parameter>",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ls_reply("success.ls.keepalive", None)),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let client = LookupClient::new().unwrap();
    client.keepalive(&ls_url(&mock), "ls-key-42").await.unwrap();
}

#[tokio::test]
async fn keepalive_failure_event_is_protocol_error() {
    let mock = MockServer::start().await;
    mount_reply(&mock, ls_reply("failure", Some("should-not-be-used"))).await;

    let client = LookupClient::new().unwrap();
    let err = client.keepalive(&ls_url(&mock), "ls-key-42").await.unwrap_err();

    assert!(matches!(err, LsError::Protocol(_)));
}

#[tokio::test]
async fn deregister_sends_deregister_request() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("type=\"LSDeregisterRequest\""))
        .and(body_string_contains(">ls-key-42</nmwg:parameter>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ls_reply("success.ls.deregister", None)),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let client = LookupClient::new().unwrap();
    client.deregister(&ls_url(&mock), "ls-key-42").await.unwrap();
}

#[tokio::test]
async fn query_returns_raw_response_without_checking_event_type() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("type=\"LSQueryRequest\""))
        .and(body_string_contains("<nmwg:metadata id=\"5\">"))
        .and(body_string_contains("<nmwg:data metadataIdRef=\"5\""))
        .and(body_string_contains("/nmwg:store[@type=\"LSStore\"]"))
        .and(body_string_contains(
            "<nmwg:parameter name=\"lsOutput\">native</nmwg:parameter>",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ls_reply("error.ls.query.empty_results", None)),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let client = LookupClient::new().unwrap();
    let response = client
        .query(
            &ls_url(&mock),
            &[LsQuery::with_id(5, "/nmwg:store[@type=\"LSStore\"]")],
        )
        .await
        .unwrap();

    assert_eq!(response.event_type().unwrap(), "error.ls.query.empty_results");
    assert_eq!(response.find_value("./nmwg:data/nmwg:datum").unwrap(), "ok");
}

#[tokio::test]
async fn response_with_two_messages_is_protocol_error() {
    let mock = MockServer::start().await;
    let message = "<nmwg:message xmlns:nmwg=\"http://ggf.org/ns/nmwg/base/2.0/\">\
                   <nmwg:metadata><nmwg:eventType>success</nmwg:eventType></nmwg:metadata>\
                   </nmwg:message>";
    mount_reply(&mock, envelope(&format!("{}{}", message, message))).await;

    let client = LookupClient::new().unwrap();
    let err = client.keepalive(&ls_url(&mock), "k").await.unwrap_err();

    assert!(matches!(err, LsError::Protocol(_)));
}

#[tokio::test]
async fn response_without_message_is_protocol_error() {
    let mock = MockServer::start().await;
    mount_reply(
        &mock,
        envelope("<SOAP-ENV:Fault><faultstring>boom</faultstring></SOAP-ENV:Fault>"),
    )
    .await;

    let client = LookupClient::new().unwrap();
    let err = client.keepalive(&ls_url(&mock), "k").await.unwrap_err();

    assert!(matches!(err, LsError::Protocol(_)));
}

#[tokio::test]
async fn malformed_response_is_parse_error() {
    let mock = MockServer::start().await;
    mount_reply(&mock, "this is not xml".to_string()).await;

    let client = LookupClient::new().unwrap();
    let err = client.keepalive(&ls_url(&mock), "k").await.unwrap_err();

    assert!(matches!(err, LsError::Parse(_)));
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let mock = MockServer::start().await;
    mount_reply(&mock, ls_reply(&"success".repeat(100), None)).await;

    let config = ClientConfig {
        max_response_bytes: 256,
        ..ClientConfig::default()
    };
    let client = LookupClient::from_config(&config).unwrap();
    let err = client.keepalive(&ls_url(&mock), "k").await.unwrap_err();

    assert!(matches!(err, LsError::ResponseTooLarge { limit: 256 }));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let client = LookupClient::new().unwrap();
    let err = client
        .keepalive("http://127.0.0.1:9/perfSONAR_PS/services/hLS", "k")
        .await
        .unwrap_err();

    assert!(matches!(err, LsError::Transport(_)));
}

#[tokio::test]
async fn soap_fault_status_still_parses_body() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(ls_reply("success.ls.keepalive", None)),
        )
        .mount(&mock)
        .await;

    let client = LookupClient::new().unwrap();
    client.keepalive(&ls_url(&mock), "k").await.unwrap();
}
