//! Lookup Service通信クライアント（登録・keepalive・登録解除・問い合わせ）
//!
//! 組み立てたメッセージをSOAPエンベロープで包み、チャンク転送のPOSTで送信する。
//! レスポンス本文は上限付きで全量読み込み、message要素を1つ持つXMLとして解析する。

use futures::StreamExt;
use perfsonar_ls_common::config::ClientConfig;
use perfsonar_ls_common::error::{LsError, LsResult};
use perfsonar_ls_common::message::{
    build_ls_message, end_data, end_message, end_metadata, event_type, start_data,
    start_message, start_metadata, MessageBuffer,
};
use perfsonar_ls_common::protocol::{
    is_success_event, MessageType, LS_KEY_XPATH, SOAP_FOOTER, SOAP_HEADER, XQUERY_EVENT_TYPE,
    XQUERY_NS,
};
use perfsonar_ls_common::subject::{render_ls_key, render_subject};
use perfsonar_ls_common::types::ServiceDescriptor;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::response::ResponseMessage;

/// XQuery問い合わせ1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsQuery {
    /// metadataの識別子（0なら自動採番）
    pub id: u32,
    /// XQuery本文（そのまま埋め込む）
    pub xquery: String,
}

impl LsQuery {
    /// 自動採番の問い合わせを作成
    pub fn new(xquery: impl Into<String>) -> Self {
        Self {
            id: 0,
            xquery: xquery.into(),
        }
    }

    /// 識別子を指定した問い合わせを作成
    pub fn with_id(id: u32, xquery: impl Into<String>) -> Self {
        Self {
            id,
            xquery: xquery.into(),
        }
    }
}

/// Lookup Serviceクライアント
#[derive(Debug, Clone)]
pub struct LookupClient {
    http_client: Client,
    max_request_bytes: usize,
    max_response_bytes: usize,
}

impl LookupClient {
    /// デフォルト設定でクライアントを作成
    pub fn new() -> LsResult<Self> {
        Self::from_config(&ClientConfig::default())
    }

    /// 設定からクライアントを作成
    pub fn from_config(config: &ClientConfig) -> LsResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LsError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            max_request_bytes: config.max_request_bytes,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// 内部のHTTPクライアント（ヒントファイル取得などで共有）
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// サービスを登録し、返却された登録キーを返す
    ///
    /// `metadata`の各断片はdataにそのまま連結される。
    pub async fn register<S: AsRef<str>>(
        &self,
        url: &str,
        service: &ServiceDescriptor,
        metadata: &[S],
    ) -> LsResult<String> {
        debug!("Constructing service subject");
        let subject = render_subject(service)?;

        let mut data = MessageBuffer::with_limit(self.max_request_bytes);
        for fragment in metadata {
            data.push_str(fragment.as_ref())?;
        }

        let message = build_ls_message(
            MessageType::Register,
            Some(&subject),
            Some(data.as_str()),
            Some(self.max_request_bytes),
        )?;

        let response = self.send_request(url, &message).await?;
        ensure_success(&response, MessageType::Register)?;

        let ls_key = response.find_value(LS_KEY_XPATH)?;
        debug!("Registered service with key {}", ls_key);
        Ok(ls_key)
    }

    /// 登録キーの有効期限を延長する
    pub async fn keepalive(&self, url: &str, ls_key: &str) -> LsResult<()> {
        self.manage_registration(url, MessageType::Keepalive, ls_key)
            .await
    }

    /// 登録を解除する
    pub async fn deregister(&self, url: &str, ls_key: &str) -> LsResult<()> {
        self.manage_registration(url, MessageType::Deregister, ls_key)
            .await
    }

    async fn manage_registration(
        &self,
        url: &str,
        message_type: MessageType,
        ls_key: &str,
    ) -> LsResult<()> {
        let key = render_ls_key(ls_key);
        let message = build_ls_message(message_type, Some(&key), None, Some(self.max_request_bytes))?;

        let response = self.send_request(url, &message).await?;
        ensure_success(&response, message_type)
    }

    /// XQueryの問い合わせを送信し、解析済みレスポンスを返す
    ///
    /// レスポンスのeventTypeは検証しない。結果の解釈は呼び出し側が行う。
    pub async fn query(&self, url: &str, queries: &[LsQuery]) -> LsResult<ResponseMessage> {
        let message = self.build_query_message(queries)?;
        self.send_request(url, &message).await
    }

    fn build_query_message(&self, queries: &[LsQuery]) -> LsResult<String> {
        let mut buf = MessageBuffer::with_limit(self.max_request_bytes);

        start_message(&mut buf, 0, MessageType::Query)?;
        for query in queries {
            let metadata_id = start_metadata(&mut buf, query.id)?;
            buf.push_str(&format!(
                "<xquery:subject id=\"sub1\" xmlns:xquery=\"{}\">",
                XQUERY_NS
            ))?;
            buf.push_str(&query.xquery)?;
            buf.push_str("</xquery:subject>")?;
            buf.push_str(&format!(
                "<xquery:parameters id=\"params.1\" xmlns:xquery=\"{}\">",
                XQUERY_NS
            ))?;
            buf.push_str("<nmwg:parameter name=\"lsOutput\">native</nmwg:parameter>")?;
            buf.push_str("</xquery:parameters>")?;
            event_type(&mut buf, XQUERY_EVENT_TYPE)?;
            end_metadata(&mut buf)?;
            start_data(&mut buf, metadata_id, 0)?;
            end_data(&mut buf)?;
        }
        end_message(&mut buf)?;

        Ok(buf.into_string())
    }

    /// メッセージをSOAPで送信し、解析済みレスポンスを返す
    ///
    /// HTTPステータスは検証しない（SOAP Faultも本文で判定する）。
    pub async fn send_request(&self, url: &str, message: &str) -> LsResult<ResponseMessage> {
        debug!("Sending message to {}", url);
        trace!("Request: {}{}{}", SOAP_HEADER, message, SOAP_FOOTER);

        let chunks: Vec<Result<String, std::io::Error>> = vec![
            Ok(SOAP_HEADER.to_string()),
            Ok(message.to_string()),
            Ok(SOAP_FOOTER.to_string()),
        ];
        let body = Body::wrap_stream(futures::stream::iter(chunks));

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| LsError::Transport(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Lookup service {} responded with HTTP {}", url, status);
        }

        let body = self.read_body(response).await?;
        trace!("Response: {}", body);

        ResponseMessage::parse(&body)
    }

    async fn read_body(&self, response: reqwest::Response) -> LsResult<String> {
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| LsError::Transport(format!("Failed to read response: {}", e)))?;
            if body.len() + chunk.len() > self.max_response_bytes {
                return Err(LsError::ResponseTooLarge {
                    limit: self.max_response_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body)
            .map_err(|e| LsError::Parse(format!("response is not valid UTF-8: {}", e)))
    }
}

/// eventTypeが成功を示すことを確認する
fn ensure_success(response: &ResponseMessage, message_type: MessageType) -> LsResult<()> {
    let event_type = response.event_type()?;
    if !is_success_event(&event_type) {
        warn!("Event type != success for {}: {}", message_type, event_type);
        return Err(LsError::Protocol(format!(
            "{} failed with event type {}",
            message_type, event_type
        )));
    }
    Ok(())
}
