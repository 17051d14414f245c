//! サービス登録の維持
//!
//! 初回は登録して登録キーを保持し、以降はkeepaliveで延長する。
//! keepaliveがプロトコルエラーで拒否されたらキーを破棄し、その場で再登録する。

use chrono::{DateTime, Utc};
use perfsonar_ls_common::error::LsResult;
use perfsonar_ls_common::types::ServiceDescriptor;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::client::LookupClient;

/// 登録状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationStatus {
    /// 保持している登録キー
    pub ls_key: Option<String>,
    /// 最後に登録・keepaliveが成功した時刻
    pub last_refreshed: Option<DateTime<Utc>>,
    /// 成功した登録の回数
    pub registrations: u64,
    /// 成功したkeepaliveの回数
    pub keepalives: u64,
}

/// 1つのLookup Serviceに対する登録を維持する
pub struct Registrar {
    client: LookupClient,
    ls_url: String,
    service: ServiceDescriptor,
    metadata: Vec<String>,
    status: RegistrationStatus,
}

impl Registrar {
    /// 新しいRegistrarを作成
    pub fn new(
        client: LookupClient,
        ls_url: impl Into<String>,
        service: ServiceDescriptor,
        metadata: Vec<String>,
    ) -> Self {
        Self {
            client,
            ls_url: ls_url.into(),
            service,
            metadata,
            status: RegistrationStatus {
                ls_key: None,
                last_refreshed: None,
                registrations: 0,
                keepalives: 0,
            },
        }
    }

    /// 現在の登録状態
    pub fn status(&self) -> &RegistrationStatus {
        &self.status
    }

    /// 保持している登録キー
    pub fn ls_key(&self) -> Option<&str> {
        self.status.ls_key.as_deref()
    }

    /// 登録またはkeepaliveを行い、有効な登録キーを返す
    ///
    /// keepaliveが拒否された場合は同じ呼び出しの中で登録し直す。
    pub async fn refresh(&mut self) -> LsResult<String> {
        if let Some(ls_key) = self.status.ls_key.clone() {
            match self.client.keepalive(&self.ls_url, &ls_key).await {
                Ok(()) => {
                    self.status.keepalives += 1;
                    self.status.last_refreshed = Some(Utc::now());
                    return Ok(ls_key);
                }
                Err(e) if e.is_protocol() => {
                    warn!("Keepalive rejected, registering again: {}", e);
                    self.status.ls_key = None;
                }
                Err(e) => return Err(e),
            }
        }

        let ls_key = self
            .client
            .register(&self.ls_url, &self.service, &self.metadata)
            .await?;
        info!("Registered with {} (key: {})", self.ls_url, ls_key);

        self.status.ls_key = Some(ls_key.clone());
        self.status.registrations += 1;
        self.status.last_refreshed = Some(Utc::now());
        Ok(ls_key)
    }

    /// 登録キーを保持していれば登録を解除する
    pub async fn deregister(&mut self) -> LsResult<()> {
        if let Some(ls_key) = self.status.ls_key.take() {
            self.client.deregister(&self.ls_url, &ls_key).await?;
            info!("Deregistered {} from {}", ls_key, self.ls_url);
        }
        Ok(())
    }

    /// `interval`ごとにrefreshし、`shutdown`が完了したら登録を解除して終了する
    ///
    /// 各回の失敗はログに記録し、次の周期で再び試みる。
    pub async fn run<F>(mut self, interval: Duration, shutdown: F) -> LsResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        error!("Failed to refresh registration with {}: {}", self.ls_url, e);
                    }
                }
            }
        }

        self.deregister().await
    }
}
