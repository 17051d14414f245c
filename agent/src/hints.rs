//! グローバルLookup Serviceのヒントファイル
//!
//! 1行1URLのテキストファイルからグローバルLS一覧を取得する。

use perfsonar_ls_common::error::{LsError, LsResult};
use rand::seq::SliceRandom;
use tracing::debug;

use crate::client::LookupClient;

/// ヒントファイルを取得してグローバルLSのURL一覧を返す
///
/// 空行は除外する。`shuffle`が偽ならファイル記載順を保つ。
pub async fn fetch_global_hints(
    client: &LookupClient,
    url: &str,
    shuffle: bool,
) -> LsResult<Vec<String>> {
    debug!("Fetching global hints from {}", url);

    let response = client
        .http_client()
        .get(url)
        .send()
        .await
        .map_err(|e| LsError::Transport(format!("Failed to fetch hints from {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(LsError::Transport(format!(
            "Bad status returned from {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| LsError::Transport(format!("Failed to read hints from {}: {}", url, e)))?;

    let mut hints = parse_hints(&body);
    if shuffle {
        hints.shuffle(&mut rand::thread_rng());
    }
    Ok(hints)
}

fn parse_hints(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
