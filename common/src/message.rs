//! メッセージ組み立て
//!
//! NMWGのmessage/metadata/data要素を文字列として`MessageBuffer`に追記する。
//! 識別子に0を渡すと1..=999999の乱数を割り当て、割り当てた値を返す。

use rand::Rng;

use crate::error::{LsError, LsResult};
use crate::protocol::{escape_xml, MessageType, NMWG_NS};

/// 自動採番される識別子の上限（この値を含まない）
const GENERATED_ID_LIMIT: u32 = 1_000_000;

/// 上限付きの伸長可能なテキストバッファ
///
/// 上限を超える追記は切り詰めずに[`LsError::CapacityExceeded`]で失敗し、
/// バッファの内容は追記前のまま残る。
#[derive(Debug, Clone, Default)]
pub struct MessageBuffer {
    buf: String,
    limit: Option<usize>,
}

impl MessageBuffer {
    /// 上限なしのバッファを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// バイト上限付きのバッファを作成
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit: Some(limit),
        }
    }

    /// 文字列を追記する
    pub fn push_str(&mut self, s: &str) -> LsResult<()> {
        if let Some(limit) = self.limit {
            if self.buf.len() + s.len() > limit {
                return Err(LsError::CapacityExceeded { limit });
            }
        }
        self.buf.push_str(s);
        Ok(())
    }

    /// 現在の内容
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// 現在のバイト長
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// 空か
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 内容を取り出す
    pub fn into_string(self) -> String {
        self.buf
    }
}

/// 0なら乱数の識別子を割り当てる
fn assign_id(id: u32) -> u32 {
    if id == 0 {
        rand::thread_rng().gen_range(1..GENERATED_ID_LIMIT)
    } else {
        id
    }
}

/// message開始タグを追記し、割り当てた識別子を返す
pub fn start_message(buf: &mut MessageBuffer, id: u32, message_type: MessageType) -> LsResult<u32> {
    let id = assign_id(id);
    buf.push_str(&format!(
        "<nmwg:message type=\"{}\" id=\"{}\" xmlns:nmwg=\"{}\">",
        message_type, id, NMWG_NS
    ))?;
    Ok(id)
}

/// message終了タグを追記
pub fn end_message(buf: &mut MessageBuffer) -> LsResult<()> {
    buf.push_str("</nmwg:message>")
}

/// metadata開始タグを追記し、割り当てた識別子を返す
pub fn start_metadata(buf: &mut MessageBuffer, id: u32) -> LsResult<u32> {
    let id = assign_id(id);
    buf.push_str(&format!("<nmwg:metadata id=\"{}\">", id))?;
    Ok(id)
}

/// metadata終了タグを追記
pub fn end_metadata(buf: &mut MessageBuffer) -> LsResult<()> {
    buf.push_str("</nmwg:metadata>")
}

/// data開始タグを追記し、割り当てた識別子を返す
///
/// `metadata_id_ref`が実在するmetadataを指すかは検証しない。
pub fn start_data(buf: &mut MessageBuffer, metadata_id_ref: u32, id: u32) -> LsResult<u32> {
    let id = assign_id(id);
    buf.push_str(&format!(
        "<nmwg:data metadataIdRef=\"{}\" id=\"{}\">",
        metadata_id_ref, id
    ))?;
    Ok(id)
}

/// data終了タグを追記
pub fn end_data(buf: &mut MessageBuffer) -> LsResult<()> {
    buf.push_str("</nmwg:data>")
}

/// eventType要素を追記
pub fn event_type(buf: &mut MessageBuffer, value: &str) -> LsResult<()> {
    buf.push_str(&format!(
        "<nmwg:eventType>{}</nmwg:eventType>",
        escape_xml(value)
    ))
}

/// metadata 1件・data 1件からなるLSメッセージを組み立てる
///
/// dataは直前に割り当てたmetadataの識別子を参照する。
/// `metadata`・`data`はXML断片としてそのまま埋め込む。
pub fn build_ls_message(
    message_type: MessageType,
    metadata: Option<&str>,
    data: Option<&str>,
    limit: Option<usize>,
) -> LsResult<String> {
    let mut buf = match limit {
        Some(limit) => MessageBuffer::with_limit(limit),
        None => MessageBuffer::new(),
    };

    start_message(&mut buf, 0, message_type)?;
    let metadata_id = start_metadata(&mut buf, 0)?;
    if let Some(metadata) = metadata {
        buf.push_str(metadata)?;
    }
    end_metadata(&mut buf)?;
    start_data(&mut buf, metadata_id, 0)?;
    if let Some(data) = data {
        buf.push_str(data)?;
    }
    end_data(&mut buf)?;
    end_message(&mut buf)?;

    Ok(buf.into_string())
}
