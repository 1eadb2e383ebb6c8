use crate::config::WhisperConfig;
use crate::types::Transcription;
use anyhow::{Context, Result};
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

/// OpenAI Whisper API のエンドポイント
const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// OpenAI Whisper API レスポンス
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

/// OpenAI Whisper API クライアント
///
/// 音声ファイルをアップロードして文字起こしテキストを取得する。
///
/// エラーの扱いは2段階に分かれる:
/// - 音声ファイルが存在しない → `Transcription::NotFound`（想定内）
/// - ネットワーク/認証/クォータなどのプロバイダ障害 → `Err`
pub struct WhisperClient {
    config: WhisperConfig,
    client: reqwest::Client,
}

impl WhisperClient {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Whisper API HTTPクライアント作成失敗")?;

        Ok(Self { config, client })
    }

    /// 音声ファイルを文字起こしする
    ///
    /// # Arguments
    ///
    /// * `path` - アップロード上限未満の音声ファイルのパス
    ///
    /// # Returns
    ///
    /// - `Transcription::Text` - 認識されたテキスト
    /// - `Transcription::NotFound` - ファイルが存在しない（ログ出力のみ）
    ///
    /// # Errors
    ///
    /// プロバイダ障害（HTTPエラー、タイムアウトなど）の場合にエラーを返す。
    pub async fn transcribe_file(&self, path: &Path) -> Result<Transcription> {
        if !path.is_file() {
            log::warn!("音声ファイルが見つかりません: {:?}", path);
            return Ok(Transcription::NotFound);
        }

        let audio_bytes = std::fs::read(path)
            .with_context(|| format!("音声ファイルの読み込みに失敗: {:?}", path))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        log::debug!(
            "Whisper API: {:?} をアップロード ({} バイト)",
            path,
            audio_bytes.len()
        );

        let part = multipart::Part::bytes(audio_bytes)
            .file_name(file_name)
            .mime_str(mime_for_extension(path))?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());

        if let Some(ref language) = self.config.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .multipart(form)
            .send()
            .await
            .context("Whisper API リクエスト失敗")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Whisper API エラー: {} - {}", status, error_text);
        }

        let whisper_response: WhisperResponse = response
            .json::<WhisperResponse>()
            .await
            .context("Whisper API レスポンスパース失敗")?;

        Ok(Transcription::Text(whisper_response.text))
    }
}

/// 拡張子からアップロード用のMIMEタイプを決める
fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
