use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub whisper: WhisperConfig,
    #[serde(default)]
    pub minutes: MinutesConfig,
}

/// 入力設定
///
/// 入力ディレクトリと対象とする拡張子。
///
/// # デフォルト値
///
/// - `input_dir`: "in"
/// - `video_extensions`: [".mp4", ".mkv"]
/// - `audio_extensions`: [".mp3", ".wav", ".flac"]
///
/// `.flac` はデコーダが直接扱えるため既定の対象に含めている。
/// FLACで録音された会議も設定変更なしで処理できる。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
}

/// 出力設定
///
/// 出力ディレクトリと各出力ファイル名。
///
/// # デフォルト値
///
/// - `output_dir`: "out"
/// - `transcript_file`: "transcript.txt"
/// - `full_transcript_file`: "full_transcript.txt"
/// - `minutes_file`: "minutes.txt"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_transcript_file")]
    pub transcript_file: String,
    #[serde(default = "default_full_transcript_file")]
    pub full_transcript_file: String,
    #[serde(default = "default_minutes_file")]
    pub minutes_file: String,
}

/// ノーマライザ設定
///
/// 動画からの音声抽出と、アップロード上限を超える音声の
/// 再エンコードに関する設定。
///
/// # デフォルト値
///
/// - `upload_limit_bytes`: 26_214_400 (25 MiB、Whisper APIの上限)
/// - `target_sample_rate`: 16000 Hz
/// - `compression_level`: 5 (アップロード用FLACの圧縮レベル、0-8)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_upload_limit_bytes")]
    pub upload_limit_bytes: u64,
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

/// セグメンタ設定
///
/// 無音検出に関する設定。
///
/// # デフォルト値
///
/// - `min_silence_ms`: 500 ms（これ未満の無音では区切らない）
/// - `silence_threshold_db`: -32.0 dBFS
/// - `window_ms`: 10 ms（エネルギー解析の窓幅）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmenterConfig {
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u32,
    #[serde(default = "default_silence_threshold_db")]
    pub silence_threshold_db: f32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
}

/// OpenAI Whisper API 設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhisperConfig {
    /// OpenAI API Key
    #[serde(default)]
    pub api_key: String,
    /// Whisper モデル名（通常 "whisper-1"）
    #[serde(default = "default_whisper_model")]
    pub model: String,
    /// 言語コード（"ja", "en" など）。省略可能
    pub language: Option<String>,
    /// リクエストのタイムアウト（秒）
    #[serde(default = "default_whisper_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// 議事録生成（テキスト生成API）設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinutesConfig {
    /// OpenAI API Key（空の場合は whisper.api_key を使用）
    #[serde(default)]
    pub api_key: String,
    /// テキスト生成モデル名
    #[serde(default = "default_minutes_model")]
    pub model: String,
    /// リクエストのタイムアウト（秒）
    #[serde(default = "default_minutes_timeout_seconds")]
    pub timeout_seconds: u64,
}

// Default functions
fn default_input_dir() -> String {
    "in".to_string()
}

fn default_video_extensions() -> Vec<String> {
    vec![".mp4".to_string(), ".mkv".to_string()]
}

fn default_audio_extensions() -> Vec<String> {
    vec![".mp3".to_string(), ".wav".to_string(), ".flac".to_string()]
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_transcript_file() -> String {
    "transcript.txt".to_string()
}

fn default_full_transcript_file() -> String {
    "full_transcript.txt".to_string()
}

fn default_minutes_file() -> String {
    "minutes.txt".to_string()
}

fn default_upload_limit_bytes() -> u64 {
    26_214_400 // 25 MiB - Whisper APIのアップロード上限
}

fn default_target_sample_rate() -> u32 {
    16000
}

fn default_compression_level() -> u32 {
    5 // バランス型（推奨）
}

fn default_min_silence_ms() -> u32 {
    500
}

fn default_silence_threshold_db() -> f32 {
    -32.0
}

fn default_window_ms() -> u32 {
    10
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_whisper_timeout_seconds() -> u64 {
    30
}

fn default_minutes_model() -> String {
    "gpt-4".to_string()
}

fn default_minutes_timeout_seconds() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            normalizer: NormalizerConfig::default(),
            segmenter: SegmenterConfig::default(),
            whisper: WhisperConfig::default(),
            minutes: MinutesConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            video_extensions: default_video_extensions(),
            audio_extensions: default_audio_extensions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            transcript_file: default_transcript_file(),
            full_transcript_file: default_full_transcript_file(),
            minutes_file: default_minutes_file(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            upload_limit_bytes: default_upload_limit_bytes(),
            target_sample_rate: default_target_sample_rate(),
            compression_level: default_compression_level(),
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: default_min_silence_ms(),
            silence_threshold_db: default_silence_threshold_db(),
            window_ms: default_window_ms(),
        }
    }
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_whisper_model(),
            language: None,
            timeout_seconds: default_whisper_timeout_seconds(),
        }
    }
}

impl Default for MinutesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_minutes_model(),
            timeout_seconds: default_minutes_timeout_seconds(),
        }
    }
}

impl MinutesConfig {
    /// 議事録生成用のAPIキーを解決する
    ///
    /// 自身のキーが空の場合はWhisper側のキーを流用する。
    pub fn resolve_api_key<'a>(&'a self, whisper: &'a WhisperConfig) -> &'a str {
        if self.api_key.is_empty() {
            &whisper.api_key
        } else {
            &self.api_key
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use meeting_scriber::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// デフォルト値を持つ設定ファイルを生成する。
    /// 既存のファイルは上書きされる。
    ///
    /// # Arguments
    ///
    /// * `path` - 出力先のパス
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}
