//! meeting-scriber - 会議録音から議事録を生成するパイプライン
//!
//! このクレートは、入力ディレクトリの会議録音（動画/音声）を
//! OpenAI Whisper APIで文字起こしし、テキスト生成APIで議事録
//! （要約・重要ポイント・アクションアイテム・センチメント分析）を
//! 生成するバッチパイプラインを提供します。
//!
//! # 主な機能
//!
//! - **メディア探索**: 入力ディレクトリから対象ファイルを列挙
//! - **正規化**: 動画からの音声抽出、アップロード上限超過時の再エンコード
//! - **無音セグメンテーション**: エネルギー閾値による非無音区間の切り出し
//! - **文字起こし**: OpenAI Whisper APIへのアップロード
//! - **議事録生成**: 4つの抽出タスクをtemperature 0で実行
//!
//! # アーキテクチャ
//!
//! ```text
//! [in/] → [Resolver] → [Normalizer] → [Segmenter]
//!                                          ↓
//!                                  [temp_<n>.flac]
//!                                          ↓
//!                                    [Whisper API]
//!                                          ↓
//!                                  [Minutes (GPT-4)]
//!                                          ↓
//!                  [out/transcript.txt / full_transcript.txt / minutes.txt]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use meeting_scriber::config::Config;
//!
//! // 設定ファイルを読み込み
//! let config = Config::load_or_default("config.toml").unwrap();
//!
//! // またはデフォルト設定を生成
//! Config::write_default("config.toml").unwrap();
//! ```

pub mod config;
pub mod decoder;
pub mod flac_encoder;
pub mod minutes;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod segmenter;
pub mod types;
pub mod whisper_api;
pub mod writer;
