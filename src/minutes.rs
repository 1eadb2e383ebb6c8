use crate::config::MinutesConfig;
use crate::types::Minutes;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// OpenAI Chat Completions API のエンドポイント
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// 議事録の抽出タスクの数
pub const TASK_COUNT: usize = 4;

/// 抽出タスクのテーブル: (キー, システムプロンプト)
///
/// 4つのタスクは互いに独立で、順序は結果に影響しない。
/// キーは議事録レコードのフィールド名に対応する。
pub const MINUTES_TASKS: [(&str, &str); TASK_COUNT] = [
    (
        "abstract_summary",
        "You are a highly skilled AI trained in language comprehension and summarization. \
         I would like you to read the following text and summarize it into a concise abstract \
         paragraph. Aim to retain the most important points, providing a coherent and readable \
         summary that could help a person understand the main points of the discussion without \
         needing to read the entire text. Please avoid unnecessary details or tangential points.",
    ),
    (
        "key_points",
        "You are a proficient AI with a specialty in distilling information into key points. \
         Based on the following text, identify and list the main points that were discussed or \
         brought up. These should be the most important ideas, findings, or topics that are \
         crucial to the essence of the discussion. Your goal is to provide a list that someone \
         could read to quickly understand what was talked about.",
    ),
    (
        "action_item_extraction",
        "You are an AI expert in analyzing conversations and extracting action items. Please \
         review the text and identify any tasks, assignments, or actions that were agreed upon \
         or mentioned as needing to be done. These could be tasks assigned to specific \
         individuals, or general actions that the group has decided to take. Please list these \
         action items clearly and concisely.",
    ),
    (
        "sentiment_analysis",
        "As an AI with expertise in language and emotion analysis, your task is to analyze the \
         sentiment of the following text. Please consider the overall tone of the discussion, \
         the emotion conveyed by the language used, and the context in which words and phrases \
         are used. Indicate whether the sentiment is generally positive, negative, or neutral, \
         and provide brief explanations for your analysis where possible.",
    ),
];

// OpenAI互換のリクエスト/レスポンス
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// 議事録ジェネレータ
///
/// 1つの文字起こしテキストに対して4つの抽出タスク
/// （要約・重要ポイント・アクションアイテム・センチメント分析）を
/// 順番に実行し、議事録レコードを生成する。
///
/// サンプリングは決定的にするため temperature は常に 0 で送信する。
/// 各レスポンスは先頭の choice のみを使用する。
pub struct MinutesClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl MinutesClient {
    /// 新しいクライアントを作成
    ///
    /// # Arguments
    ///
    /// * `config` - 議事録生成の設定
    /// * `api_key` - 解決済みのAPIキー（`MinutesConfig::resolve_api_key` を参照）
    pub fn new(config: &MinutesConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("テキスト生成API HTTPクライアント作成失敗")?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            client,
        })
    }

    /// 文字起こしから議事録レコードを生成する
    ///
    /// # Arguments
    ///
    /// * `transcript` - 文字起こしテキスト
    /// * `source_filename` - 元の音声ファイル名（レコードに記録される）
    ///
    /// # Errors
    ///
    /// いずれかのタスクでプロバイダ障害が発生した場合にエラーを返す。
    /// その場合レコードは生成されない（アイテム単位で致命的）。
    pub async fn generate(&self, transcript: &str, source_filename: &str) -> Result<Minutes> {
        let datetime = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();

        let mut outputs: Vec<String> = Vec::with_capacity(TASK_COUNT);
        for (key, instruction) in MINUTES_TASKS {
            log::info!("議事録タスクを実行: {}", key);
            let output = self
                .extract_info(instruction, transcript)
                .await
                .with_context(|| format!("議事録タスクに失敗: {}", key))?;
            outputs.push(output);
        }

        let mut it = outputs.into_iter();
        Ok(Minutes {
            filename: source_filename.to_string(),
            datetime,
            abstract_summary: it.next().unwrap_or_default(),
            key_points: it.next().unwrap_or_default(),
            action_item_extraction: it.next().unwrap_or_default(),
            sentiment_analysis: it.next().unwrap_or_default(),
        })
    }

    /// 1つのシステムプロンプトで抽出を実行する
    ///
    /// システムプロンプトと文字起こしの2メッセージを temperature 0 で送信し、
    /// 先頭の choice のテキストを返す。
    async fn extract_info(&self, instruction: &str, transcript: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcript.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("テキスト生成API リクエスト失敗")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("テキスト生成API エラー: {} - {}", status, error_text);
        }

        let chat_response: ChatResponse = response
            .json::<ChatResponse>()
            .await
            .context("テキスト生成API レスポンスパース失敗")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("テキスト生成API レスポンスに choice がありません"))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_table_keys() {
        // 4タスクのキーが議事録フィールドと対応し、重複がない
        let keys: Vec<&str> = MINUTES_TASKS.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "abstract_summary",
                "key_points",
                "action_item_extraction",
                "sentiment_analysis",
            ]
        );

        // プロンプトはすべて非空
        for (_, instruction) in MINUTES_TASKS {
            assert!(!instruction.is_empty());
        }
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "instruction".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "transcript".to_string(),
                },
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "transcript");
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "最初の候補" } },
                { "message": { "role": "assistant", "content": "2番目の候補" } }
            ]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        // 先頭のchoiceのみを使用する
        assert_eq!(response.choices[0].message.content, "最初の候補");
    }

    #[test]
    fn test_datetime_format_is_iso8601() {
        let datetime = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        // 2024-01-01T00:00:00 の形式（秒精度）
        assert_eq!(datetime.len(), 19);
        assert_eq!(&datetime[4..5], "-");
        assert_eq!(&datetime[10..11], "T");
        assert_eq!(&datetime[13..14], ":");
    }
}
