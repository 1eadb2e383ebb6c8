use crate::config::Config;
use crate::decoder;
use crate::flac_encoder::FlacEncoder;
use crate::minutes::MinutesClient;
use crate::normalizer;
use crate::resolver;
use crate::segmenter;
use crate::types::{AudioSegment, MediaFile, SampleI16, Transcription};
use crate::whisper_api::WhisperClient;
use crate::writer;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// 会議録作成パイプライン
///
/// リゾルバ → ノーマライザ → セグメンタ → 文字起こし → 議事録生成 →
/// ライタを、この順で同期的に実行する。各ステージは前段の完了まで
/// ブロックし、ファイル間・セグメント間の並列処理は行わない。
///
/// # エラーの扱い
///
/// - 入力ディレクトリなし: 警告を出して正常終了（何も書き込まない）
/// - 文字起こし時に音声ファイルなし: そのセグメントをスキップ
/// - プロバイダ障害: そのファイルの処理を中断し、次のファイルへ進む
///
/// リトライはどこにもない。
pub struct Scriber {
    config: Config,
    whisper: WhisperClient,
    minutes: MinutesClient,
}

impl Scriber {
    pub fn new(config: Config) -> Result<Self> {
        let whisper = WhisperClient::new(config.whisper.clone())?;
        let api_key = config.minutes.resolve_api_key(&config.whisper).to_string();
        let minutes = MinutesClient::new(&config.minutes, &api_key)?;

        Ok(Self {
            config,
            whisper,
            minutes,
        })
    }

    /// パイプライン全体を実行する
    ///
    /// 入力ディレクトリの全対象ファイルをファイル名順に処理する。
    /// 1つのファイルの失敗は記録して次のファイルに進む。
    pub async fn run(&self) -> Result<()> {
        let media_files = resolver::resolve_media_files(&self.config.input)?;
        if media_files.is_empty() {
            log::info!("処理対象がないため終了します");
            return Ok(());
        }

        for media in &media_files {
            log::info!("処理開始: {}", media.display_name());
            if let Err(e) = self.process_file(media).await {
                // このファイルは中断するが、残りのファイルは処理を続ける
                log::error!("{} の処理に失敗: {:#}", media.display_name(), e);
            }
        }

        Ok(())
    }

    /// 1つのメディアファイルを処理する
    async fn process_file(&self, media: &MediaFile) -> Result<()> {
        let output_dir = Path::new(&self.config.output.output_dir);
        ensure_dir(output_dir)?;

        // 1. 正規化（動画なら音声抽出、上限超過なら再エンコード）
        let audio = normalizer::normalize(media, &self.config.normalizer, output_dir)?;

        // 2. デコードして無音ベースで分割
        let clip = decoder::decode_media(&audio.path)?;
        let segments = segmenter::segment(&clip, &self.config.segmenter);

        if segments.is_empty() {
            log::info!("非無音区間がないためスキップ: {}", audio.display_name());
            return Ok(());
        }

        log::info!("{} 個のセグメントを処理します", segments.len());

        // 3. セグメントごとに文字起こし → 議事録生成 → 書き出し
        for (index, segment) in segments.iter().enumerate() {
            self.process_segment(index, segment, clip.sample_rate, media, output_dir)
                .await?;
        }

        Ok(())
    }

    /// 1つのセグメントを処理する
    ///
    /// セグメントを一時FLACファイルに圧縮して文字起こしに渡す。
    /// 一時ファイルはスコープを抜けるときに必ず削除される
    /// （エラーでの早期リターンを含む）。
    async fn process_segment(
        &self,
        index: usize,
        segment: &AudioSegment,
        sample_rate: u32,
        source: &MediaFile,
        output_dir: &Path,
    ) -> Result<()> {
        log::debug!(
            "セグメント {}: {} - {} ms",
            index,
            segment.start_ms,
            segment.end_ms
        );

        let temp = TempSegment::export(
            output_dir,
            index,
            &segment.samples,
            sample_rate,
            self.config.normalizer.compression_level,
        )?;

        let transcription = self.whisper.transcribe_file(temp.path()).await?;
        let text = match transcription {
            Transcription::Text(text) => text,
            Transcription::NotFound => {
                log::warn!("セグメント {} の文字起こしがありません", index);
                return Ok(());
            }
        };

        if text.trim().is_empty() {
            log::warn!("セグメント {} の文字起こしが空です", index);
            return Ok(());
        }

        // 文字起こしを書き出し（上書き）、整形版を追記
        let transcript_path = output_dir.join(&self.config.output.transcript_file);
        writer::write_transcript(&text, &transcript_path)?;

        let full_transcript_path = output_dir.join(&self.config.output.full_transcript_file);
        writer::append_full_transcript(&text, &full_transcript_path)?;

        // 議事録を生成して追記
        let minutes = self
            .minutes
            .generate(&text, &source.display_name())
            .await?;
        log::info!("議事録を生成: {:?}", minutes);

        let minutes_path = output_dir.join(&self.config.output.minutes_file);
        writer::append_minutes(&minutes, &minutes_path)?;

        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", dir))?;
    }
    Ok(())
}

/// 一時セグメントファイル
///
/// セグメントのPCMをアップロード用に `temp_<n>.flac` として圧縮して
/// 書き出し、ドロップ時にファイルを削除するガード。早期リターンでも
/// 削除が保証される。
struct TempSegment {
    path: PathBuf,
}

impl TempSegment {
    /// セグメントをFLACファイルとして書き出す
    fn export(
        output_dir: &Path,
        index: usize,
        samples: &[SampleI16],
        sample_rate: u32,
        compression_level: u32,
    ) -> Result<Self> {
        let path = output_dir.join(format!("temp_{}.flac", index));

        let encoder = FlacEncoder::new(sample_rate, compression_level);
        encoder
            .encode_to_file(samples, &path)
            .with_context(|| format!("一時ファイルの書き出しに失敗: {:?}", path))?;

        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempSegment {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::error!("一時ファイルの削除に失敗 {:?}: {}", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputConfig, OutputConfig};
    use tempfile::TempDir;

    fn test_config(input_dir: &Path, output_dir: &Path) -> Config {
        Config {
            input: InputConfig {
                input_dir: input_dir.display().to_string(),
                ..InputConfig::default()
            },
            output: OutputConfig {
                output_dir: output_dir.display().to_string(),
                ..OutputConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_temp_segment_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let samples = vec![100i16; 1600];

        let path = {
            let temp = TempSegment::export(temp_dir.path(), 0, &samples, 16000, 5).unwrap();
            let path = temp.path().to_path_buf();
            assert!(path.is_file());
            assert_eq!(path.file_name().unwrap(), "temp_0.flac");

            // アップロード対象は有効なFLACストリームである
            assert!(claxon::FlacReader::open(&path).is_ok());
            path
        };

        // スコープを抜けると削除されている
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_segment_removed_on_early_exit() {
        let temp_dir = TempDir::new().unwrap();

        fn failing_scope(dir: &Path) -> Result<PathBuf> {
            let temp = TempSegment::export(dir, 1, &[0i16; 160], 16000, 5)?;
            let path = temp.path().to_path_buf();
            anyhow::bail!("途中で失敗 ({:?})", path);
        }

        let result = failing_scope(temp_dir.path());
        assert!(result.is_err());

        // エラーでの早期リターンでも一時ファイルは残らない
        assert!(!temp_dir.path().join("temp_1.flac").exists());
    }

    #[tokio::test]
    async fn test_run_with_missing_input_dir_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("out");
        let config = test_config(Path::new("/nonexistent/input"), &output_dir);

        let scriber = Scriber::new(config).unwrap();
        scriber.run().await.unwrap();

        // 出力ディレクトリすら作成されない
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_run_with_empty_input_dir_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("in");
        let output_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&input_dir).unwrap();

        let scriber = Scriber::new(test_config(&input_dir, &output_dir)).unwrap();
        scriber.run().await.unwrap();

        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_silent_audio_skips_transcription_and_writes_no_text() {
        // 全体が無音の入力はセグメントが出ず、APIにも出力にも到達しない
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("in");
        let output_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&input_dir).unwrap();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wav_path = input_dir.join("silent.wav");
        let mut writer = hound::WavWriter::create(&wav_path, spec).unwrap();
        for _ in 0..32000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let scriber = Scriber::new(test_config(&input_dir, &output_dir)).unwrap();
        scriber.run().await.unwrap();

        // 出力ディレクトリは作られるが、テキスト出力は何もない
        assert!(!output_dir.join("transcript.txt").exists());
        assert!(!output_dir.join("full_transcript.txt").exists());
        assert!(!output_dir.join("minutes.txt").exists());
    }
}
