use crate::types::SampleI16;
use anyhow::{Context, Result};
use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use std::path::Path;

/// FLAC エンコーダー
///
/// モノラルPCM音声データをFLAC形式に圧縮する。
/// パイプラインがセグメントをWhisper APIにアップロードする前の
/// 圧縮に使用する。可逆圧縮のため音質は劣化しない。
///
/// # Examples
///
/// ```no_run
/// # use meeting_scriber::flac_encoder::FlacEncoder;
/// let encoder = FlacEncoder::new(16000, 5);
/// let pcm_samples = vec![0i16; 16000];
/// let flac_data = encoder.encode(&pcm_samples).unwrap();
/// ```
pub struct FlacEncoder {
    sample_rate: u32,
    compression_level: u32,
}

impl FlacEncoder {
    /// 新しいFLACエンコーダーを作成
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - サンプリングレート (Hz)
    /// * `compression_level` - 圧縮レベル (0-8、範囲外は8に丸める)
    pub fn new(sample_rate: u32, compression_level: u32) -> Self {
        Self {
            sample_rate,
            compression_level: compression_level.min(8),
        }
    }

    /// PCM音声データをFLAC形式にエンコード
    ///
    /// # Arguments
    ///
    /// * `samples` - PCM音声サンプル（16bit符号付き整数、モノラル）
    ///
    /// # Returns
    ///
    /// FLACエンコードされたバイナリデータ。空入力には空のバイト列を返す。
    ///
    /// # Errors
    ///
    /// エンコードに失敗した場合にエラーを返す。
    pub fn encode(&self, samples: &[SampleI16]) -> Result<Vec<u8>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        // i16からi32に変換（flacencの要求）
        let samples_i32: Vec<i32> = samples.iter().map(|&s| s as i32).collect();

        let source = MemSource::from_samples(
            &samples_i32,
            1,  // チャンネル数（モノラル）
            16, // ビット深度
            self.sample_rate as usize,
        );

        let config = flacenc::config::Encoder::default();
        let verified_config = config
            .into_verified()
            .map_err(|e| anyhow::anyhow!("FLAC設定の検証に失敗: {:?}", e))?;

        let flac_stream = flacenc::encode_with_fixed_block_size(
            &verified_config,
            source,
            verified_config.block_size,
        )
        .map_err(|e| anyhow::anyhow!("FLACエンコードに失敗: {:?}", e))?;

        // バイト列に変換（ByteSinkを使用）
        let mut sink = ByteSink::new();
        flac_stream
            .write(&mut sink)
            .map_err(|e| anyhow::anyhow!("FLACストリームの書き込みに失敗: {:?}", e))?;

        Ok(sink.into_inner())
    }

    /// PCM音声データをFLACファイルとして書き出し
    ///
    /// # Arguments
    ///
    /// * `samples` - PCM音声サンプル
    /// * `path` - 出力先のパス
    pub fn encode_to_file<P: AsRef<Path>>(&self, samples: &[SampleI16], path: P) -> Result<()> {
        let flac_data = self.encode(samples)?;
        std::fs::write(path.as_ref(), &flac_data)
            .with_context(|| format!("FLACファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        log::info!(
            "FLACファイル書き出し完了: {:?} ({} サンプル → {} バイト)",
            path.as_ref(),
            samples.len(),
            flac_data.len()
        );
        Ok(())
    }

    /// 圧縮レベルを取得
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    /// サンプリングレートを取得
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
