use crate::types::{AudioClip, SampleI16};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// メディアファイルをデコードしてモノラルPCMクリップを得る
///
/// 動画コンテナ (.mp4, .mkv) と音声ファイル (.mp3, .wav, .flac) を
/// 同じ経路で扱う。最初の音声トラックをデコードし、複数チャンネルは
/// 平均でモノラルにダウンミックスする。サンプリングレートは
/// 元のまま保持する。
///
/// # Arguments
///
/// * `path` - メディアファイルのパス
///
/// # Errors
///
/// ファイルが開けない場合、音声トラックが存在しない場合、
/// デコーダの初期化に失敗した場合にエラーを返す。
pub fn decode_media(path: &Path) -> Result<AudioClip> {
    let file =
        File::open(path).with_context(|| format!("メディアファイルが見つかりません: {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("コンテナ形式の判定に失敗: {:?}", path))?;
    let mut format = probed.format;

    // 最初の音声トラックを選択
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow::anyhow!("音声トラックが見つかりません: {:?}", path))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .with_context(|| "デコーダの初期化に失敗")?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut samples: Vec<SampleI16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut channels = 1usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // 終端に到達
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).with_context(|| "パケットの読み取りに失敗"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    channels = spec.channels.count().max(1);
                    sample_rate = spec.rate;
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = &mut sample_buf {
                    buf.copy_interleaved_ref(decoded);
                    append_downmixed(&mut samples, buf.samples(), channels);
                }
            }
            // 破損パケットはスキップして継続
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("デコードエラーをスキップ: {}", e);
            }
            Err(e) => return Err(e).with_context(|| "デコードに失敗"),
        }
    }

    if sample_rate == 0 {
        anyhow::bail!("サンプリングレートを特定できません: {:?}", path);
    }

    log::info!(
        "デコード完了: {:?} ({} サンプル, {} Hz)",
        path,
        samples.len(),
        sample_rate
    );

    Ok(AudioClip {
        samples,
        sample_rate,
    })
}

/// インターリーブされたマルチチャンネルサンプルを平均でモノラル化して追加
fn append_downmixed(out: &mut Vec<SampleI16>, interleaved: &[i16], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks_exact(channels) {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        out.push((sum / channels as i32) as i16);
    }
}

/// サンプリングレートを変換する（最近傍インデックス方式）
///
/// ノーマライザが16kHzへのダウンサンプリングに使用する。
/// 変換元と変換先が同じ場合は入力をそのまま返す。
pub fn resample(samples: &[SampleI16], from_hz: u32, to_hz: u32) -> Vec<SampleI16> {
    if from_hz == to_hz || samples.is_empty() || from_hz == 0 || to_hz == 0 {
        return samples.to_vec();
    }

    let out_len = (samples.len() as u64 * to_hz as u64 / from_hz as u64) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = (i as u64 * from_hz as u64 / to_hz as u64) as usize;
        if src_idx >= samples.len() {
            break;
        }
        out.push(samples[src_idx]);
    }
    out
}
