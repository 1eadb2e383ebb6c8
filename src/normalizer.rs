use crate::config::NormalizerConfig;
use crate::decoder;
use crate::types::{MediaFile, MediaKind, SampleI16};
use anyhow::{Context, Result};
use std::path::Path;

/// メディアノーマライザ
///
/// 入力を後段（デコード→セグメンテーション）が扱える音声ファイルに
/// 揃える。
///
/// - 動画コンテナ: 音声トラックを抽出してWAVファイルに書き出す
/// - アップロード上限未満の音声: そのまま通す（バイト単位で無変更）
/// - 上限以上の音声: 16kHzモノラルにリサンプリングしてWAVで再エンコード
///
/// 再エンコードの出力は出力ディレクトリに `<元の名前>.wav` として
/// 置かれる。中間ファイルはパイプライン自身のデコーダが再読込する
/// ため、必ずデコード可能な形式で書く。アップロード時の圧縮は
/// セグメント書き出し側が行う。正規化済みの出力を再度正規化しても
/// サンプリングレートは変わらない（冪等）。
///
/// # Errors
///
/// 元ファイルが開けない場合は「ファイルが見つからない」エラーを返す。
/// リトライは行わない。
pub fn normalize(
    media: &MediaFile,
    config: &NormalizerConfig,
    output_dir: &Path,
) -> Result<MediaFile> {
    if !media.path.is_file() {
        anyhow::bail!("ファイルが見つかりません: {:?}", media.path);
    }

    match media.kind {
        MediaKind::Video => {
            let extracted = extract_audio(media, output_dir)?;
            // 抽出結果にも上限チェックを適用する
            normalize_audio(&extracted, config, output_dir)
        }
        MediaKind::Audio => normalize_audio(media, config, output_dir),
    }
}

/// 動画コンテナから音声トラックを抽出してWAVファイルに書き出す
fn extract_audio(media: &MediaFile, output_dir: &Path) -> Result<MediaFile> {
    log::info!("動画から音声を抽出: {:?}", media.path);

    let clip = decoder::decode_media(&media.path)?;
    let out_path = wav_path_for(&media.path, output_dir);

    ensure_output_dir(output_dir)?;
    write_wav_file(&clip.samples, clip.sample_rate, &out_path)?;

    Ok(MediaFile::new(out_path, MediaKind::Audio))
}

/// 上限以上の音声を16kHzモノラルに落としてWAVで再エンコードする
///
/// 上限未満の音声は無変更で返す。
fn normalize_audio(
    media: &MediaFile,
    config: &NormalizerConfig,
    output_dir: &Path,
) -> Result<MediaFile> {
    let size = std::fs::metadata(&media.path)
        .with_context(|| format!("ファイルが見つかりません: {:?}", media.path))?
        .len();

    if size < config.upload_limit_bytes {
        log::debug!(
            "サイズ {} バイトは上限未満のため変換なし: {:?}",
            size,
            media.path
        );
        return Ok(media.clone());
    }

    log::info!(
        "サイズ {} バイトが上限 {} バイトを超過。{} Hz モノラルに再エンコード: {:?}",
        size,
        config.upload_limit_bytes,
        config.target_sample_rate,
        media.path
    );

    let clip = decoder::decode_media(&media.path)?;
    let resampled = decoder::resample(&clip.samples, clip.sample_rate, config.target_sample_rate);

    let out_path = wav_path_for(&media.path, output_dir);
    ensure_output_dir(output_dir)?;
    write_wav_file(&resampled, config.target_sample_rate, &out_path)?;

    Ok(MediaFile::new(out_path, MediaKind::Audio))
}

/// モノラルPCMをWAVファイルとして書き出す
fn write_wav_file(samples: &[SampleI16], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("WAVファイルの作成に失敗: {:?}", path))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .with_context(|| "WAVファイルへのサンプル書き込みに失敗")?;
    }
    writer
        .finalize()
        .with_context(|| "WAVファイルのファイナライズに失敗")?;

    log::info!(
        "WAVファイル書き出し完了: {:?} ({} サンプル, {} Hz)",
        path,
        samples.len(),
        sample_rate
    );
    Ok(())
}

/// 出力ディレクトリ内の `<stem>.wav` パスを組み立てる
fn wav_path_for(source: &Path, output_dir: &Path) -> std::path::PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    output_dir.join(format!("{}.wav", stem))
}

fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", output_dir))?;
    }
    Ok(())
}
