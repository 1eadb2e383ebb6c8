use crate::config::InputConfig;
use crate::types::{MediaFile, MediaKind};
use anyhow::{Context, Result};
use std::path::Path;

/// 入力ディレクトリから対象メディアファイルを列挙する
///
/// 設定された拡張子（動画: .mp4/.mkv、音声: .mp3/.wav/.flac）に
/// 一致するファイルを、ファイル名の昇順で返す。
///
/// ディレクトリの列挙順は環境依存で不定なため、ソートによって
/// 処理順を決定的にする。一致するファイルが複数ある場合は
/// すべてを順に処理する（「最初の1件だけ」ではない）。
///
/// # Arguments
///
/// * `config` - 入力設定
///
/// # Returns
///
/// 一致したメディアファイルのリスト。入力ディレクトリが存在しない
/// 場合は警告ログを出して空のリストを返す（パイプラインは静かに
/// 終了する）。
pub fn resolve_media_files(config: &InputConfig) -> Result<Vec<MediaFile>> {
    let dir = Path::new(&config.input_dir);

    if !dir.is_dir() {
        log::warn!("入力ディレクトリが存在しません: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("入力ディレクトリの読み取りに失敗: {:?}", dir))?;

    for entry in entries {
        let entry = entry.with_context(|| "ディレクトリエントリの読み取りに失敗")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(kind) = classify(&path, config) {
            files.push(MediaFile::new(&path, kind));
        }
    }

    // ファイル名の昇順で処理順を固定する
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if files.is_empty() {
        log::warn!("対象のメディアファイルが見つかりません: {:?}", dir);
    } else {
        log::info!("{} 件のメディアファイルを検出", files.len());
    }

    Ok(files)
}

/// パスの拡張子からメディア種別を判定する
///
/// 拡張子の大文字小文字は区別しない。対象外の拡張子は `None`。
pub fn classify(path: &Path, config: &InputConfig) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let dotted = format!(".{}", ext);

    if config
        .video_extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(&dotted))
    {
        return Some(MediaKind::Video);
    }
    if config
        .audio_extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(&dotted))
    {
        return Some(MediaKind::Audio);
    }
    None
}
