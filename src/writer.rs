use crate::types::Minutes;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// 議事録レコードを人間可読なテキストとして追記する
///
/// 各フィールドを `key: value` の1行で書き出し、レコードの末尾に
/// 空行を1つ入れる。ファイルが既に存在する場合は上書きせず追記する。
pub fn append_minutes(minutes: &Minutes, path: &Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("議事録ファイルのオープンに失敗: {:?}", path))?;

    for (key, value) in minutes.fields() {
        writeln!(file, "{}: {}", key, value)
            .with_context(|| "議事録ファイルへの書き込みに失敗")?;
    }
    writeln!(file).with_context(|| "議事録ファイルへの書き込みに失敗")?;

    log::info!("議事録を書き出しました: {:?}", path);
    Ok(())
}

/// 生の文字起こしテキストをファイルに書き出す（上書き）
pub fn write_transcript(text: &str, path: &Path) -> Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("文字起こしファイルの書き込みに失敗: {:?}", path))?;
    Ok(())
}

/// 素朴な文分割
///
/// テキストをリテラルの `.` で分割し、各片の前後の空白を除いて返す。
/// 空になった片は捨てる。
///
/// 略語（"Mr."）・小数（"3.14"）・省略記号（"..."）は正しく扱えない。
/// これは元システムの仕様をそのまま保った既知の制限であり、
/// 本物の文境界検出に置き換える場合は挙動の変更を明示すること。
pub fn naive_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// 文字起こしを1行1文の形式でフル・トランスクリプトに追記する
///
/// `naive_sentences` で分割したすべての片を、それぞれ1行として
/// 追記する。
///
/// # Returns
///
/// 追記した行数
pub fn append_full_transcript(transcript: &str, path: &Path) -> Result<usize> {
    let sentences = naive_sentences(transcript);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("フル・トランスクリプトのオープンに失敗: {:?}", path))?;

    for sentence in &sentences {
        writeln!(file, "{}", sentence)
            .with_context(|| "フル・トランスクリプトへの書き込みに失敗")?;
    }

    log::debug!("フル・トランスクリプトに {} 行を追記", sentences.len());
    Ok(sentences.len())
}
