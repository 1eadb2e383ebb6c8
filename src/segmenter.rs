use crate::config::SegmenterConfig;
use crate::types::{AudioClip, AudioSegment, SampleI16};

/// 無音ベースのオーディオセグメンタ
///
/// クリップを固定幅の窓に分割し、窓ごとのRMSエネルギーをdBFSに
/// 換算して無音かどうかを判定する。`min_silence_ms` 以上続く無音の
/// 区間を区切りとして、非無音スパンを切り出す。
///
/// # アルゴリズム
///
/// 1. `window_ms` 幅の窓ごとにRMSを計算
/// 2. デシベルに変換: `20 * log10(rms)`
/// 3. 閾値未満の窓を無音と判定
/// 4. `min_silence_ms` 以上連続する無音区間を区切りとし、
///    その補集合を非無音スパンとして返す
///
/// 短い無音（閾値未満の長さ）ではスパンは分割されない。
///
/// # エッジケース
///
/// - 全体が無音のクリップ → 空のリスト
/// - 区切りとなる無音が存在しないクリップ → クリップ全体の1スパン
pub fn detect_nonsilent(clip: &AudioClip, config: &SegmenterConfig) -> Vec<(u64, u64)> {
    let (spans, window_samples) = nonsilent_window_spans(clip, config);
    spans
        .into_iter()
        .map(|(start_w, end_w)| {
            let (start, end) = span_sample_range(start_w, end_w, window_samples, clip);
            (
                samples_to_ms(start, clip.sample_rate),
                samples_to_ms(end, clip.sample_rate),
            )
        })
        .collect()
}

/// 非無音スパンに対応する音声セグメントを時系列順に切り出す
pub fn segment(clip: &AudioClip, config: &SegmenterConfig) -> Vec<AudioSegment> {
    let (spans, window_samples) = nonsilent_window_spans(clip, config);
    spans
        .into_iter()
        .map(|(start_w, end_w)| {
            let (start, end) = span_sample_range(start_w, end_w, window_samples, clip);
            AudioSegment {
                start_ms: samples_to_ms(start, clip.sample_rate),
                end_ms: samples_to_ms(end, clip.sample_rate),
                samples: clip.samples[start..end].to_vec(),
            }
        })
        .collect()
}

/// 非無音スパンを窓インデックスの範囲 [start, end) で検出する
///
/// スパン境界は窓インデックスのまま返し、ミリ秒への変換はサンプル
/// インデックス経由で行う。窓幅が `window_ms` ちょうどにならない
/// サンプリングレート（22050 Hz など）でも、ミリ秒とサンプルの
/// 対応がずれない。
fn nonsilent_window_spans(
    clip: &AudioClip,
    config: &SegmenterConfig,
) -> (Vec<(usize, usize)>, usize) {
    if clip.samples.is_empty() || clip.sample_rate == 0 {
        return (Vec::new(), 1);
    }

    let window_ms = config.window_ms.max(1) as u64;
    let window_samples = ((clip.sample_rate as u64 * window_ms) / 1000).max(1) as usize;

    // 窓ごとの無音判定
    let silent_windows: Vec<bool> = clip
        .samples
        .chunks(window_samples)
        .map(|w| rms_to_db(calculate_rms(w)) < config.silence_threshold_db)
        .collect();

    // 全体が無音なら空を返す
    if silent_windows.iter().all(|&s| s) {
        log::debug!("クリップ全体が無音 ({} ms)", clip.duration_ms());
        return (Vec::new(), window_samples);
    }

    // min_silence_ms 以上連続する無音区間を収集
    let min_silence_windows = (config.min_silence_ms as u64 / window_ms).max(1) as usize;
    let mut silences: Vec<(usize, usize)> = Vec::new(); // 窓インデックスの [start, end)
    let mut run_start: Option<usize> = None;

    for (i, &silent) in silent_windows.iter().enumerate() {
        match (silent, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= min_silence_windows {
                    silences.push((start, i));
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        if silent_windows.len() - start >= min_silence_windows {
            silences.push((start, silent_windows.len()));
        }
    }

    // 無音区間の補集合が非無音スパン
    let mut spans = Vec::new();
    let mut cursor = 0usize;
    for (start, end) in silences {
        if start > cursor {
            spans.push((cursor, start));
        }
        cursor = end;
    }
    if cursor < silent_windows.len() {
        spans.push((cursor, silent_windows.len()));
    }

    log::debug!("非無音スパンを {} 件検出", spans.len());
    (spans, window_samples)
}

/// 窓インデックスの範囲をサンプルインデックスの範囲に変換する
///
/// 末尾の窓は端数になり得るため、クリップ長でクランプする。
fn span_sample_range(
    start_window: usize,
    end_window: usize,
    window_samples: usize,
    clip: &AudioClip,
) -> (usize, usize) {
    let len = clip.samples.len();
    let start = (start_window * window_samples).min(len);
    let end = (end_window * window_samples).min(len);
    (start, end)
}

fn samples_to_ms(sample_index: usize, sample_rate: u32) -> u64 {
    (sample_index as u64 * 1000) / sample_rate as u64
}

/// RMS (Root Mean Square) を計算
fn calculate_rms(samples: &[SampleI16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_of_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_of_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

/// RMSをデシベル (dBFS) に変換
fn rms_to_db(rms: f32) -> f32 {
    if rms <= 0.0 {
        return -100.0; // 無音の場合の最小値
    }
    20.0 * rms.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 16000;

    fn default_config() -> SegmenterConfig {
        SegmenterConfig::default()
    }

    /// 指定ミリ秒分のサイン波サンプルを生成
    fn tone(duration_ms: u64) -> Vec<i16> {
        let n = (SAMPLE_RATE as u64 * duration_ms / 1000) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 10000.0) as i16
            })
            .collect()
    }

    /// 指定ミリ秒分の無音サンプルを生成
    fn silence(duration_ms: u64) -> Vec<i16> {
        vec![0i16; (SAMPLE_RATE as u64 * duration_ms / 1000) as usize]
    }

    fn clip(samples: Vec<i16>) -> AudioClip {
        AudioClip {
            samples,
            sample_rate: SAMPLE_RATE,
        }
    }

    #[test]
    fn test_entirely_silent_yields_empty() {
        let clip = clip(silence(2000));
        assert!(detect_nonsilent(&clip, &default_config()).is_empty());
        assert!(segment(&clip, &default_config()).is_empty());
    }

    #[test]
    fn test_empty_clip_yields_empty() {
        let clip = clip(vec![]);
        assert!(detect_nonsilent(&clip, &default_config()).is_empty());
    }

    #[test]
    fn test_no_silence_yields_whole_clip() {
        let clip = clip(tone(2000));
        let spans = detect_nonsilent(&clip, &default_config());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].0, 0);
        assert_eq!(spans[0].1, 2000);
    }

    #[test]
    fn test_long_silence_splits_spans() {
        // 音声1秒 + 無音1秒 + 音声1秒 → 2スパン
        let mut samples = tone(1000);
        samples.extend(silence(1000));
        samples.extend(tone(1000));
        let clip = clip(samples);

        let spans = detect_nonsilent(&clip, &default_config());
        assert_eq!(spans.len(), 2);

        // 時系列順で重なりがない
        assert!(spans[0].0 < spans[0].1);
        assert!(spans[0].1 <= spans[1].0);
        assert!(spans[1].0 < spans[1].1);

        // 1つ目は先頭から、2つ目は無音明けから
        assert_eq!(spans[0].0, 0);
        assert!(spans[1].0 >= 1000 && spans[1].0 <= 2100);
    }

    #[test]
    fn test_short_silence_does_not_split() {
        // 閾値(500ms)未満の無音では分割されない
        let mut samples = tone(1000);
        samples.extend(silence(200));
        samples.extend(tone(1000));
        let clip = clip(samples);

        let spans = detect_nonsilent(&clip, &default_config());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].0, 0);
        assert_eq!(spans[0].1, 2200);
    }

    #[test]
    fn test_leading_silence_trimmed() {
        // 先頭の長い無音はスパンに含まれない
        let mut samples = silence(1000);
        samples.extend(tone(1000));
        let clip = clip(samples);

        let spans = detect_nonsilent(&clip, &default_config());
        assert_eq!(spans.len(), 1);
        assert!(spans[0].0 >= 1000 - 20); // 窓境界の誤差を許容
        assert_eq!(spans[0].1, 2000);
    }

    #[test]
    fn test_segments_match_spans() {
        let mut samples = tone(1000);
        samples.extend(silence(1000));
        samples.extend(tone(500));
        let clip = clip(samples);

        let config = default_config();
        let spans = detect_nonsilent(&clip, &config);
        let segments = segment(&clip, &config);

        assert_eq!(spans.len(), segments.len());
        for (span, seg) in spans.iter().zip(segments.iter()) {
            assert_eq!(span.0, seg.start_ms);
            assert_eq!(span.1, seg.end_ms);

            // サンプル数がスパン長に一致する
            let expected =
                ((seg.end_ms - seg.start_ms) * SAMPLE_RATE as u64 / 1000) as usize;
            assert_eq!(seg.samples.len(), expected);
        }
    }

    #[test]
    fn test_fractional_window_rate_stays_in_bounds() {
        // 22050 Hz では 10 ms 窓が 220.5 サンプルとなり整数に丸められる。
        // 末尾付近にだけ音があるクリップでも範囲外参照しない
        let rate = 22050u32;
        let mut samples = vec![0i16; 219_781];
        let len = samples.len();
        for s in &mut samples[len - 221..] {
            *s = 10000;
        }
        let clip = AudioClip {
            samples,
            sample_rate: rate,
        };

        let segments = segment(&clip, &default_config());
        assert_eq!(segments.len(), 1);

        let seg = &segments[0];
        assert_eq!(seg.samples.len(), 221);
        assert!(seg.start_ms < seg.end_ms);
        assert!(seg.end_ms <= clip.duration_ms());
    }

    #[test]
    fn test_low_amplitude_counts_as_silence() {
        // 閾値(-32 dBFS)を下回る小さな振幅は無音扱い
        let n = (SAMPLE_RATE as u64 * 2000 / 1000) as usize;
        let samples: Vec<i16> = (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 100.0) as i16
            })
            .collect();
        let clip = clip(samples);

        assert!(detect_nonsilent(&clip, &default_config()).is_empty());
    }
}
