use std::path::{Path, PathBuf};

/// 16ビット整数型のオーディオサンプル
///
/// PCM形式の音声データを表現するための型エイリアス。
/// -32768 から 32767 の範囲の値を取る。
pub type SampleI16 = i16;

/// メディアファイルの種別
///
/// 拡張子から推定される。動画コンテナは音声抽出の対象になる。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// 動画コンテナ (.mp4, .mkv)
    Video,
    /// 音声ファイル (.mp3, .wav, .flac)
    Audio,
}

/// 入力ディレクトリで発見されたメディアファイル
///
/// リゾルバが生成し、ノーマライザが消費する。
/// 動画の場合はノーマライザが音声ファイルに置き換える。
///
/// # Examples
///
/// ```
/// # use meeting_scriber::types::{MediaFile, MediaKind};
/// let media = MediaFile::new("in/meeting.mp4", MediaKind::Video);
/// assert_eq!(media.kind, MediaKind::Video);
/// ```
#[derive(Clone, Debug)]
pub struct MediaFile {
    /// ファイルパス
    pub path: PathBuf,
    /// 種別（動画/音声）
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn new<P: AsRef<Path>>(path: P, kind: MediaKind) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind,
        }
    }

    /// 表示用のファイル名（パス全体を文字列化）
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// デコード済みの音声クリップ
///
/// モノラルPCMサンプルとサンプリングレートを保持する。
/// デコーダが生成し、セグメンタとノーマライザが消費する。
#[derive(Clone, Debug)]
pub struct AudioClip {
    /// モノラルPCMサンプル
    pub samples: Vec<SampleI16>,
    /// サンプリングレート (Hz)
    pub sample_rate: u32,
}

impl AudioClip {
    /// クリップの長さ（ミリ秒）
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// 無音検出で切り出された音声セグメント
///
/// 元クリップ内の開始/終了オフセット（ミリ秒）とサンプルを保持する。
/// 一時ファイルに書き出されて文字起こしに使われ、使用後に削除される。
#[derive(Clone, Debug)]
pub struct AudioSegment {
    /// 元クリップ内の開始オフセット (ms)
    pub start_ms: u64,
    /// 元クリップ内の終了オフセット (ms)
    pub end_ms: u64,
    /// セグメントのPCMサンプル
    pub samples: Vec<SampleI16>,
}

impl AudioSegment {
    /// セグメントの長さ（ミリ秒）
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// 文字起こしの結果
///
/// 「音声ファイルが見つからない」は想定内の状態であり、
/// エラーではなくこの列挙型で表現する。
/// プロバイダ障害（ネットワーク/認証など）は `Err` として伝播する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transcription {
    /// 認識されたテキスト
    Text(String),
    /// 音声ファイルが存在しなかった（文字起こしなし）
    NotFound,
}

impl Transcription {
    /// テキストが得られた場合に参照を返す
    pub fn text(&self) -> Option<&str> {
        match self {
            Transcription::Text(t) => Some(t),
            Transcription::NotFound => None,
        }
    }
}

/// 議事録レコード
///
/// 1つの文字起こしに対して1つだけ生成される。
/// 生成後にフィールドが書き換えられることはない。
#[derive(Clone, Debug)]
pub struct Minutes {
    /// 元の音声ファイル名
    pub filename: String,
    /// 生成時刻（ISO 8601、秒精度）
    pub datetime: String,
    /// 要約
    pub abstract_summary: String,
    /// 重要ポイント
    pub key_points: String,
    /// アクションアイテム
    pub action_item_extraction: String,
    /// センチメント分析
    pub sentiment_analysis: String,
}

impl Minutes {
    /// 出力順のキーと値のペアを返す
    ///
    /// ライタはこの順序で `key: value` 行を書き出す。
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("filename", self.filename.as_str()),
            ("datetime", self.datetime.as_str()),
            ("abstract_summary", self.abstract_summary.as_str()),
            ("key_points", self.key_points.as_str()),
            ("action_item_extraction", self.action_item_extraction.as_str()),
            ("sentiment_analysis", self.sentiment_analysis.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_clip_duration() {
        let clip = AudioClip {
            samples: vec![0i16; 16000],
            sample_rate: 16000,
        };
        assert_eq!(clip.duration_ms(), 1000);

        // サンプリングレート0でもパニックしない
        let empty = AudioClip {
            samples: vec![],
            sample_rate: 0,
        };
        assert_eq!(empty.duration_ms(), 0);
    }

    #[test]
    fn test_audio_segment_duration() {
        let segment = AudioSegment {
            start_ms: 500,
            end_ms: 1500,
            samples: vec![0i16; 16000],
        };
        assert_eq!(segment.duration_ms(), 1000);
    }

    #[test]
    fn test_transcription_text() {
        let t = Transcription::Text("こんにちは".to_string());
        assert_eq!(t.text(), Some("こんにちは"));
        assert_eq!(Transcription::NotFound.text(), None);
    }

    #[test]
    fn test_minutes_field_order() {
        let minutes = Minutes {
            filename: "in/a.mp3".to_string(),
            datetime: "2024-01-01T00:00:00".to_string(),
            abstract_summary: "要約".to_string(),
            key_points: "ポイント".to_string(),
            action_item_extraction: "アクション".to_string(),
            sentiment_analysis: "ポジティブ".to_string(),
        };

        let fields = minutes.fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "filename",
                "datetime",
                "abstract_summary",
                "key_points",
                "action_item_extraction",
                "sentiment_analysis",
            ]
        );
        assert_eq!(fields[0].1, "in/a.mp3");
    }
}
