use anyhow::Result;
use env_logger::Env;
use meeting_scriber::config::Config;
use meeting_scriber::pipeline::Scriber;

#[tokio::main]
async fn main() -> Result<()> {
    // ロガーを初期化
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .filter_module("flacenc", log::LevelFilter::Off)
        .init();

    // コマンドライン引数をパース
    let args: Vec<String> = std::env::args().collect();

    // 設定ファイル生成モード
    if args.len() > 1 && args[1] == "--generate-config" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // 設定ファイルのパス
    let config_path = if args.len() > 1 && !args[1].starts_with("--") {
        &args[1]
    } else {
        "config.toml"
    };

    // 設定を読み込み
    let config = Config::load_or_default(config_path)?;

    if config.whisper.api_key.is_empty() {
        log::warn!("whisper.api_key が未設定です。API呼び出しは失敗します");
    }

    log::info!("meeting-scriber を起動します");

    let scriber = Scriber::new(config)?;
    scriber.run().await?;

    log::info!("meeting-scriber を終了しました");

    Ok(())
}
