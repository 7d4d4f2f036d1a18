use clap::Parser;
use epg_builder::config::cli::LogFormat;
use epg_builder::utils::error::EpgError;
use epg_builder::utils::{logger, validation::Validate};
use epg_builder::{app, CliConfig, LocalStorage};

fn fail(e: &EpgError) -> ! {
    tracing::error!(
        "❌ Guide build failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting epg-builder");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 讀取並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match app::run(LocalStorage::default(), config, cli.monitor).await {
        Ok(summary) => {
            println!("✅ Guide build completed successfully!");
            println!(
                "📺 {} channels, {} programmes",
                summary.channels, summary.programmes
            );
            println!("📁 Output saved to: {}", summary.output_path);
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
