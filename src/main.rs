use auto_replenish::adapters::{acquire_credential, build_http_client, ErpClient, MarketplaceClient};
use auto_replenish::config::toml_config::LogFormat;
use auto_replenish::domain::model::{RunReport, RunStatus};
use auto_replenish::utils::{logger, validation::Validate};
use auto_replenish::{
    CancellationToken, CliArgs, Collaborators, LocalStorage, ReplenishConfig, ReplenishEngine,
    ReplenishError, ReplenishmentPipeline,
};
use clap::Parser;
use std::sync::Arc;

fn exit_with(e: &ReplenishError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code().max(1));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 載入 TOML 配置
    let mut config = match ReplenishConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.severity().exit_code());
        }
    };
    args.apply_overrides(&mut config);

    match config.logging.format {
        LogFormat::Json => logger::init_json_logger(args.verbose),
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let today = chrono::Utc::now().date_naive();
    let request = config.request(today);
    display_plan(&config);

    if args.dry_run {
        println!("🔍 DRY RUN - no service was called");
        return Ok(());
    }

    let client = build_http_client(config.timeout()).unwrap_or_else(|e| exit_with(&e));
    let erp_credential = acquire_credential(&client, "erp", &config.erp)
        .await
        .unwrap_or_else(|e| exit_with(&e));
    let market_credential = acquire_credential(&client, "marketplace", &config.marketplace)
        .await
        .unwrap_or_else(|e| exit_with(&e));

    let erp = Arc::new(ErpClient::new(
        client.clone(),
        config.erp.base_url.clone(),
        erp_credential,
    ));
    let marketplace = Arc::new(MarketplaceClient::new(
        client,
        config.marketplace.base_url.clone(),
        market_credential,
    ));
    let collaborators = Collaborators {
        forecast: erp.clone(),
        stock: erp.clone(),
        availability: erp.clone(),
        transfers: erp.clone(),
        offers: marketplace,
        requisitions: erp,
    };

    let pipeline = ReplenishmentPipeline::new(collaborators, config.http.concurrent_peer_queries);
    let storage = LocalStorage::new(config.output.path.clone());
    let engine = ReplenishEngine::new(pipeline, storage, config.output.summary_file.clone());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, stopping at the next stage boundary");
            on_signal.cancel();
        }
    });

    let report = engine
        .run(&request, &cancel)
        .await
        .unwrap_or_else(|e| exit_with(&e));

    print_summary(&report);
    println!(
        "📁 Summary saved to: {}/{}",
        config.output.path, config.output.summary_file
    );

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn display_plan(config: &ReplenishConfig) {
    println!("📋 Replenishment Plan:");
    println!("  Material: {}", config.run.material);
    println!("  Home location: {}", config.run.home_location);
    println!("  Peers (in order): {}", config.run.peer_locations.join(", "));
    println!("  Horizon: {} weeks", config.run.horizon_weeks);
    println!("  Transport days: {}", config.run.transport_days);
    println!("  Currency: {}", config.run.currency);
    println!("  ERP: {}", config.erp.base_url);
    println!("  Marketplace: {}", config.marketplace.base_url);
    println!("  Timeout: {}s", config.http.timeout_seconds);
    println!();
}

fn print_summary(report: &RunReport) {
    println!("📊 Replenishment Summary:");
    if let Some(forecast) = &report.forecast {
        println!("  Demand forecast: {}", forecast.quantity);
    }
    if let Some(shortage) = report.shortage {
        println!("  Shortage: {}", shortage);
    }
    if let Some(internal) = &report.internal {
        println!(
            "  Internal: {} from {} by {}",
            internal.quantity, internal.source_location, internal.required_by_date
        );
    }
    if let Some(external) = &report.external {
        println!(
            "  External: {} from {} at {} {} (delivery {})",
            external.quantity,
            external.offer.supplier_id,
            external.offer.unit_price,
            external.offer.currency,
            external.delivery_date
        );
    }
    if let Some(order) = &report.fulfillment.internal_order_id {
        println!("  Transfer order: {}", order);
    }
    if let Some(requisition) = &report.fulfillment.purchase_requisition_id {
        println!("  Purchase requisition: {}", requisition);
    }

    match &report.status {
        RunStatus::Success => println!("✅ Replenishment completed"),
        RunStatus::NoAction => println!("✅ No action needed"),
        RunStatus::Failed(failure) => {
            eprintln!(
                "❌ Failed at {} stage ({:?}): {}",
                failure.stage, failure.kind, failure.message
            );
            if report.fulfillment != Default::default() {
                eprintln!("💡 Orders created before the failure were kept");
            }
        }
    }
}
