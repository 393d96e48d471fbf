use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;
use modules::{
    context::AppContext,
    error::{code::ErrorCode, BulkMailerResult},
    logger,
    rest::start_http_server,
    settings::cli::Settings,
    utils::tls::install_crypto_provider,
};
use tracing::{error, info};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

static LOGO: &str = r#"
  ____        _ _    __  __       _ _
 | __ ) _   _| | | _|  \/  | __ _(_) | ___ _ __
 |  _ \| | | | | |/ / |\/| |/ _` | | |/ _ \ '__|
 | |_) | |_| | |   <| |  | | (_| | | |  __/ |
 |____/ \__,_|_|_|\_\_|  |_|\__,_|_|_|\___|_|
"#;

#[tokio::main]
async fn main() -> BulkMailerResult<()> {
    let settings = Settings::parse();
    let _guard = logger::initialize_logging(&settings)?;
    info!("{}", LOGO);
    info!("Starting bulkmailer");
    info!("Version:  {}", bulkmailer_version!());

    let context = match initialize(settings) {
        Ok(context) => context,
        Err(e) => {
            error!("Failed to initialize bulkmailer: {}", e);
            return Err(e);
        }
    };

    start_http_server(context).await
}

fn initialize(settings: Settings) -> BulkMailerResult<Arc<AppContext>> {
    install_crypto_provider()?;
    std::fs::create_dir_all(&settings.bulkmailer_root_dir).map_err(|e| {
        raise_error!(
            format!(
                "Unable to create working directory {:?}: {}",
                settings.bulkmailer_root_dir, e
            ),
            ErrorCode::InternalError
        )
    })?;
    Ok(Arc::new(AppContext::new(settings)?))
}
