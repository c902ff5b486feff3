use anyhow::Result;
use clap::Parser;

use archive_dispatch::cli::Cli;
use archive_dispatch::utils::logging;
use archive_dispatch::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env 文件可选
    dotenv::dotenv().ok();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
