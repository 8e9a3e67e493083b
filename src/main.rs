use std::process;

use static_site_setup::config::SiteConfig;
use static_site_setup::utils::console;

#[tokio::main]
async fn main() {
    // 加载 .env 文件并解析参数
    let config = SiteConfig::init();

    if let Err(err) = static_site_setup::init_tracing() {
        eprintln!("{err:#}");
    }

    console::info(&format!(
        "配置存储桶 {} (区域 {})",
        config.bucket, config.region
    ));

    match static_site_setup::provision(&config).await {
        Ok(report) => {
            console::print_summary(&report);
            process::exit(0);
        }
        Err(err) => {
            console::failure(&err);
            process::exit(1);
        }
    }
}
