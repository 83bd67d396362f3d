use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use story_weaver::config;
use story_weaver::engine::llm_client::build_client;
use story_weaver::ui::app::MyApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("story_weaver=info".parse()?))
        .init();

    let config = config::io::load();
    let client = build_client(&config.backend)?;

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Story Weaver",
        options,
        Box::new(move |_cc| Ok(Box::new(MyApp::new(config, client)))),
    )
    .map_err(|e| anyhow!("failed to run the UI: {e}"))
}
