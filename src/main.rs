//! Application entry point: Taiwanese TTS correction workbench.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and apply the
//!    `LEKU_STORE_*` environment overrides.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the shared HTTP client and load the sentence corpus.
//! 5. Build the synthesis gateway, correction store and audio player.
//! 6. Spawn the workbench command loop and the initial history fetch.
//! 7. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use leku_tester::{
    app::{install_cjk_font, LekuTesterApp},
    config::{AppConfig, AppPaths},
    corpus::loader_for,
    playback::{AudioPlayer, CommandPlayer},
    store::{CorrectionStore, RestCorrectionStore},
    synthesis::{HttpSynthesisGateway, SynthesisGateway},
    workbench::{new_shared_state, Workbench, WorkbenchCommand},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("台語語音合成測試")
        .with_inner_size([width, height])
        .with_min_inner_size([720.0, 480.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("leku-tester starting up");

    // 2. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();
    if !config.store.is_configured() {
        log::warn!("Correction store is not configured; saving and history are unavailable");
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. HTTP client + corpus
    let client = reqwest::Client::new();

    let corpus = rt
        .block_on(loader_for(&config.corpus, client.clone()).load())
        .unwrap_or_else(|e| {
            log::error!("Could not load corpus from {}: {e}", config.corpus.source);
            Vec::new()
        });

    // 5. Collaborators
    let gateway: Arc<dyn SynthesisGateway> =
        Arc::new(HttpSynthesisGateway::new(client.clone(), &config.synthesis));
    let store: Arc<dyn CorrectionStore> =
        Arc::new(RestCorrectionStore::new(client, &config.store));
    let player: Arc<dyn AudioPlayer> = Arc::new(CommandPlayer::new(
        config.playback.clone(),
        AppPaths::new().audio_cache_dir,
    ));

    let state = new_shared_state(corpus.len());
    let workbench = Workbench::new(state, corpus, &config.synthesis, gateway, store, player);

    // 6. Command loop + initial history
    let (command_tx, command_rx) = mpsc::channel::<WorkbenchCommand>(32);
    rt.spawn(workbench.clone().run(command_rx));
    {
        let workbench = workbench.clone();
        rt.spawn(async move { workbench.load_initial_history().await });
    }

    // 7. UI (blocks until the window is closed)
    let app = LekuTesterApp::new(workbench, command_tx, config.synthesis.backends.clone());
    let options = native_options(&config);
    let cjk_font = config.ui.cjk_font.clone();

    eframe::run_native(
        "leku-tester",
        options,
        Box::new(move |cc| {
            if let Some(path) = cjk_font {
                if let Err(e) = install_cjk_font(&cc.egui_ctx, &path) {
                    log::warn!("Could not load CJK font {}: {e}", path.display());
                }
            }
            Ok(Box::new(app))
        }),
    )
}
