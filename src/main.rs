use std::path::PathBuf;

use desk_companion::bubble::SampleTimeline;
use desk_companion::gui::{CompanionApp, CHARACTER_SIZE};
use desk_companion::logging;
use desk_companion::settings::Settings;

use eframe::egui;

fn main() -> anyhow::Result<()> {
    let mut settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging, settings.log_file.clone().map(PathBuf::from));

    // A relative memo path lives under the platform data directory.
    let memo_path = PathBuf::from(&settings.memo_file);
    if memo_path.is_relative() {
        let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
        settings.memo_file = base
            .join("desk_companion")
            .join(memo_path)
            .to_string_lossy()
            .to_string();
    }

    let (x, y) = settings.character_pos;
    let app = CompanionApp::new(settings, Box::new(SampleTimeline::new()))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("desk_companion")
            .with_inner_size([CHARACTER_SIZE.0 as f32, CHARACTER_SIZE.1 as f32])
            .with_position(egui::pos2(x as f32, y as f32))
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false),
        ..Default::default()
    };

    eframe::run_native(
        "desk_companion",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("companion exited with error: {e}"))
}
