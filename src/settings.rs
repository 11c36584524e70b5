use serde::{Deserialize, Serialize};

use crate::formation::LOOSE_DRIFT_PX;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Initial top-left position of the character surface.
    #[serde(default = "default_character_pos")]
    pub character_pos: (i32, i32),
    /// Initial follower positions, relative to the character. The offsets
    /// captured at startup from these become the formation's ground truth.
    #[serde(default = "default_bubble_offset")]
    pub bubble_offset: (i32, i32),
    #[serde(default = "default_memo_offset")]
    pub memo_offset: (i32, i32),
    #[serde(default = "default_hand_offset")]
    pub hand_offset: (i32, i32),
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional log file. If `None`, logging goes to stderr only.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Disable to keep the character's eyes open (the reconciliation pass
    /// still runs on the idle cadence).
    #[serde(default = "default_true")]
    pub blink_enabled: bool,
    /// Path of the memo text file.
    #[serde(default = "default_memo_file")]
    pub memo_file: String,
    /// Seconds between memo autosave passes.
    #[serde(default = "default_memo_autosave")]
    pub memo_autosave_secs: f32,
    /// Seconds between timeline refreshes in the bubble.
    #[serde(default = "default_timeline_refresh")]
    pub timeline_refresh_secs: f32,
    /// Per-axis drift the bubble may accumulate before being snapped back.
    #[serde(default = "default_drift")]
    pub loose_drift_px: i32,
}

fn default_character_pos() -> (i32, i32) {
    (900, 300)
}

fn default_bubble_offset() -> (i32, i32) {
    (270, 40)
}

fn default_memo_offset() -> (i32, i32) {
    (-270, 60)
}

fn default_hand_offset() -> (i32, i32) {
    (30, 180)
}

fn default_true() -> bool {
    true
}

fn default_memo_file() -> String {
    "data/memo.txt".into()
}

fn default_memo_autosave() -> f32 {
    5.0
}

fn default_timeline_refresh() -> f32 {
    30.0
}

fn default_drift() -> i32 {
    LOOSE_DRIFT_PX
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            character_pos: default_character_pos(),
            bubble_offset: default_bubble_offset(),
            memo_offset: default_memo_offset(),
            hand_offset: default_hand_offset(),
            debug_logging: false,
            log_file: None,
            blink_enabled: true,
            memo_file: default_memo_file(),
            memo_autosave_secs: default_memo_autosave(),
            timeline_refresh_secs: default_timeline_refresh(),
            loose_drift_px: default_drift(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
