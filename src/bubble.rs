use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One timeline post, already reduced to what the bubble can show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub author: String,
    pub text: String,
}

/// Source of timeline posts. Network, authentication, and pagination are the
/// implementor's problem; the bubble only ever asks for a batch.
pub trait TimelineClient {
    fn fetch(&mut self, limit: usize) -> Result<Vec<Post>>;
}

/// Offline client used when no real timeline is wired up.
pub struct SampleTimeline {
    posts: Vec<Post>,
}

impl SampleTimeline {
    pub fn new() -> Self {
        let posts = [
            ("companion", "Don't forget to stretch once in a while."),
            ("companion", "I reorganized the memo pad. You're welcome."),
            ("companion", "It's a good day to close some tabs."),
            ("companion", "Blinking is hard work, you know."),
        ]
        .into_iter()
        .map(|(author, text)| Post {
            author: author.to_string(),
            text: text.to_string(),
        })
        .collect();
        Self { posts }
    }
}

impl Default for SampleTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineClient for SampleTimeline {
    fn fetch(&mut self, limit: usize) -> Result<Vec<Post>> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleMode {
    /// Showing a timeline post (typewriter reveal in progress or finished).
    Timeline,
    /// Modal menu opened by double-activating the character.
    Menu,
    /// Scripted farewell before shutdown.
    Farewell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ToggleTimeline,
    Goodbye,
    Cancel,
}

/// What the app layer should do after a menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleReaction {
    None,
    ResumeTimeline,
    BeginFarewell,
}

pub const BUBBLE_WIDTH: u32 = 330;
pub const MIN_BUBBLE_HEIGHT: u32 = 100;
pub const TYPEWRITER_TICK: Duration = Duration::from_millis(50);
pub const FAREWELL_HOLD: Duration = Duration::from_secs(3);
const FAREWELL_TEXT: &str = "See you!";
const CHARS_PER_LINE: usize = 38;
const LINE_HEIGHT_PX: u32 = 22;

/// Speech-bubble content: a randomly chosen timeline post revealed one
/// character at a time. Height follows the content, which is why the bubble
/// is registered as a loose follower.
pub struct BubbleContent {
    mode: BubbleMode,
    post: Option<Post>,
    shown_chars: usize,
    timeline_enabled: bool,
    client: Box<dyn TimelineClient>,
    rng: StdRng,
}

impl BubbleContent {
    pub fn new(client: Box<dyn TimelineClient>) -> Self {
        Self {
            mode: BubbleMode::Timeline,
            post: None,
            shown_chars: 0,
            timeline_enabled: true,
            client,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(client: Box<dyn TimelineClient>, seed: u64) -> Self {
        let mut bubble = Self::new(client);
        bubble.rng = StdRng::seed_from_u64(seed);
        bubble
    }

    pub fn mode(&self) -> BubbleMode {
        self.mode
    }

    pub fn timeline_enabled(&self) -> bool {
        self.timeline_enabled
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    /// Fetch a fresh batch and pick one post at random. A refresh outside
    /// timeline mode is skipped, matching the menu's modality.
    pub fn refresh(&mut self) -> Result<()> {
        if self.mode != BubbleMode::Timeline || !self.timeline_enabled {
            return Ok(());
        }
        let posts = self.client.fetch(50)?;
        self.post = posts.choose(&mut self.rng).cloned();
        self.shown_chars = 0;
        Ok(())
    }

    /// Reveal one more character. Returns `true` while there is more text to
    /// come, so the caller knows to schedule another tick.
    pub fn typewriter_tick(&mut self) -> bool {
        if self.mode != BubbleMode::Timeline {
            return false;
        }
        let total = self.post.as_ref().map(|p| p.text.chars().count()).unwrap_or(0);
        if self.shown_chars < total {
            self.shown_chars += 1;
        }
        self.shown_chars < total
    }

    /// Text currently visible in the bubble.
    pub fn visible_text(&self) -> String {
        match self.mode {
            BubbleMode::Farewell => FAREWELL_TEXT.to_string(),
            BubbleMode::Menu => String::new(),
            BubbleMode::Timeline => self
                .post
                .as_ref()
                .map(|p| p.text.chars().take(self.shown_chars).collect())
                .unwrap_or_default(),
        }
    }

    pub fn author(&self) -> Option<&str> {
        match self.mode {
            BubbleMode::Timeline => self.post.as_ref().map(|p| p.author.as_str()),
            _ => None,
        }
    }

    pub fn enter_menu(&mut self) {
        if self.mode != BubbleMode::Farewell {
            self.mode = BubbleMode::Menu;
        }
    }

    pub fn select(&mut self, choice: MenuChoice) -> BubbleReaction {
        match choice {
            MenuChoice::ToggleTimeline => {
                self.timeline_enabled = !self.timeline_enabled;
                self.mode = BubbleMode::Timeline;
                BubbleReaction::ResumeTimeline
            }
            MenuChoice::Cancel => {
                self.mode = BubbleMode::Timeline;
                BubbleReaction::ResumeTimeline
            }
            MenuChoice::Goodbye => {
                self.begin_farewell();
                BubbleReaction::BeginFarewell
            }
        }
    }

    /// Switch to the scripted goodbye. Farewell is terminal: no refresh or
    /// menu can interrupt it.
    pub fn begin_farewell(&mut self) {
        self.mode = BubbleMode::Farewell;
        self.post = None;
        self.shown_chars = 0;
    }

    /// Content-driven size: fixed width, height following the full post text
    /// (not the typewriter progress, so the bubble doesn't pump while
    /// revealing).
    pub fn current_size(&self) -> (u32, u32) {
        let chars = match self.mode {
            BubbleMode::Timeline => self.post.as_ref().map(|p| p.text.chars().count()).unwrap_or(0),
            BubbleMode::Farewell => FAREWELL_TEXT.chars().count(),
            BubbleMode::Menu => CHARS_PER_LINE * 3,
        };
        let lines = chars.div_ceil(CHARS_PER_LINE).max(1) as u32;
        let height = (lines * LINE_HEIGHT_PX + 56).max(MIN_BUBBLE_HEIGHT);
        (BUBBLE_WIDTH, height)
    }
}
