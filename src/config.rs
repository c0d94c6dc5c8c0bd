use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub abilities: AbilityConfig,
    #[serde(default)]
    pub visual: VisualConfig,
}

/// Per-actor movement abilities.
///
/// Passed into neighbour resolution and segment evaluation rather than
/// hard-coded, so player and non-player actors can move differently.
/// Heights and distances are in cells.
#[derive(Debug, Clone, Deserialize)]
pub struct AbilityConfig {
    /// Tallest ledge climbable without a jump.
    #[serde(default = "default_max_scale_height")]
    pub max_scale_height: f32,
    /// Smallest elevation change that needs an explicit scaling pivot;
    /// anything lower collapses into the walk.
    #[serde(default = "default_min_scale_height")]
    pub min_scale_height: f32,
    /// Widest gap (beyond the normal one-cell advance) a forward jump covers.
    #[serde(default = "default_max_forward_jump")]
    pub max_forward_jump: f32,
    /// Smallest gap that forces a jump instead of a walked scale.
    #[serde(default = "default_min_forward_jump")]
    pub min_forward_jump: f32,
    /// Apex height of the jump arc.
    #[serde(default = "default_jump_height")]
    pub jump_height: f32,
    /// Foot-falls per walked cell transition.
    #[serde(default = "default_walk_steps")]
    pub walk_steps: u32,
    /// Grip moves per climbed cell transition.
    #[serde(default = "default_climb_steps")]
    pub climb_steps: u32,
    /// Discrete steps per stairs transition.
    #[serde(default = "default_stair_steps")]
    pub stair_steps: u32,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    /// Seconds a one-cell move takes in the demo.
    #[serde(default = "default_move_duration")]
    pub move_duration: f32,
}

// Default values
fn default_max_scale_height() -> f32 { 1.0 }
fn default_min_scale_height() -> f32 { 0.25 }
fn default_max_forward_jump() -> f32 { 1.0 }
fn default_min_forward_jump() -> f32 { 0.5 }
fn default_jump_height() -> f32 { 0.5 }
fn default_walk_steps() -> u32 { 2 }
fn default_climb_steps() -> u32 { 3 }
fn default_stair_steps() -> u32 { 4 }
fn default_window_title() -> String { "Facewalk - Cube Face Movement Demo".to_string() }
fn default_bg_r() -> u8 { 24 }
fn default_bg_g() -> u8 { 24 }
fn default_bg_b() -> u8 { 32 }
fn default_move_duration() -> f32 { 0.35 }

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            max_scale_height: default_max_scale_height(),
            min_scale_height: default_min_scale_height(),
            max_forward_jump: default_max_forward_jump(),
            min_forward_jump: default_min_forward_jump(),
            jump_height: default_jump_height(),
            walk_steps: default_walk_steps(),
            climb_steps: default_climb_steps(),
            stair_steps: default_stair_steps(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            move_duration: default_move_duration(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    println!("Loaded configuration from config.toml");
                    config
                }
                Err(e) => {
                    eprintln!("Warning: Failed to parse config.toml: {}", e);
                    eprintln!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }
}
