use crate::types::{Bearing, CueKind};

pub const SAVE_FORMAT_VERSION: u8 = 1;
pub const DEFAULT_SAVE_FILE: &str = "save/echo_maze_save.json";

/// How long the audio side plays a movement cue. Input stays disabled until
/// the cue is acknowledged via `GameEngine::cue_finished`.
pub const MOVE_CUE_MS: u64 = 450;
pub const BLOCKED_CUE_MS: u64 = 180;
/// Gap between the four directional pings of one sonar sweep.
pub const SONAR_STEP_MS: u64 = 160;

/// Default tone mapping for sonar cue categories. The audio collaborator may
/// override this; the table only fixes the relative ordering (item above
/// open above locked above wall).
pub fn cue_tone_hz(kind: CueKind) -> f32 {
    match kind {
        CueKind::ItemAhead => 880.0,
        CueKind::Open => 440.0,
        CueKind::Locked => 233.1,
        CueKind::Wall => 110.0,
    }
}

/// Stereo pan for a cue bearing, -1.0 (hard left) to 1.0 (hard right).
/// Behind is distinguished by tone damping, not pan.
pub fn bearing_pan(bearing: Bearing) -> f32 {
    match bearing {
        Bearing::Ahead => 0.0,
        Bearing::Right => 0.8,
        Bearing::Behind => 0.0,
        Bearing::Left => -0.8,
    }
}
