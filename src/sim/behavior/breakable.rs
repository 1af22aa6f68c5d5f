//! Platforms that break under the player and respawn later

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::lerp;
use crate::sim::platform::PlatformBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakPhase {
    Intact,
    /// Counting down to a break (crumble only)
    Crumbling,
    Broken,
}

/// What a break hides, captured so a respawn puts back exactly that
#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    color: Vec4,
    visible: bool,
    solid: bool,
}

impl Snapshot {
    fn capture(body: &PlatformBody) -> Self {
        Self {
            color: body.visual.color,
            visible: body.visual.visible,
            solid: body.collider.is_some_and(|c| c.enabled),
        }
    }

    fn shatter(&self, body: &mut PlatformBody) {
        body.visual.color = Vec4::new(self.color.x, self.color.y, self.color.z, 0.0);
        body.visual.visible = false;
        match body.collider.as_mut() {
            Some(collider) => collider.enabled = false,
            None => log::debug!("breaking platform without a collider"),
        }
    }

    fn restore(&self, body: &mut PlatformBody) {
        body.visual.color = self.color;
        body.visual.visible = self.visible;
        if let Some(collider) = body.collider.as_mut() {
            collider.enabled = self.solid;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragileConfig {
    pub hits_to_break: u32,
    /// Seconds a broken platform stays gone
    pub respawn_delay: f32,
}

impl Default for FragileConfig {
    fn default() -> Self {
        Self {
            hits_to_break: 2,
            respawn_delay: 5.0,
        }
    }
}

/// Breaks after a number of landings
#[derive(Debug, Clone)]
pub struct Fragile {
    config: FragileConfig,
    snapshot: Option<Snapshot>,
    phase: BreakPhase,
    hits: u32,
    respawn_timer: f32,
}

impl Fragile {
    pub fn new(config: FragileConfig) -> Self {
        Self {
            config,
            snapshot: None,
            phase: BreakPhase::Intact,
            hits: 0,
            respawn_timer: 0.0,
        }
    }

    pub fn phase(&self) -> BreakPhase {
        self.phase
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub(super) fn initialize(&mut self, body: &PlatformBody) {
        self.snapshot = Some(Snapshot::capture(body));
        self.phase = BreakPhase::Intact;
        self.hits = 0;
        self.respawn_timer = 0.0;
    }

    pub(super) fn on_landed(&mut self, body: &mut PlatformBody) {
        if self.phase != BreakPhase::Intact {
            return;
        }
        self.hits += 1;
        if self.hits >= self.config.hits_to_break.max(1) {
            if let Some(snapshot) = &self.snapshot {
                snapshot.shatter(body);
            }
            self.phase = BreakPhase::Broken;
            self.respawn_timer = self.config.respawn_delay;
        }
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, dt: f32) {
        if self.phase != BreakPhase::Broken {
            return;
        }
        self.respawn_timer -= dt;
        if self.respawn_timer <= 0.0 {
            self.on_reset(body);
        }
    }

    pub(super) fn on_reset(&mut self, body: &mut PlatformBody) {
        if self.phase == BreakPhase::Broken {
            if let Some(snapshot) = &self.snapshot {
                snapshot.restore(body);
            }
        }
        self.phase = BreakPhase::Intact;
        self.hits = 0;
        self.respawn_timer = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrumbleConfig {
    /// Seconds of standing before the platform gives way
    pub crumble_duration: f32,
    pub respawn_delay: f32,
    /// Stepping off before the countdown ends puts the platform back
    pub cancel_on_leave: bool,
}

impl Default for CrumbleConfig {
    fn default() -> Self {
        Self {
            crumble_duration: 2.0,
            respawn_delay: 5.0,
            cancel_on_leave: true,
        }
    }
}

/// Fades out while the player stands on it, then breaks
#[derive(Debug, Clone)]
pub struct Crumble {
    config: CrumbleConfig,
    snapshot: Option<Snapshot>,
    phase: BreakPhase,
    crumble_timer: f32,
    respawn_timer: f32,
    player_present: bool,
}

impl Crumble {
    pub fn new(config: CrumbleConfig) -> Self {
        Self {
            config,
            snapshot: None,
            phase: BreakPhase::Intact,
            crumble_timer: 0.0,
            respawn_timer: 0.0,
            player_present: false,
        }
    }

    pub fn phase(&self) -> BreakPhase {
        self.phase
    }

    pub(super) fn initialize(&mut self, body: &PlatformBody) {
        self.snapshot = Some(Snapshot::capture(body));
        self.phase = BreakPhase::Intact;
        self.crumble_timer = 0.0;
        self.respawn_timer = 0.0;
        self.player_present = false;
    }

    pub(super) fn on_landed(&mut self) {
        self.player_present = true;
        if self.phase == BreakPhase::Intact {
            self.phase = BreakPhase::Crumbling;
            self.crumble_timer = self.config.crumble_duration;
        }
    }

    pub(super) fn on_staying(&mut self) {
        if self.phase != BreakPhase::Broken {
            self.player_present = true;
        }
    }

    pub(super) fn on_left(&mut self, body: &mut PlatformBody) {
        self.player_present = false;
        if self.phase == BreakPhase::Crumbling && self.config.cancel_on_leave {
            if let Some(snapshot) = &self.snapshot {
                body.visual.color = snapshot.color;
            }
            self.phase = BreakPhase::Intact;
            self.crumble_timer = 0.0;
        }
    }

    pub(super) fn on_update(&mut self, body: &mut PlatformBody, dt: f32) {
        match self.phase {
            BreakPhase::Intact => {}
            BreakPhase::Crumbling => {
                self.crumble_timer -= dt;
                let Some(snapshot) = self.snapshot else {
                    return;
                };
                if self.crumble_timer <= 0.0 {
                    snapshot.shatter(body);
                    self.phase = BreakPhase::Broken;
                    self.crumble_timer = 0.0;
                    self.respawn_timer = self.config.respawn_delay;
                    self.player_present = false;
                } else {
                    let t = self.crumble_timer / self.config.crumble_duration.max(f32::EPSILON);
                    body.visual.color.w = lerp(0.0, snapshot.color.w, t);
                }
            }
            BreakPhase::Broken => {
                self.respawn_timer -= dt;
                if self.respawn_timer <= 0.0 {
                    self.on_reset(body);
                }
            }
        }
    }

    pub(super) fn on_reset(&mut self, body: &mut PlatformBody) {
        if self.phase != BreakPhase::Intact {
            if let Some(snapshot) = &self.snapshot {
                snapshot.restore(body);
            }
        }
        self.phase = BreakPhase::Intact;
        self.crumble_timer = 0.0;
        self.respawn_timer = 0.0;
        self.player_present = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::behavior::test_support::Rig;

    const DT: f32 = 1.0 / 60.0;

    fn tinted_rig() -> Rig {
        let mut rig = Rig::new();
        rig.body.visual.color = Vec4::new(0.9, 0.4, 0.3, 1.0);
        rig
    }

    #[test]
    fn test_fragile_breaks_on_second_hit_and_respawns() {
        let mut rig = tinted_rig();
        let before = rig.body.clone();
        let mut fragile = Fragile::new(FragileConfig::default());
        fragile.initialize(&rig.body);

        fragile.on_landed(&mut rig.body);
        assert_eq!(fragile.phase(), BreakPhase::Intact);
        assert!(rig.body.is_solid());

        fragile.on_landed(&mut rig.body);
        assert_eq!(fragile.phase(), BreakPhase::Broken);
        assert!(!rig.body.is_solid());
        assert!(!rig.body.visual.visible);

        // Landing on a broken platform does nothing
        fragile.on_landed(&mut rig.body);
        assert_eq!(fragile.hits(), 2);

        for _ in 0..290 {
            fragile.on_update(&mut rig.body, DT);
        }
        assert_eq!(fragile.phase(), BreakPhase::Broken);
        for _ in 0..20 {
            fragile.on_update(&mut rig.body, DT);
        }
        assert_eq!(fragile.phase(), BreakPhase::Intact);
        assert_eq!(fragile.hits(), 0);
        assert_eq!(rig.body, before);
    }

    #[test]
    fn test_crumble_fades_then_breaks() {
        let mut rig = tinted_rig();
        let mut crumble = Crumble::new(CrumbleConfig::default());
        crumble.initialize(&rig.body);

        crumble.on_landed();
        assert_eq!(crumble.phase(), BreakPhase::Crumbling);
        for _ in 0..60 {
            crumble.on_staying();
            crumble.on_update(&mut rig.body, DT);
        }
        let alpha = rig.body.visual.color.w;
        assert!(alpha > 0.4 && alpha < 0.6, "half way through, alpha was {alpha}");
        assert!(rig.body.is_solid());

        for _ in 0..70 {
            crumble.on_update(&mut rig.body, DT);
        }
        assert_eq!(crumble.phase(), BreakPhase::Broken);
        assert!(!rig.body.is_solid());
    }

    #[test]
    fn test_crumble_cancels_when_player_leaves() {
        let mut rig = tinted_rig();
        let color = rig.body.visual.color;
        let mut crumble = Crumble::new(CrumbleConfig::default());
        crumble.initialize(&rig.body);

        crumble.on_landed();
        for _ in 0..30 {
            crumble.on_update(&mut rig.body, DT);
        }
        crumble.on_left(&mut rig.body);
        assert_eq!(crumble.phase(), BreakPhase::Intact);
        assert_eq!(rig.body.visual.color, color);

        for _ in 0..300 {
            crumble.on_update(&mut rig.body, DT);
        }
        assert!(rig.body.is_solid());
    }

    #[test]
    fn test_crumble_commits_when_configured() {
        let mut rig = tinted_rig();
        let mut crumble = Crumble::new(CrumbleConfig {
            cancel_on_leave: false,
            ..Default::default()
        });
        crumble.initialize(&rig.body);
        crumble.on_landed();
        crumble.on_left(&mut rig.body);
        for _ in 0..130 {
            crumble.on_update(&mut rig.body, DT);
        }
        assert_eq!(crumble.phase(), BreakPhase::Broken);
    }

    #[test]
    fn test_break_without_collider_still_hides() {
        let mut rig = tinted_rig();
        rig.body.collider = None;
        let mut fragile = Fragile::new(FragileConfig {
            hits_to_break: 1,
            ..Default::default()
        });
        fragile.initialize(&rig.body);
        fragile.on_landed(&mut rig.body);
        assert_eq!(fragile.phase(), BreakPhase::Broken);
        assert!(!rig.body.visual.visible);
        fragile.on_reset(&mut rig.body);
        assert!(rig.body.visual.visible);
        assert!(rig.body.collider.is_none());
    }
}
