//! Read-only entity snapshots consumed by the state encoders.
//!
//! Every type here is a small value struct. Updates go through pure functions
//! that return a new value, so snapshots handed to encoders can never be
//! mutated behind their back, even when many ranges train at once.

use crate::types::{Rect, Size, Vec2};

/// Position and velocity of a moving entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Body {
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    /// Returns the body after one frame of motion.
    pub fn advanced(&self) -> Body {
        Body {
            position: self.position + self.velocity,
            velocity: self.velocity,
        }
    }
}

/// A combat unit: player, enemy, boss or companion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub body: Body,
    pub health: f64,
    pub max_health: f64,
    /// Steering target, e.g. the next patrol waypoint.
    pub waypoint: Option<Vec2>,
}

impl Unit {
    /// Creates a stationary unit at full health.
    pub fn new(position: Vec2, max_health: f64) -> Self {
        Self {
            body: Body::new(position, Vec2::zero()),
            health: max_health,
            max_health,
            waypoint: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn with_position(&self, position: Vec2) -> Unit {
        Unit {
            body: Body::new(position, self.body.velocity),
            ..*self
        }
    }

    pub fn with_velocity(&self, velocity: Vec2) -> Unit {
        Unit {
            body: Body::new(self.body.position, velocity),
            ..*self
        }
    }

    pub fn with_waypoint(&self, waypoint: Option<Vec2>) -> Unit {
        Unit { waypoint, ..*self }
    }

    /// Returns the unit after one frame of motion.
    pub fn advanced(&self) -> Unit {
        Unit {
            body: self.body.advanced(),
            ..*self
        }
    }

    /// Returns the unit with `amount` health removed (floored at zero).
    pub fn damaged(&self, amount: f64) -> Unit {
        Unit {
            health: (self.health - amount).max(0.0),
            ..*self
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Health as a fraction of maximum health (0 when `max_health` is 0).
    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }
}

/// A projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub body: Body,
    pub damage: f64,
}

impl Bullet {
    pub fn new(position: Vec2, velocity: Vec2, damage: f64) -> Self {
        Self {
            body: Body::new(position, velocity),
            damage,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn advanced(&self) -> Bullet {
        Bullet {
            body: self.body.advanced(),
            ..*self
        }
    }
}

/// Everything an encoder may look at for one decision.
///
/// `bounds` is the area the owner lives in (the full play area in the live
/// game, the range rectangle during training). `window` is the normalization
/// scale for positions and offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub window: Size,
    pub bounds: Rect,
    pub player: Option<Unit>,
    pub boss: Option<Unit>,
    pub enemies: Vec<Unit>,
    pub companions: Vec<Unit>,
    /// Bullets fired by the player side (player and companions).
    pub player_bullets: Vec<Bullet>,
    /// Bullets fired by enemies and bosses.
    pub enemy_bullets: Vec<Bullet>,
    pub obstacles: Vec<Rect>,
}

impl WorldSnapshot {
    /// An empty world whose bounds cover the whole window.
    pub fn empty(window: Size) -> Self {
        Self::within(window, Rect::new(0.0, 0.0, window.width, window.height))
    }

    /// An empty world restricted to `bounds`.
    pub fn within(window: Size, bounds: Rect) -> Self {
        Self {
            window,
            bounds,
            player: None,
            boss: None,
            enemies: Vec::new(),
            companions: Vec::new(),
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_moves_by_velocity() {
        let u = Unit::new(Vec2::new(10.0, 10.0), 5.0).with_velocity(Vec2::new(2.0, -1.0));
        let next = u.advanced();
        assert_eq!(next.position(), Vec2::new(12.0, 9.0));
        // original untouched
        assert_eq!(u.position(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn damage_floors_at_zero() {
        let u = Unit::new(Vec2::zero(), 3.0).damaged(5.0);
        assert_eq!(u.health, 0.0);
        assert!(u.is_dead());
    }

    #[test]
    fn health_fraction_handles_zero_max() {
        let u = Unit::new(Vec2::zero(), 0.0);
        assert_eq!(u.health_fraction(), 0.0);
    }
}
