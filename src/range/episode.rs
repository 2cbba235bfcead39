//! The closed-loop episode driver and shared range physics.

use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;

use crate::action::ActionEffect;
use crate::agent::RoleAgent;
use crate::error::Result;
use crate::experience::{DataCollector, Experience};
use crate::roles::Role;
use crate::snapshot::{Bullet, Unit, WorldSnapshot};
use crate::training::Trainer;
use crate::types::{Rect, Vec2};

/// Pixels per frame of every simulated bullet.
pub const BULLET_SPEED: f64 = 8.0;

/// Hit radius of players and companions.
pub const BULLET_HIT_RADIUS: f64 = 15.0;

/// Hit radius of regular enemies.
pub const ENEMY_HIT_RADIUS: f64 = 20.0;

/// Hit radius of the boss.
pub const BOSS_HIT_RADIUS: f64 = 25.0;

/// Result of simulating one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    pub reward: f64,
    /// The episode ended on this frame (subject hit or no targets left).
    pub done: bool,
    pub hits_landed: u32,
    pub kills: u32,
}

/// A simulated training situation around one subject unit.
pub trait Scenario {
    /// The unit the agent controls.
    fn subject(&self) -> &Unit;

    /// The world as the subject's encoder sees it.
    fn observe(&self) -> WorldSnapshot;

    /// Units that smart shooting modes may aim at.
    fn targets(&self) -> Vec<Unit> {
        Vec::new()
    }

    /// Applies the agent's effect and advances the world one frame.
    fn step(&mut self, effect: Option<ActionEffect>, rng: &mut StdRng) -> StepOutcome;

    /// Companion count for curriculum scenarios.
    fn companions(&self) -> Option<usize> {
        None
    }
}

/// Summary of one finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub role: Role,
    /// 1-based episode counter of the range.
    pub episode: u64,
    pub frames: u32,
    pub total_reward: f64,
    /// The subject was hit and the episode ended early.
    pub terminal_hit: bool,
    pub hits_landed: u32,
    pub kills: u32,
    /// Curriculum companion count, for scenarios that use one.
    pub companions: Option<usize>,
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{}: {} frames, reward {:.1}",
            self.role, self.episode, self.frames, self.total_reward
        )?;
        if self.terminal_hit {
            write!(f, ", hit")?;
        }
        if self.hits_landed > 0 || self.kills > 0 {
            write!(f, ", {} hits / {} kills", self.hits_landed, self.kills)?;
        }
        if let Some(n) = self.companions {
            write!(f, ", {n} companions")?;
        }
        Ok(())
    }
}

/// Runs `scenario` for at most `max_frames` frames, letting `agent` act and
/// learn on every frame.
///
/// Hitting the frame cap is a truncation, not a terminal transition.
pub fn drive<S, T>(
    scenario: &mut S,
    agent: &mut RoleAgent<T>,
    episode: u64,
    max_frames: u32,
    rng: &mut StdRng,
    collector: &mut DataCollector,
) -> Result<EpisodeReport>
where
    S: Scenario + ?Sized,
    T: Trainer,
{
    let role = agent.role();
    let mut report = EpisodeReport {
        role,
        episode,
        frames: 0,
        total_reward: 0.0,
        terminal_hit: false,
        hits_landed: 0,
        kills: 0,
        companions: scenario.companions(),
    };

    let mut state = agent.encode(scenario.subject(), &scenario.observe());
    for _ in 0..max_frames {
        let action = agent.select_action(&state)?;
        let effect = agent.action_to_effect(action, scenario.subject(), &scenario.targets())?;
        let outcome = scenario.step(effect, rng);
        let next_state = agent.encode(scenario.subject(), &scenario.observe());

        agent.learn(&state, action, outcome.reward, &next_state, outcome.done)?;
        collector.record(
            role,
            &Experience::new(state, action, outcome.reward, next_state.clone(), outcome.done),
        );

        report.frames += 1;
        report.total_reward += outcome.reward;
        report.hits_landed += outcome.hits_landed;
        report.kills += outcome.kills;
        if outcome.done {
            report.terminal_hit = !role.is_shooting();
            break;
        }
        state = next_state;
    }
    Ok(report)
}

/// Uniform random point inside `bounds`, `margin` away from its edges.
pub fn random_point(bounds: &Rect, margin: f64, rng: &mut StdRng) -> Vec2 {
    let x_span = (bounds.width - 2.0 * margin).max(0.0);
    let y_span = (bounds.height - 2.0 * margin).max(0.0);
    Vec2::new(
        bounds.left() + margin + rng.gen::<f64>() * x_span,
        bounds.top() + margin + rng.gen::<f64>() * y_span,
    )
}

/// Random heading scaled to `speed`.
pub fn random_velocity(speed: f64, rng: &mut StdRng) -> Vec2 {
    Vec2::new(1.0, 0.0)
        .rotated(rng.gen_range(0.0..360.0))
        .scaled(speed)
}

/// Moves `unit` one frame, occasionally picking a new heading and bouncing
/// off the edges of `bounds`.
pub fn wander(unit: &Unit, bounds: &Rect, margin: f64, speed: f64, rng: &mut StdRng) -> Unit {
    let mut velocity = unit.velocity();
    if velocity.is_zero() || rng.gen_bool(0.02) {
        velocity = random_velocity(speed, rng);
    }
    let next = unit.position() + velocity;
    let clamped = bounds.clamp(next, margin);
    if clamped.x != next.x {
        velocity.x = -velocity.x;
    }
    if clamped.y != next.y {
        velocity.y = -velocity.y;
    }
    unit.with_position(clamped).with_velocity(velocity)
}

/// A bullet from `from` toward `to`, or `None` when the two coincide.
pub fn bullet_toward(from: Vec2, to: Vec2, damage: f64) -> Option<Bullet> {
    let dir = from.direction_to(&to);
    if dir.is_zero() {
        None
    } else {
        Some(Bullet::new(from, dir.scaled(BULLET_SPEED), damage))
    }
}

/// Advances every bullet and despawns those that left `bounds`.
pub fn advance_bullets(bullets: &mut Vec<Bullet>, bounds: &Rect) {
    bullets.retain_mut(|b| {
        *b = b.advanced();
        bounds.contains(&b.position())
    });
}

/// Removes and returns the bullets within `radius` of `position`.
pub fn take_hits(bullets: &mut Vec<Bullet>, position: Vec2, radius: f64) -> Vec<Bullet> {
    let mut hits = Vec::new();
    bullets.retain(|b| {
        if b.position().distance_to(&position) < radius {
            hits.push(*b);
            false
        } else {
            true
        }
    });
    hits
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn wander_stays_inside() {
        let bounds = Rect::new(400.0, 300.0, 400.0, 300.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut u = Unit::new(bounds.center(), 1.0);
        for _ in 0..2000 {
            u = wander(&u, &bounds, 20.0, 6.0, &mut rng);
            assert!(bounds.contains(&u.position()));
        }
    }

    #[test]
    fn bullets_despawn_outside_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut bullets = vec![
            Bullet::new(Vec2::new(95.0, 50.0), Vec2::new(8.0, 0.0), 1.0),
            Bullet::new(Vec2::new(50.0, 50.0), Vec2::new(8.0, 0.0), 1.0),
        ];
        advance_bullets(&mut bullets, &bounds);
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].position(), Vec2::new(58.0, 50.0));
    }

    #[test]
    fn hits_are_consumed() {
        let mut bullets = vec![
            Bullet::new(Vec2::new(10.0, 0.0), Vec2::zero(), 2.0),
            Bullet::new(Vec2::new(40.0, 0.0), Vec2::zero(), 1.0),
        ];
        let hits = take_hits(&mut bullets, Vec2::zero(), BULLET_HIT_RADIUS);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].damage, 2.0);
        assert_eq!(bullets.len(), 1);
        assert!(take_hits(&mut bullets, Vec2::zero(), BULLET_HIT_RADIUS).is_empty());
    }

    #[test]
    fn no_bullet_at_zero_range() {
        assert!(bullet_toward(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 1.0).is_none());
    }
}
