use rand::Rng;
use ratatui::style::Color;

/// How many animation frames one burst lasts.
pub const BURST_TICKS: u16 = 100;
const PARTICLES_PER_BURST: usize = 60;
const GRAVITY: f32 = 0.0015;

const GLYPHS: [char; 5] = ['*', '+', '•', '✦', '·'];
const COLORS: [Color; 6] = [
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightBlue,
];

/// One scrap of confetti.  Positions are fractions of the drawing area so
/// the burst survives a terminal resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    pub glyph: char,
    pub color: Color,
}

/// A purely cosmetic celebration drawn over the board after a match.
#[derive(Debug, Default)]
pub struct Confetti {
    particles: Vec<Particle>,
    ticks_left: u16,
}

impl Confetti {
    pub fn new() -> Self {
        Self::default()
    }

    /// Throw a fresh handful from just below the middle of the area.  A
    /// burst already in flight is topped up rather than replaced.
    pub fn burst<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for _ in 0..PARTICLES_PER_BURST {
            self.particles.push(Particle {
                x: 0.5,
                y: 0.6,
                vx: rng.random_range(-0.02..0.02),
                vy: rng.random_range(-0.045..-0.01),
                glyph: GLYPHS[rng.random_range(0..GLYPHS.len())],
                color: COLORS[rng.random_range(0..COLORS.len())],
            });
        }
        self.ticks_left = BURST_TICKS;
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        if self.ticks_left == 0 {
            return;
        }
        self.ticks_left -= 1;

        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += GRAVITY;
            p.vx *= 0.98;
        }
        self.particles
            .retain(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));

        if self.ticks_left == 0 {
            self.particles.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticks_left > 0 && !self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn burst_runs_its_course_and_clears() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(9);
        let mut confetti = Confetti::new();
        assert!(!confetti.is_active());

        confetti.burst(&mut rng);
        assert!(confetti.is_active());
        assert_eq!(confetti.particles().len(), PARTICLES_PER_BURST);

        for _ in 0..BURST_TICKS {
            confetti.step();
        }
        assert!(!confetti.is_active());
        assert!(confetti.particles().is_empty());
    }

    #[test]
    fn particles_stay_inside_the_area() {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let mut confetti = Confetti::new();
        confetti.burst(&mut rng);
        for _ in 0..10 {
            confetti.step();
            assert!(confetti
                .particles()
                .iter()
                .all(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y)));
        }
    }
}
