//! Fade strategies - opacity over time

/// Per-particle opacity behavior
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FadeStrategy {
    /// Opacity is left alone
    #[default]
    Null,
    /// Ramp opacity up to 1 over `duration` seconds, then become `Null`
    FadeIn { duration: f32 },
    /// Ramp opacity down to 0 over `duration` seconds, then vanish
    FadeOut { duration: f32 },
}

/// Result of one opacity update
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FadeOutcome {
    /// Keep the particle; this strategy applies from now on
    Continue(FadeStrategy),
    /// Opacity reached zero; the particle should be removed
    Vanished,
}

impl FadeStrategy {
    /// Advance `opacity` by `dt` seconds
    pub fn update_opacity(self, opacity: &mut f32, dt: f32) -> FadeOutcome {
        match self {
            Self::Null => FadeOutcome::Continue(self),
            Self::FadeIn { duration } => {
                *opacity = (*opacity + ramp(dt, duration)).min(1.0);
                if *opacity >= 1.0 {
                    FadeOutcome::Continue(Self::Null)
                } else {
                    FadeOutcome::Continue(self)
                }
            }
            Self::FadeOut { duration } => {
                *opacity = (*opacity - ramp(dt, duration)).max(0.0);
                if *opacity <= 0.0 {
                    FadeOutcome::Vanished
                } else {
                    FadeOutcome::Continue(self)
                }
            }
        }
    }
}

#[inline]
fn ramp(dt: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        dt.max(0.0) / duration
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_keeps_opacity() {
        let mut opacity = 0.3;
        let outcome = FadeStrategy::Null.update_opacity(&mut opacity, 1.0);
        assert_eq!(outcome, FadeOutcome::Continue(FadeStrategy::Null));
        assert_eq!(opacity, 0.3);
    }

    #[test]
    fn test_fade_in_becomes_null_at_full() {
        let fade = FadeStrategy::FadeIn { duration: 1.0 };
        let mut opacity = 0.0;

        assert_eq!(fade.update_opacity(&mut opacity, 0.5), FadeOutcome::Continue(fade));
        assert!((opacity - 0.5).abs() < 1e-6);

        assert_eq!(
            fade.update_opacity(&mut opacity, 0.75),
            FadeOutcome::Continue(FadeStrategy::Null)
        );
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn test_fade_out_vanishes() {
        let fade = FadeStrategy::FadeOut { duration: 0.2 };
        let mut opacity = 1.0;

        assert_eq!(fade.update_opacity(&mut opacity, 0.1), FadeOutcome::Continue(fade));
        assert_eq!(fade.update_opacity(&mut opacity, 0.15), FadeOutcome::Vanished);
        assert_eq!(opacity, 0.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut opacity = 0.0;
        let outcome = FadeStrategy::FadeIn { duration: 0.0 }.update_opacity(&mut opacity, 0.0);
        assert_eq!(outcome, FadeOutcome::Continue(FadeStrategy::Null));
        assert_eq!(opacity, 1.0);
    }
}
