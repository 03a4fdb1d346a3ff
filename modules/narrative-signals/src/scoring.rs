use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Saturating scale for the velocity term (§4.C9): at this many
/// mentions/hour the norm reaches 0.5. Not specified by the scoring
/// formula directly; chosen so a handful of sources posting within the
/// same hour already registers as meaningfully elevated.
const VELOCITY_SCALE: f64 = 5.0;

const RECENCY_HALF_LIFE_HOURS: f64 = 12.0;
const EMA_ALPHA: f64 = 0.3;

pub const EMERGING_MENTION_THRESHOLD: usize = 3;
pub const EMERGING_SCORE_FLOOR: f32 = 0.2;

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// EMA-smoothed mentions/hour over the window's daily buckets, α=0.3/day
/// (§4.C9). A burst on a single day doesn't instantly dominate; it decays
/// into the running average instead.
pub fn ema_velocity(mention_timestamps: &[DateTime<Utc>], now: DateTime<Utc>, window_days: i64) -> f64 {
    let mut buckets: BTreeMap<chrono::NaiveDate, u32> = BTreeMap::new();
    for ts in mention_timestamps {
        *buckets.entry(ts.date_naive()).or_insert(0) += 1;
    }

    let mut ema: Option<f64> = None;
    for day_offset in (0..window_days).rev() {
        let date = (now - chrono::Duration::days(day_offset)).date_naive();
        let rate_per_hour = *buckets.get(&date).unwrap_or(&0) as f64 / 24.0;
        ema = Some(match ema {
            None => rate_per_hour,
            Some(prev) => EMA_ALPHA * rate_per_hour + (1.0 - EMA_ALPHA) * prev,
        });
    }
    ema.unwrap_or(0.0)
}

pub fn norm_velocity(velocity: f64) -> f64 {
    velocity / (velocity + VELOCITY_SCALE)
}

/// `distinct source count / min(10, total mentions)` (§4.C9, given
/// directly as an already-normalized ratio).
pub fn source_diversity(distinct_sources: usize, total_mentions: usize) -> f64 {
    if total_mentions == 0 {
        return 0.0;
    }
    distinct_sources as f64 / total_mentions.min(10) as f64
}

/// Exponential recency decay, half-life 12h.
pub fn recency(hours_since_last_mention: f64) -> f64 {
    0.5_f64.powf(hours_since_last_mention.max(0.0) / RECENCY_HALF_LIFE_HOURS)
}

/// `signal_score = clamp01(0.4·norm(velocity) + 0.3·norm(source_diversity)
/// + 0.2·recency + 0.1·|sentiment|·sign_bonus)` (§4.C9). `sign_bonus` is
/// 1.0: both strongly positive and strongly negative sentiment are
/// newsworthy, so the term only needs the magnitude.
pub fn signal_score(velocity_ema: f64, source_diversity: f64, hours_since_last_mention: f64, mean_sentiment: f32) -> f32 {
    let score = 0.4 * norm_velocity(velocity_ema)
        + 0.3 * clamp01(source_diversity)
        + 0.2 * recency(hours_since_last_mention)
        + 0.1 * (mean_sentiment as f64).abs();
    clamp01(score) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_velocity_is_zero_at_zero() {
        assert_eq!(norm_velocity(0.0), 0.0);
    }

    #[test]
    fn norm_velocity_saturates_toward_one() {
        assert!(norm_velocity(1000.0) > 0.99);
    }

    #[test]
    fn norm_velocity_half_at_scale() {
        assert!((norm_velocity(VELOCITY_SCALE) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn source_diversity_caps_denominator_at_ten() {
        assert_eq!(source_diversity(5, 20), 0.25);
    }

    #[test]
    fn source_diversity_zero_mentions_is_zero() {
        assert_eq!(source_diversity(0, 0), 0.0);
    }

    #[test]
    fn source_diversity_all_distinct_is_one() {
        assert_eq!(source_diversity(3, 3), 1.0);
    }

    #[test]
    fn recency_at_zero_hours_is_one() {
        assert_eq!(recency(0.0), 1.0);
    }

    #[test]
    fn recency_at_half_life_is_half() {
        assert!((recency(12.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recency_negative_hours_clamped_to_now() {
        assert_eq!(recency(-5.0), recency(0.0));
    }

    #[test]
    fn signal_score_clamped_to_unit_interval() {
        let score = signal_score(1000.0, 1.0, 0.0, 1.0);
        assert!(score <= 1.0);
    }

    #[test]
    fn signal_score_zero_activity_is_zero() {
        let score = signal_score(0.0, 0.0, 10_000.0, 0.0);
        assert!(score < 0.01);
    }

    #[test]
    fn ema_velocity_weights_recent_days_more() {
        let now = Utc::now();
        let burst_today: Vec<DateTime<Utc>> = (0..10).map(|_| now).collect();
        let burst_week_ago: Vec<DateTime<Utc>> =
            (0..10).map(|_| now - chrono::Duration::days(6)).collect();

        let recent = ema_velocity(&burst_today, now, 7);
        let old = ema_velocity(&burst_week_ago, now, 7);
        assert!(recent > old);
    }
}
