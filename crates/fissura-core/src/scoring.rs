//! Aggregation and scoring.
//!
//! Deterministic formulas only: the scores depend solely on the measured
//! crack count and growth percentage, so the same dataset always produces the
//! same scores.

use serde::Serialize;

/// Carbon estimate per measured crack, kilograms.
pub const CARBON_KG_PER_CRACK: f64 = 2.5;
/// Water estimate per growth percentage point, litres.
pub const WATER_L_PER_GROWTH_PCT: f64 = 15.0;
/// Carbon below this is a low-risk site.
pub const RISK_CARBON_LOW_KG: f64 = 15.0;
/// Carbon below this (and at least [`RISK_CARBON_LOW_KG`]) is medium risk.
pub const RISK_CARBON_MEDIUM_KG: f64 = 30.0;
/// Carbon at or above this escalates to critical when the crack count also
/// exceeds [`CRITICAL_CRACK_COUNT`].
pub const CRITICAL_CARBON_KG: f64 = 45.0;
/// Crack count that must be exceeded for the critical escalation.
pub const CRITICAL_CRACK_COUNT: usize = 10;

/// Health-score penalty per crack.
const HEALTH_PENALTY_PER_CRACK: f64 = 5.0;

/// Overall site risk, from the environmental estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
    Critical,
}

/// Deterministic environmental impact estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentalEstimate {
    pub carbon_kg: f64,
    pub water_l: f64,
}

/// The bounded, human-interpretable aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    /// Structural health in `[0, 100]`.
    pub health: f64,
    /// Sustainability in `[0, 10]`.
    pub sustainability: f64,
    pub risk: RiskBucket,
    pub environment: EnvironmentalEstimate,
}

/// Computes all scores from the measured crack count and the growth coverage
/// percentage.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn score(crack_count: usize, growth_percentage: f64) -> Scores {
    let growth_pct = growth_percentage.clamp(0.0, 100.0);
    let cracks = crack_count as f64;

    let carbon_kg = CARBON_KG_PER_CRACK * cracks;
    let water_l = WATER_L_PER_GROWTH_PCT * growth_pct;
    let health = (100.0 - HEALTH_PENALTY_PER_CRACK * cracks - growth_pct).clamp(0.0, 100.0);
    let sustainability = (10.0 - carbon_kg / 5.0 - water_l / 100.0).clamp(0.0, 10.0);

    let risk = if carbon_kg >= CRITICAL_CARBON_KG && crack_count > CRITICAL_CRACK_COUNT {
        RiskBucket::Critical
    } else if carbon_kg < RISK_CARBON_LOW_KG {
        RiskBucket::Low
    } else if carbon_kg < RISK_CARBON_MEDIUM_KG {
        RiskBucket::Medium
    } else {
        RiskBucket::High
    };

    Scores {
        health,
        sustainability,
        risk,
        environment: EnvironmentalEstimate { carbon_kg, water_l },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pristine_surface_scores_full_marks() {
        let scores = score(0, 0.0);
        assert_eq!(scores.health, 100.0);
        assert_eq!(scores.sustainability, 10.0);
        assert_eq!(scores.risk, RiskBucket::Low);
        assert_eq!(scores.environment.carbon_kg, 0.0);
    }

    #[test]
    fn health_is_monotone_in_cracks_and_growth() {
        for cracks in 0..30 {
            assert!(score(cracks, 10.0).health >= score(cracks + 1, 10.0).health);
        }
        for growth in 0..50 {
            let g = f64::from(growth);
            assert!(score(3, g).health >= score(3, g + 1.0).health);
        }
    }

    #[test]
    fn scores_stay_in_bounds() {
        let worst = score(1000, 100.0);
        assert_eq!(worst.health, 0.0);
        assert_eq!(worst.sustainability, 0.0);
        let best = score(0, 0.0);
        assert!(best.health <= 100.0 && best.sustainability <= 10.0);
    }

    #[test]
    fn risk_bucket_thresholds() {
        // 5 cracks: 12.5 kg < 15.
        assert_eq!(score(5, 0.0).risk, RiskBucket::Low);
        // 8 cracks: 20 kg.
        assert_eq!(score(8, 0.0).risk, RiskBucket::Medium);
        // 13 cracks: 32.5 kg, below the critical carbon threshold.
        assert_eq!(score(13, 0.0).risk, RiskBucket::High);
        // 18 cracks: 45 kg and more than 10 cracks.
        assert_eq!(score(18, 0.0).risk, RiskBucket::Critical);
    }

    #[test]
    fn critical_needs_both_conditions() {
        // 10 cracks is 25 kg: even a huge growth percentage cannot push the
        // bucket to critical because carbon depends only on cracks.
        assert_eq!(score(10, 90.0).risk, RiskBucket::Medium);
    }

    #[test]
    fn growth_clamps_to_percentage_range() {
        let scores = score(0, 250.0);
        assert_eq!(scores.environment.water_l, 1500.0);
        assert_eq!(scores.health, 0.0);
    }
}
