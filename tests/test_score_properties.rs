/// Property-based tests for the continuous coexpression score model
///
/// Uses proptest to check the invariants of the normalisation and the
/// pair score over the whole parameter space.
use coexalign::score_model::ScoreModel;
use proptest::prelude::*;

const EPS: f64 = 1e-12;

/// Property: normalised match weights land in [0, 1 - beta] inside the range
#[test]
fn prop_normalized_weight_in_range() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        min in -1000.0f64..1000.0,
        span in 1e-3f64..1000.0,
        t in 0.0f64..=1.0
    )| {
        let max = min + span;
        let model = ScoreModel::with_range(beta, 0.0, min, max).unwrap();
        let weight = (min + t * span).clamp(min, max);
        let score = model.normalized_match_weight(weight);

        prop_assert!(score >= -EPS, "score {} below 0", score);
        prop_assert!(score <= 1.0 - beta + EPS, "score {} above {}", score, 1.0 - beta);
    });
}

/// Property: a degenerate range always normalises to 0
#[test]
fn prop_degenerate_range_is_zero() {
    proptest!(|(beta in 0.0f64..=1.0, value in -100.0f64..100.0, weight in -100.0f64..100.0)| {
        let model = ScoreModel::with_range(beta, 0.0, value, value).unwrap();
        prop_assert_eq!(model.normalized_match_weight(weight), 0.0);
    });
}

/// Property: pair_score(w1, w2) == pair_score(w2, w1)
#[test]
fn prop_pair_score_symmetric() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        tau in 0.0f64..0.99,
        w1 in -1.0f64..=1.0,
        w2 in -1.0f64..=1.0
    )| {
        let model = ScoreModel::with_range(beta, tau, 0.0, 1.0).unwrap();
        prop_assert_eq!(model.pair_score(w1, w2), model.pair_score(w2, w1));
    });
}

/// Property: correlations below the threshold contribute nothing
#[test]
fn prop_below_threshold_is_zero() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        tau in 0.01f64..0.99,
        frac in 0.0f64..0.999,
        negative in any::<bool>(),
        other in -1.0f64..=1.0
    )| {
        let model = ScoreModel::with_range(beta, tau, 0.0, 1.0).unwrap();
        let weak = if negative { -frac * tau } else { frac * tau };
        prop_assume!(weak.abs() < tau);

        prop_assert_eq!(model.pair_score(weak, other), 0.0);
        prop_assert_eq!(model.pair_score(other, weak), 0.0);
    });
}

/// Property: opposite signs beyond the threshold score exactly -beta
#[test]
fn prop_opposite_signs_penalised() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        tau in 0.0f64..0.99,
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0
    )| {
        let model = ScoreModel::with_range(beta, tau, 0.0, 1.0).unwrap();
        let positive = tau + a * (1.0 - tau);
        let negative = -(tau + b * (1.0 - tau));
        prop_assume!(positive >= tau && negative <= -tau);

        prop_assert_eq!(model.pair_score(positive, negative), -beta);
        prop_assert_eq!(model.pair_score(negative, positive), -beta);
    });
}

/// Property: equal same-sign correlations score beta * |w|
#[test]
fn prop_equal_weights_score_beta_times_magnitude() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        tau in 0.0f64..0.99,
        a in 0.0f64..=1.0,
        negative in any::<bool>()
    )| {
        let model = ScoreModel::with_range(beta, tau, 0.0, 1.0).unwrap();
        let magnitude = tau + a * (1.0 - tau);
        prop_assume!(magnitude >= tau && magnitude > 0.0);
        let w = if negative { -magnitude } else { magnitude };

        let score = model.pair_score(w, w);
        prop_assert!((score - beta * magnitude).abs() < EPS,
            "pair_score({}, {}) = {}, expected {}", w, w, score, beta * magnitude);
    });
}

/// Property: same-sign profit never exceeds beta and never goes below -beta
#[test]
fn prop_profit_bounded_by_beta() {
    proptest!(|(
        beta in 0.0f64..=1.0,
        tau in 0.0f64..0.99,
        w1 in -1.0f64..=1.0,
        w2 in -1.0f64..=1.0
    )| {
        let model = ScoreModel::with_range(beta, tau, 0.0, 1.0).unwrap();
        let score = model.pair_score(w1, w2);
        prop_assert!(score <= beta + EPS);
        prop_assert!(score >= -beta - EPS);
    });
}
