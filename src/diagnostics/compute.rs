use crate::config::DiagnosticsConfig;
use crate::diagnostics::{EfficiencyClass, EfficiencyRating, PerformanceReport};
use crate::instruction::{CanonicalInstruction, InstructionKind};

pub const UNKNOWN_BASE_UNITS: u64 = 10_000;
pub const COMPILED_BASE_UNITS: u64 = 15_000;
pub const SPLIT_ACCOUNT_THRESHOLD: usize = 10;

const OPTIMAL_UNITS_PER_ACCOUNT: u64 = 5_000;
const GOOD_UNITS_PER_ACCOUNT: u64 = 15_000;

/// Base cost by semantic type, matched case-insensitively as a substring.
/// More specific names come first.
const BASE_UNITS_BY_TYPE: &[(&str, u64)] = &[
    ("createidempotent", 6_000),
    ("createaccount", 5_000),
    ("initialize", 8_000),
    ("swap", 25_000),
    ("stake", 15_000),
    ("transfer", 2_300),
];

const NARRATIVES: &[(EfficiencyRating, &str)] = &[
    (
        EfficiencyRating::Excellent,
        "Compute usage closely matches the requested budget.",
    ),
    (
        EfficiencyRating::Good,
        "Compute usage is efficient with modest unused headroom.",
    ),
    (
        EfficiencyRating::Moderate,
        "A noticeable share of the requested budget goes unused; consider lowering the compute unit limit.",
    ),
    (
        EfficiencyRating::Poor,
        "Most of the requested budget goes unused; set an explicit compute unit limit near actual consumption.",
    ),
];

pub fn base_units(ix: &CanonicalInstruction) -> u64 {
    if ix.kind == InstructionKind::Compiled {
        return COMPILED_BASE_UNITS;
    }
    let semantic_type = ix.semantic_type.to_ascii_lowercase();
    BASE_UNITS_BY_TYPE
        .iter()
        .find(|(needle, _)| semantic_type.contains(needle))
        .map_or(UNKNOWN_BASE_UNITS, |(_, units)| *units)
}

/// Estimated units for one step: base cost scaled by account count in
/// groups of three.
pub fn estimate_step_units(ix: &CanonicalInstruction) -> u64 {
    let multiplier = (ix.account_refs.len() / 3).max(1) as u64;
    base_units(ix).saturating_mul(multiplier)
}

pub fn efficiency_class(estimate: u64, account_count: usize) -> EfficiencyClass {
    let per_account = estimate / (account_count.max(1) as u64);
    if per_account < OPTIMAL_UNITS_PER_ACCOUNT {
        EfficiencyClass::Optimal
    } else if per_account < GOOD_UNITS_PER_ACCOUNT {
        EfficiencyClass::Good
    } else {
        EfficiencyClass::Poor
    }
}

pub fn optimization_hints(ix: &CanonicalInstruction) -> Vec<String> {
    let mut hints = Vec::new();
    let account_count = ix.account_refs.len();
    if account_count > SPLIT_ACCOUNT_THRESHOLD {
        hints.push(format!(
            "Instruction references {account_count} accounts; consider splitting it into smaller instructions."
        ));
    }
    if ix.semantic_type.to_ascii_lowercase().contains("swap") {
        hints.push("Route the swap directly through the target pool to avoid extra CPI hops.".to_string());
        hints.push("Batch related swaps into one transaction to amortize fixed costs.".to_string());
    }
    if ix.is_unknown_type() {
        hints.push(
            "Instruction could not be decoded; fetch with jsonParsed encoding or register an IDL decoder for better observability."
                .to_string(),
        );
    }
    hints
}

/// Requested-units estimate: consumed units plus headroom, never below the
/// configured floor.
pub fn requested_units_estimate(consumed: u64, config: &DiagnosticsConfig) -> u64 {
    let with_headroom = (consumed as f64 * config.requested_headroom).round() as u64;
    with_headroom.max(config.min_requested_units)
}

pub fn efficiency_percent(consumed: u64, requested: u64) -> f64 {
    if requested == 0 {
        return 0.0;
    }
    let pct = consumed as f64 / requested as f64 * 100.0;
    ((pct * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

pub fn efficiency_rating(percent: f64) -> EfficiencyRating {
    if percent > 90.0 {
        EfficiencyRating::Excellent
    } else if percent > 70.0 {
        EfficiencyRating::Good
    } else if percent > 50.0 {
        EfficiencyRating::Moderate
    } else {
        EfficiencyRating::Poor
    }
}

fn narrative(rating: EfficiencyRating) -> &'static str {
    NARRATIVES
        .iter()
        .find(|(r, _)| *r == rating)
        .map_or("", |(_, text)| *text)
}

/// `declared_limit` is the limit set by a Compute Budget instruction, when
/// the transaction carried one; it replaces the estimate.
pub fn performance_report(
    consumed: u64,
    fee: u64,
    slot: u64,
    declared_limit: Option<u64>,
    config: &DiagnosticsConfig,
) -> PerformanceReport {
    let requested = declared_limit
        .filter(|limit| *limit > 0)
        .unwrap_or_else(|| requested_units_estimate(consumed, config));
    let percent = efficiency_percent(consumed, requested);
    let rating = efficiency_rating(percent);

    PerformanceReport {
        compute_units_used: consumed,
        compute_units_requested_estimate: requested,
        fee_paid: fee,
        slot,
        efficiency_percent: percent,
        efficiency_rating: Some(rating),
        optimization_narrative: format!("{rating}: {}", narrative(rating)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{AccountLabel, AccountRef, UNKNOWN_INSTRUCTION_TYPE};

    fn ix(kind: InstructionKind, semantic_type: &str, accounts: usize) -> CanonicalInstruction {
        CanonicalInstruction {
            program_id: "p".to_string(),
            kind,
            semantic_type: semantic_type.to_string(),
            account_refs: (0..accounts)
                .map(|i| AccountRef {
                    address: format!("a{i}"),
                    label: AccountLabel::Positional(i + 1),
                    table_index: Some(i),
                })
                .collect(),
            compute_unit_limit: None,
        }
    }

    fn lcg_next(state: &mut u64) -> u64 {
        *state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        *state
    }

    #[test]
    fn base_units_follow_semantic_type() {
        let cases = [
            ("transfer", 2_300),
            ("transferChecked", 2_300),
            ("createAccount", 5_000),
            ("createAccountWithSeed", 5_000),
            ("createIdempotent", 6_000),
            ("initializeAccount3", 8_000),
            ("swap", 25_000),
            ("delegateStake", 15_000),
            ("closeAccount", UNKNOWN_BASE_UNITS),
            (UNKNOWN_INSTRUCTION_TYPE, UNKNOWN_BASE_UNITS),
        ];
        for (name, expected) in cases {
            assert_eq!(
                base_units(&ix(InstructionKind::Parsed, name, 2)),
                expected,
                "mismatch for {name}"
            );
        }
        assert_eq!(
            base_units(&ix(InstructionKind::Compiled, UNKNOWN_INSTRUCTION_TYPE, 2)),
            COMPILED_BASE_UNITS
        );
    }

    #[test]
    fn step_estimate_scales_with_account_groups() {
        assert_eq!(estimate_step_units(&ix(InstructionKind::Parsed, "transfer", 0)), 2_300);
        assert_eq!(estimate_step_units(&ix(InstructionKind::Parsed, "transfer", 5)), 2_300);
        assert_eq!(estimate_step_units(&ix(InstructionKind::Parsed, "transfer", 6)), 4_600);
        assert_eq!(estimate_step_units(&ix(InstructionKind::Parsed, "swap", 12)), 100_000);
    }

    #[test]
    fn efficiency_class_thresholds() {
        assert_eq!(efficiency_class(2_300, 2), EfficiencyClass::Optimal);
        assert_eq!(efficiency_class(10_000, 1), EfficiencyClass::Good);
        assert_eq!(efficiency_class(15_000, 1), EfficiencyClass::Poor);
        assert_eq!(efficiency_class(15_000, 0), EfficiencyClass::Poor);
        assert_eq!(efficiency_class(14_999, 0), EfficiencyClass::Good);
    }

    #[test]
    fn hints_cover_large_swap_and_unknown_instructions() {
        assert!(optimization_hints(&ix(InstructionKind::Parsed, "transfer", 2)).is_empty());

        let swap = optimization_hints(&ix(InstructionKind::Parsed, "swapBaseIn", 11));
        assert_eq!(swap.len(), 3);
        assert!(swap[0].contains("splitting"));
        assert!(swap[1].contains("directly"));
        assert!(swap[2].contains("Batch"));

        let compiled = optimization_hints(&ix(InstructionKind::Compiled, UNKNOWN_INSTRUCTION_TYPE, 3));
        assert_eq!(compiled.len(), 1);
        assert!(compiled[0].contains("jsonParsed"));
    }

    #[test]
    fn requested_estimate_has_floor_and_headroom() {
        let config = DiagnosticsConfig::default();
        assert_eq!(requested_units_estimate(0, &config), 200_000);
        assert_eq!(requested_units_estimate(150_000, &config), 200_000);
        assert_eq!(requested_units_estimate(500_000, &config), 600_000);
    }

    #[test]
    fn performance_report_for_typical_transaction() {
        let report = performance_report(150_000, 5_000, 12_345, None, &DiagnosticsConfig::default());
        assert_eq!(report.compute_units_requested_estimate, 200_000);
        assert!((report.efficiency_percent - 75.0).abs() < 1e-9);
        assert_eq!(report.efficiency_rating, Some(EfficiencyRating::Good));
        assert!(report.optimization_narrative.starts_with("Good"));
        assert_eq!(report.fee_paid, 5_000);
        assert_eq!(report.slot, 12_345);
    }

    #[test]
    fn declared_limit_replaces_estimate() {
        let config = DiagnosticsConfig::default();
        let report = performance_report(95_000, 5_000, 1, Some(100_000), &config);
        assert_eq!(report.compute_units_requested_estimate, 100_000);
        assert!((report.efficiency_percent - 95.0).abs() < 1e-9);
        assert_eq!(report.efficiency_rating, Some(EfficiencyRating::Excellent));

        let zero_limit = performance_report(95_000, 5_000, 1, Some(0), &config);
        assert_eq!(zero_limit.compute_units_requested_estimate, 200_000);
    }

    #[test]
    fn efficiency_is_rounded_to_one_decimal() {
        assert!((efficiency_percent(1, 3) - 33.3).abs() < 1e-9);
        assert!((efficiency_percent(2, 3) - 66.7).abs() < 1e-9);
        assert!((efficiency_percent(5, 0)).abs() < 1e-9);
        assert!((efficiency_percent(300, 100) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rating_bands() {
        assert_eq!(efficiency_rating(90.1), EfficiencyRating::Excellent);
        assert_eq!(efficiency_rating(90.0), EfficiencyRating::Good);
        assert_eq!(efficiency_rating(70.0), EfficiencyRating::Moderate);
        assert_eq!(efficiency_rating(50.0), EfficiencyRating::Poor);
    }

    #[test]
    fn efficiency_bounds_hold_for_randomized_inputs() {
        let config = DiagnosticsConfig::default();
        let mut seed = 0xA11CE_u64;
        for _ in 0..20_000 {
            let consumed = lcg_next(&mut seed) % 3_000_000;
            let limit = match lcg_next(&mut seed) % 3 {
                0 => None,
                _ => Some(lcg_next(&mut seed) % 1_400_000),
            };
            let report = performance_report(consumed, 5_000, 1, limit, &config);
            assert!((0.0..=100.0).contains(&report.efficiency_percent));
            assert!(report.compute_units_requested_estimate > 0);
        }
    }
}
