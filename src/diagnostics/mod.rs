pub mod classifier;
pub mod compute;
pub mod flow;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::DiagnosticsConfig;
use crate::diagnostics::classifier::ErrorClassifier;
use crate::error::Error;
use crate::programs::ProgramRegistry;
use crate::types::RawTransactionRecord;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum TransactionStatus {
    Success,
    Error,
    NotFound,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::VariantNames,
)]
pub enum ErrorKind {
    AccountBalanceMismatch,
    ReallocConstraintExceeded,
    ProgramError,
    ComputeBudgetExceeded,
    RentViolation,
    AccountSizeExceeded,
    AuthorityMismatch,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum EfficiencyClass {
    Optimal,
    Good,
    Poor,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum EfficiencyRating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    pub role_name: String,
    pub is_signer: bool,
    pub is_writable: bool,
    /// Balance differs between pre and post execution.
    pub data_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpiFlowStep {
    pub id: String,
    pub program_name: String,
    pub program_id: String,
    pub instruction_type: String,
    /// 0 for top-level instructions, 1 for instructions they invoke.
    pub depth: u8,
    pub accounts: Vec<Account>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub compute_units_estimate: u64,
    pub efficiency_class: EfficiencyClass,
    pub optimization_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub instruction_index: usize,
    pub program_id: String,
    pub message: String,
    pub suggested_fix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_fix_time: Option<String>,
    /// Offending account, for per-account findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub compute_units_used: u64,
    pub compute_units_requested_estimate: u64,
    pub fee_paid: u64,
    pub slot: u64,
    /// Always within `[0, 100]`, one decimal place.
    pub efficiency_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_rating: Option<EfficiencyRating>,
    pub optimization_narrative: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Block time of the record, 0 when the node did not report one.
    pub block_time: i64,
    /// Slots elapsed since the block time, at the configured slot duration;
    /// 0 without a block time.
    pub confirmation_estimate: u64,
    pub programs_involved: BTreeSet<String>,
    pub accounts_modified_count: usize,
    pub total_instructions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub signature: String,
    pub status: TransactionStatus,
    pub flow: Vec<CpiFlowStep>,
    pub errors: Vec<TransactionError>,
    pub performance: PerformanceReport,
    pub metadata: ReportMetadata,
}

impl DiagnosticReport {
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn has_critical_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Critical)
    }
}

/// Turns a fetched transaction record into a [`DiagnosticReport`].
///
/// Holds only read-only collaborators, so one engine can serve concurrent
/// callers.
pub struct DiagnosticEngine {
    config: DiagnosticsConfig,
    registry: ProgramRegistry,
    classifier: ErrorClassifier,
    clock: Box<dyn Clock>,
}

impl DiagnosticEngine {
    pub fn new(
        config: DiagnosticsConfig,
        registry: ProgramRegistry,
        classifier: ErrorClassifier,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            config,
            registry,
            classifier,
            clock: Box::new(clock),
        }
    }

    /// Default thresholds, well-known programs, built-in error rules and the
    /// system clock.
    pub fn standard() -> Result<Self, Error> {
        Ok(Self::new(
            DiagnosticsConfig::default(),
            ProgramRegistry::well_known(),
            ErrorClassifier::standard()?,
            SystemClock,
        ))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// Diagnose `record`, or produce a not-found report when it is `None`.
    ///
    /// Fails only when the record has no address table.
    pub fn diagnose(
        &self,
        signature: &str,
        record: Option<&RawTransactionRecord>,
    ) -> Result<DiagnosticReport, Error> {
        let Some(record) = record else {
            tracing::debug!(signature, "transaction not found");
            return Ok(self.not_found(signature));
        };

        let Some(addresses) = record.addresses() else {
            tracing::warn!(signature, "transaction record has no account keys");
            return Err(Error::MissingAccountKeys);
        };

        let flow = flow::build_flow(record, &addresses, &self.registry);
        let errors = self.classifier.classify(record, &addresses, &self.config);
        let performance = compute::performance_report(
            record.compute_units_consumed(),
            record.fee(),
            record.slot,
            flow.compute_unit_limit,
            &self.config,
        );

        let status = if record.failure().is_some() {
            TransactionStatus::Error
        } else {
            TransactionStatus::Success
        };

        let metadata = ReportMetadata {
            block_time: record.block_time.unwrap_or(0),
            confirmation_estimate: record.block_time.map_or(0, |block_time| {
                self.confirmation_estimate(block_time, self.clock.now_unix())
            }),
            programs_involved: flow.steps.iter().map(|s| s.program_id.clone()).collect(),
            accounts_modified_count: record
                .pre_balances()
                .iter()
                .zip(record.post_balances())
                .filter(|(pre, post)| pre != post)
                .count(),
            total_instructions: record.transaction.message.instructions.len()
                + record.inner_instruction_count(),
        };

        tracing::debug!(
            signature,
            %status,
            steps = flow.steps.len(),
            errors = errors.len(),
            efficiency = performance.efficiency_percent,
            "diagnosed transaction"
        );

        Ok(DiagnosticReport {
            signature: signature.to_string(),
            status,
            flow: flow.steps,
            errors,
            performance,
            metadata,
        })
    }

    /// Parse `json` as a `getTransaction` result and diagnose it. A JSON
    /// `null` (the RPC answer for unknown signatures) yields a not-found report.
    pub fn diagnose_json(&self, signature: &str, json: &str) -> Result<DiagnosticReport, Error> {
        let record: Option<RawTransactionRecord> = serde_json::from_str(json)?;
        self.diagnose(signature, record.as_ref())
    }

    pub fn not_found(&self, signature: &str) -> DiagnosticReport {
        DiagnosticReport {
            signature: signature.to_string(),
            status: TransactionStatus::NotFound,
            flow: Vec::new(),
            errors: Vec::new(),
            performance: PerformanceReport {
                compute_units_used: 0,
                compute_units_requested_estimate: 0,
                fee_paid: 0,
                slot: 0,
                efficiency_percent: 0.0,
                efficiency_rating: None,
                optimization_narrative: "Transaction not found; no compute data available."
                    .to_string(),
            },
            metadata: ReportMetadata {
                block_time: self.clock.now_unix(),
                confirmation_estimate: 0,
                programs_involved: BTreeSet::new(),
                accounts_modified_count: 0,
                total_instructions: 0,
            },
        }
    }

    fn confirmation_estimate(&self, block_time: i64, now: i64) -> u64 {
        let elapsed_ms = u64::try_from(now.saturating_sub(block_time))
            .unwrap_or(0)
            .saturating_mul(1000);
        elapsed_ms / self.config.slot_duration_ms.max(1)
    }
}
