#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod instruction;
pub mod programs;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DiagnosticsConfig;
pub use diagnostics::classifier::{ErrorClassifier, ErrorRule};
pub use diagnostics::{
    Account, CpiFlowStep, DiagnosticEngine, DiagnosticReport, EfficiencyClass, EfficiencyRating,
    ErrorKind, PerformanceReport, ReportMetadata, Severity, TransactionError, TransactionStatus,
};
pub use error::Error;
pub use instruction::{CanonicalInstruction, InstructionKind, normalize};
pub use programs::{ProgramRegistry, UNKNOWN_PROGRAM};
pub use types::{MessageHeader, RawTransactionRecord};
