use regex::Regex;

use crate::config::DiagnosticsConfig;
use crate::diagnostics::{ErrorKind, Severity, TransactionError};
use crate::error::Error;
use crate::instruction;
use crate::programs::{TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::types::RawTransactionRecord;

pub const UNKNOWN_PROGRAM_ID: &str = "unknown";

/// Placeholder in rule messages replaced by the serialized failure value.
pub const ERROR_PLACEHOLDER: &str = "{error}";

/// One entry of the failure-signal rule table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRule {
    pub pattern: String,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    pub suggested_fix: String,
    #[serde(default)]
    pub code_example: Option<String>,
    #[serde(default)]
    pub documentation_link: Option<String>,
    #[serde(default)]
    pub estimated_fix_time: Option<String>,
    /// Programs whose failures the rule applies to; empty means any program.
    #[serde(default)]
    pub programs: Vec<String>,
}

impl ErrorRule {
    fn new(
        pattern: &str,
        kind: ErrorKind,
        severity: Severity,
        message: &str,
        suggested_fix: &str,
    ) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind,
            severity,
            message: message.to_string(),
            suggested_fix: suggested_fix.to_string(),
            code_example: None,
            documentation_link: None,
            estimated_fix_time: None,
            programs: Vec::new(),
        }
    }

    fn code(mut self, example: &str) -> Self {
        self.code_example = Some(example.to_string());
        self
    }

    fn docs(mut self, link: &str) -> Self {
        self.documentation_link = Some(link.to_string());
        self
    }

    fn fix_time(mut self, estimate: &str) -> Self {
        self.estimated_fix_time = Some(estimate.to_string());
        self
    }

    fn only_for(mut self, programs: &[&str]) -> Self {
        self.programs = programs.iter().map(|p| (*p).to_string()).collect();
        self
    }

    pub fn applies_to(&self, program_id: &str) -> bool {
        self.programs.is_empty() || self.programs.iter().any(|p| p == program_id)
    }
}

/// Programs sharing the SPL Token error codes.
const TOKEN_PROGRAMS: &[&str] = &[TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID];

/// Built-in rules, evaluated in order; the first match wins.
pub fn standard_rules() -> Vec<ErrorRule> {
    vec![
        ErrorRule::new(
            r"(?i)insufficient (funds|balance|lamports)|\bInsufficientFunds(ForFee)?\b",
            ErrorKind::AccountBalanceMismatch,
            Severity::Critical,
            "An account balance was insufficient for the requested operation: {error}",
            "Check the source account balance covers the amount plus fees and rent before sending.",
        )
        .code(
            "let balance = client.get_balance(&payer.pubkey())?;\nif balance < amount + fee {\n    return Err(anyhow!(\"insufficient balance\"));\n}",
        )
        .docs("https://solana.com/docs/core/fees")
        .fix_time("5 minutes"),
        ErrorRule::new(
            r"(?i)realloc|MAX_PERMITTED_DATA_INCREASE|data increase",
            ErrorKind::ReallocConstraintExceeded,
            Severity::Critical,
            "Account reallocation exceeded the permitted size increase: {error}",
            "Grow the account by at most 10 KiB per instruction and fund the extra rent before resizing.",
        )
        .code(
            "let new_len = account.data_len() + MAX_PERMITTED_DATA_INCREASE.min(extra);\naccount.resize(new_len)?;",
        )
        .docs("https://docs.rs/solana-account-info/latest/solana_account_info/struct.AccountInfo.html#method.resize")
        .fix_time("30 minutes"),
        ErrorRule::new(
            r"(?i)ComputationalBudgetExceeded|exceeded CUs meter|compute budget exceeded|ProgramFailedToComplete",
            ErrorKind::ComputeBudgetExceeded,
            Severity::Warning,
            "The transaction ran out of compute units: {error}",
            "Request a higher limit with a Compute Budget instruction or reduce work per instruction.",
        )
        .code("ComputeBudgetInstruction::set_compute_unit_limit(400_000)")
        .docs("https://solana.com/docs/core/fees#compute-budget")
        .fix_time("10 minutes"),
        ErrorRule::new(
            r"(?i)InsufficientFundsForRent|rent[ -]exempt|\brent\b",
            ErrorKind::RentViolation,
            Severity::Warning,
            "An account would be left below the rent-exempt minimum: {error}",
            "Fund the account with at least the rent-exempt minimum for its data size, or close it entirely.",
        )
        .code("let lamports = rent.minimum_balance(space);")
        .docs("https://solana.com/docs/core/accounts#rent")
        .fix_time("10 minutes"),
        ErrorRule::new(
            r"(?i)AccountDataTooSmall|data too (small|large)|MaxAccountsDataAllocationsExceeded|InvalidAccountDataLength|ConstraintSpace",
            ErrorKind::AccountSizeExceeded,
            Severity::Warning,
            "Account data size does not fit the operation: {error}",
            "Allocate enough space when creating the account, including the discriminator and any growth.",
        )
        .code("space = 8 + MyAccount::INIT_SPACE")
        .docs("https://solana.com/docs/core/accounts")
        .fix_time("15 minutes"),
        ErrorRule::new(
            r"(?i)MissingRequiredSignature|IllegalOwner|IncorrectAuthority|owner does not match|invalid authority|ConstraintHasOne|ConstraintSigner",
            ErrorKind::AuthorityMismatch,
            Severity::Critical,
            "A required signer or account owner did not match: {error}",
            "Verify the signing authority and account owners match what the program expects.",
        )
        .docs("https://solana.com/docs/core/transactions#signatures")
        .fix_time("15 minutes"),
        // SPL Token `InsufficientFunds`; other programs reuse custom code 1.
        ErrorRule::new(
            r#""Custom":1\}"#,
            ErrorKind::AccountBalanceMismatch,
            Severity::Critical,
            "The token account balance was insufficient for the transfer: {error}",
            "Check the source token account holds at least the transfer amount before sending.",
        )
        .docs("https://spl.solana.com/token")
        .fix_time("5 minutes")
        .only_for(TOKEN_PROGRAMS),
        // SPL Token `OwnerMismatch`.
        ErrorRule::new(
            r#""Custom":4\}"#,
            ErrorKind::AuthorityMismatch,
            Severity::Critical,
            "The token account owner did not match the signing authority: {error}",
            "Sign with the token account's owner or a delegate approved for the amount.",
        )
        .docs("https://spl.solana.com/token")
        .fix_time("15 minutes")
        .only_for(TOKEN_PROGRAMS),
    ]
}

/// Rule engine over a transaction's failure, compute and balance signals.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<(Regex, ErrorRule)>,
}

impl ErrorClassifier {
    pub fn new(rules: Vec<ErrorRule>) -> Result<Self, Error> {
        let rules = rules
            .into_iter()
            .map(|rule| match Regex::new(&rule.pattern) {
                Ok(regex) => Ok((regex, rule)),
                Err(source) => Err(Error::InvalidRule {
                    pattern: rule.pattern,
                    source,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn standard() -> Result<Self, Error> {
        Self::new(standard_rules())
    }

    /// Rules from a JSON array of [`ErrorRule`] objects.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn rules(&self) -> impl Iterator<Item = &ErrorRule> {
        self.rules.iter().map(|(_, rule)| rule)
    }

    /// First rule applying to `program_id` whose pattern matches `text`, in
    /// table order.
    pub fn first_match(&self, text: &str, program_id: &str) -> Option<&ErrorRule> {
        self.rules
            .iter()
            .find(|(regex, rule)| rule.applies_to(program_id) && regex.is_match(text))
            .map(|(_, rule)| rule)
    }

    /// Findings in check order: failure signal, compute ceiling, rent.
    pub fn classify(
        &self,
        record: &RawTransactionRecord,
        addresses: &[String],
        config: &DiagnosticsConfig,
    ) -> Vec<TransactionError> {
        let mut errors = Vec::new();

        if let Some(failure) = record.failure() {
            self.classify_failure(failure, record, addresses, &mut errors);
        }

        let consumed = record.compute_units_consumed();
        if consumed > config.compute_ceiling {
            errors.push(compute_ceiling_warning(consumed, config.compute_ceiling));
        }

        errors.extend(rent_violations(record, addresses, config.rent_exempt_minimum));
        errors
    }

    fn classify_failure(
        &self,
        failure: &serde_json::Value,
        record: &RawTransactionRecord,
        addresses: &[String],
        errors: &mut Vec<TransactionError>,
    ) {
        let text = failure.to_string();
        let instruction_index = failing_instruction_index(failure);
        let program_id = record
            .transaction
            .message
            .instructions
            .get(instruction_index)
            .and_then(|raw| instruction::normalize(raw, addresses))
            .map_or_else(|| UNKNOWN_PROGRAM_ID.to_string(), |ix| ix.program_id);

        let logs = record.log_messages();
        let searched = if logs.is_empty() {
            text.clone()
        } else {
            format!("{text}\n{}", logs.join("\n"))
        };
        let matched = self.first_match(&searched, &program_id);

        if let Some(rule) = matched {
            tracing::debug!(kind = %rule.kind, instruction_index, "failure matched rule");
            errors.push(TransactionError {
                kind: rule.kind,
                severity: rule.severity,
                instruction_index,
                program_id: program_id.clone(),
                message: rule.message.replace(ERROR_PLACEHOLDER, &text),
                suggested_fix: rule.suggested_fix.clone(),
                code_example: rule.code_example.clone(),
                documentation_link: rule.documentation_link.clone(),
                estimated_fix_time: rule.estimated_fix_time.clone(),
                account: None,
            });
            if rule.severity == Severity::Critical {
                return;
            }
        }

        errors.push(program_error(instruction_index, program_id, &text));
    }
}

/// Top-level index from `{"InstructionError": [index, ...]}`, else 0.
pub fn failing_instruction_index(failure: &serde_json::Value) -> usize {
    failure
        .get("InstructionError")
        .and_then(|v| v.get(0))
        .and_then(serde_json::Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(0)
}

fn program_error(instruction_index: usize, program_id: String, text: &str) -> TransactionError {
    TransactionError {
        kind: ErrorKind::ProgramError,
        severity: Severity::Critical,
        instruction_index,
        program_id,
        message: format!("Program execution failed: {text}"),
        suggested_fix:
            "Inspect the program logs for the failing instruction and look up its error code in the program's IDL."
                .to_string(),
        code_example: None,
        documentation_link: Some("https://solana.com/docs/programs/debugging".to_string()),
        estimated_fix_time: Some("1 hour".to_string()),
        account: None,
    }
}

fn compute_ceiling_warning(consumed: u64, ceiling: u64) -> TransactionError {
    TransactionError {
        kind: ErrorKind::ComputeBudgetExceeded,
        severity: Severity::Warning,
        instruction_index: 0,
        program_id: UNKNOWN_PROGRAM_ID.to_string(),
        message: format!(
            "Transaction consumed {consumed} compute units, above the {ceiling} unit threshold."
        ),
        suggested_fix:
            "Profile the heaviest instructions and split work across transactions, or set an explicit compute unit limit."
                .to_string(),
        code_example: Some(
            "ComputeBudgetInstruction::set_compute_unit_limit(consumed * 11 / 10)".to_string(),
        ),
        documentation_link: Some("https://solana.com/docs/core/fees#compute-budget".to_string()),
        estimated_fix_time: Some("1 hour".to_string()),
        account: None,
    }
}

/// One warning per account whose balance dropped below `minimum`.
fn rent_violations(
    record: &RawTransactionRecord,
    addresses: &[String],
    minimum: u64,
) -> Vec<TransactionError> {
    record
        .pre_balances()
        .iter()
        .zip(record.post_balances())
        .enumerate()
        .filter(|(_, (pre, post))| **post < minimum && post < pre)
        .map(|(index, (pre, post))| {
            let address = addresses
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("account #{index}"));
            TransactionError {
                kind: ErrorKind::RentViolation,
                severity: Severity::Warning,
                instruction_index: 0,
                program_id: UNKNOWN_PROGRAM_ID.to_string(),
                message: format!(
                    "Account {address} dropped from {pre} to {post} lamports, below the rent-exempt minimum of {minimum}."
                ),
                suggested_fix:
                    "Keep at least the rent-exempt minimum in the account, or close it and reclaim the full balance."
                        .to_string(),
                code_example: Some("let lamports = rent.minimum_balance(account.data_len());".to_string()),
                documentation_link: Some("https://solana.com/docs/core/accounts#rent".to_string()),
                estimated_fix_time: Some("10 minutes".to_string()),
                account: Some(address),
            }
        })
        .collect()
}
