use crate::diagnostics::compute;
use crate::diagnostics::{Account, CpiFlowStep};
use crate::instruction::roles;
use crate::instruction::{self, CanonicalInstruction};
use crate::programs::ProgramRegistry;
use crate::types::{MessageHeader, RawTransactionRecord, TableLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    /// Depth-0 steps in source order, each followed by its depth-1 steps.
    pub steps: Vec<CpiFlowStep>,
    /// Compute unit limit declared by a top-level Compute Budget instruction.
    pub compute_unit_limit: Option<u64>,
}

struct StepContext<'a> {
    layout: TableLayout,
    header: Option<&'a MessageHeader>,
    pre_balances: &'a [u64],
    post_balances: &'a [u64],
    failure_message: Option<String>,
    registry: &'a ProgramRegistry,
}

impl StepContext<'_> {
    fn step(&self, id: String, ix: &CanonicalInstruction, depth: u8) -> CpiFlowStep {
        let accounts = ix
            .account_refs
            .iter()
            .map(|account_ref| {
                let flags = roles::resolve_flags(account_ref.table_index, self.layout, self.header);
                Account {
                    address: account_ref.address.clone(),
                    role_name: roles::role_name(account_ref.label),
                    is_signer: flags.is_signer,
                    is_writable: flags.is_writable,
                    data_changed: self.balance_changed(account_ref.table_index),
                }
            })
            .collect();

        let estimate = compute::estimate_step_units(ix);
        CpiFlowStep {
            id,
            program_name: self.registry.name(&ix.program_id).to_string(),
            program_id: ix.program_id.clone(),
            instruction_type: ix.semantic_type.clone(),
            depth,
            accounts,
            succeeded: self.failure_message.is_none(),
            error_message: self.failure_message.clone(),
            compute_units_estimate: estimate,
            efficiency_class: compute::efficiency_class(estimate, ix.account_refs.len()),
            optimization_hints: compute::optimization_hints(ix),
        }
    }

    fn balance_changed(&self, table_index: Option<usize>) -> bool {
        table_index
            .and_then(|i| Some((self.pre_balances.get(i)?, self.post_balances.get(i)?)))
            .is_some_and(|(pre, post)| pre != post)
    }
}

/// Build the ordered call tree.
///
/// Top-level instructions that fail to normalize are skipped, and inner
/// groups anchored at them (or at no instruction at all) are dropped.
pub fn build_flow(
    record: &RawTransactionRecord,
    addresses: &[String],
    registry: &ProgramRegistry,
) -> FlowOutcome {
    let ctx = StepContext {
        layout: record.table_layout(),
        header: record.transaction.message.header.as_ref(),
        pre_balances: record.pre_balances(),
        post_balances: record.post_balances(),
        failure_message: record
            .failure()
            .map(|err| format!("Transaction failed: {err}")),
        registry,
    };

    let top_level = &record.transaction.message.instructions;
    let mut steps = Vec::with_capacity(top_level.len());
    let mut compute_unit_limit = None;
    let mut anchored = vec![false; top_level.len()];

    for (i, raw) in top_level.iter().enumerate() {
        let Some(ix) = instruction::normalize(raw, addresses) else {
            tracing::debug!(index = i, "skipping top-level instruction that failed to normalize");
            continue;
        };
        if ix.compute_unit_limit.is_some() {
            compute_unit_limit = ix.compute_unit_limit;
        }
        steps.push(ctx.step(i.to_string(), &ix, 0));
        anchored[i] = true;

        for (j, inner_raw) in record.inner_instructions_at(i).enumerate() {
            match instruction::normalize(inner_raw, addresses) {
                Some(inner) => steps.push(ctx.step(format!("{i}.{j}"), &inner, 1)),
                None => tracing::debug!(index = i, inner = j, "skipping inner instruction"),
            }
        }
    }

    if let Some(groups) = record
        .meta
        .as_ref()
        .and_then(|m| m.inner_instructions.as_ref())
    {
        for group in groups {
            if !anchored.get(group.index).copied().unwrap_or(false) {
                tracing::debug!(
                    index = group.index,
                    count = group.instructions.len(),
                    "dropping unreachable inner instruction group"
                );
            }
        }
    }

    FlowOutcome {
        steps,
        compute_unit_limit,
    }
}
