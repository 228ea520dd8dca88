pub mod roles;

use serde::Deserialize;

use crate::programs::COMPUTE_BUDGET_PROGRAM_ID;

pub const UNKNOWN_INSTRUCTION_TYPE: &str = "unknown";

/// Fields of a parsed instruction's `info` object that name accounts, in the
/// order they are reported.
pub const PARSED_ACCOUNT_FIELDS: &[&str] = &[
    "account",
    "source",
    "destination",
    "authority",
    "mint",
    "owner",
];

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    strum_macros::Display,
    strum_macros::AsRefStr,
)]
pub enum InstructionKind {
    Parsed,
    PartiallyDecoded,
    Compiled,
}

/// The three shapes an RPC node may return for a single instruction.
///
/// Variant order matters: `untagged` tries them top to bottom, and only the
/// parsed shape carries a `parsed` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum InstructionEncoding {
    Parsed {
        #[serde(rename = "programId")]
        program_id: String,
        parsed: serde_json::Value,
    },
    PartiallyDecoded {
        #[serde(rename = "programId")]
        program_id: String,
        accounts: Vec<String>,
        #[serde(default)]
        data: Option<String>,
    },
    Compiled {
        #[serde(rename = "programIdIndex")]
        program_id_index: usize,
        accounts: Vec<usize>,
        #[serde(default)]
        data: Option<String>,
    },
}

/// Compute Budget `SetComputeUnitLimit` tag; a little-endian `u32` follows.
const SET_COMPUTE_UNIT_LIMIT: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountLabel {
    /// Named by the parsed `info` field it came from.
    Field(&'static str),
    /// 1-based position within the instruction's account list.
    Positional(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub address: String,
    pub label: AccountLabel,
    /// Position of `address` in the transaction-wide address table.
    pub table_index: Option<usize>,
}

/// Instruction shape every downstream stage works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalInstruction {
    pub program_id: String,
    pub kind: InstructionKind,
    pub semantic_type: String,
    pub account_refs: Vec<AccountRef>,
    /// Limit declared by a Compute Budget `SetComputeUnitLimit` instruction.
    pub compute_unit_limit: Option<u64>,
}

impl CanonicalInstruction {
    pub fn is_unknown_type(&self) -> bool {
        self.kind == InstructionKind::Compiled || self.semantic_type == UNKNOWN_INSTRUCTION_TYPE
    }
}

/// Resolve one raw instruction against the transaction's address table.
///
/// Returns `None` for shapes that match no encoding and for compiled
/// instructions whose program index falls outside the table.
pub fn normalize(raw: &serde_json::Value, addresses: &[String]) -> Option<CanonicalInstruction> {
    let encoding = match InstructionEncoding::deserialize(raw) {
        Ok(encoding) => encoding,
        Err(err) => {
            tracing::debug!(%err, "instruction matches no known encoding");
            return None;
        }
    };

    match encoding {
        InstructionEncoding::Parsed { program_id, parsed } => {
            Some(normalize_parsed(program_id, &parsed, addresses))
        }
        InstructionEncoding::PartiallyDecoded {
            program_id,
            accounts,
            data,
        } => {
            let account_refs = accounts
                .into_iter()
                .enumerate()
                .map(|(i, address)| AccountRef {
                    table_index: table_position(addresses, &address),
                    address,
                    label: AccountLabel::Positional(i + 1),
                })
                .collect();
            Some(CanonicalInstruction {
                compute_unit_limit: declared_compute_unit_limit(&program_id, data.as_deref()),
                program_id,
                kind: InstructionKind::PartiallyDecoded,
                semantic_type: UNKNOWN_INSTRUCTION_TYPE.to_string(),
                account_refs,
            })
        }
        InstructionEncoding::Compiled {
            program_id_index,
            accounts,
            data,
        } => {
            let Some(program_id) = addresses.get(program_id_index) else {
                tracing::debug!(
                    program_id_index,
                    table_len = addresses.len(),
                    "compiled instruction program index out of bounds"
                );
                return None;
            };
            let account_refs = accounts
                .into_iter()
                .filter_map(|idx| addresses.get(idx).map(|address| (idx, address)))
                .enumerate()
                .map(|(i, (idx, address))| AccountRef {
                    address: address.clone(),
                    label: AccountLabel::Positional(i + 1),
                    table_index: Some(idx),
                })
                .collect();
            Some(CanonicalInstruction {
                program_id: program_id.clone(),
                kind: InstructionKind::Compiled,
                semantic_type: UNKNOWN_INSTRUCTION_TYPE.to_string(),
                account_refs,
                compute_unit_limit: declared_compute_unit_limit(program_id, data.as_deref()),
            })
        }
    }
}

fn normalize_parsed(
    program_id: String,
    parsed: &serde_json::Value,
    addresses: &[String],
) -> CanonicalInstruction {
    let semantic_type = parsed
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or(UNKNOWN_INSTRUCTION_TYPE)
        .to_string();

    let info = parsed.get("info");
    let account_refs = info
        .map(|info| {
            PARSED_ACCOUNT_FIELDS
                .iter()
                .filter_map(|field| {
                    let address = info.get(*field)?.as_str()?;
                    Some(AccountRef {
                        address: address.to_string(),
                        label: AccountLabel::Field(*field),
                        table_index: table_position(addresses, address),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    CanonicalInstruction {
        program_id,
        kind: InstructionKind::Parsed,
        semantic_type,
        account_refs,
        compute_unit_limit: None,
    }
}

/// Units requested by a Compute Budget `SetComputeUnitLimit` instruction,
/// read from its base58 instruction data.
fn declared_compute_unit_limit(program_id: &str, data: Option<&str>) -> Option<u64> {
    if program_id != COMPUTE_BUDGET_PROGRAM_ID {
        return None;
    }
    let bytes = match bs58::decode(data?).into_vec() {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(%err, "compute budget data is not base58");
            return None;
        }
    };
    match bytes.as_slice() {
        [SET_COMPUTE_UNIT_LIMIT, a, b, c, d, ..] => {
            Some(u64::from(u32::from_le_bytes([*a, *b, *c, *d])))
        }
        _ => None,
    }
}

fn table_position(addresses: &[String], address: &str) -> Option<usize> {
    addresses.iter().position(|a| a == address)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::programs::{SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};

    fn table() -> Vec<String> {
        ["payer", "dest", "mint", SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    #[test]
    fn parsed_instruction_extracts_known_fields_in_fixed_order() {
        let raw = serde_json::json!({
            "program": "spl-token",
            "programId": TOKEN_PROGRAM_ID,
            "parsed": {
                "type": "transferChecked",
                "info": {
                    "authority": "payer",
                    "destination": "dest",
                    "mint": "mint",
                    "source": "elsewhere",
                    "tokenAmount": { "amount": "10" }
                }
            },
            "stackHeight": null
        });
        let ix = normalize(&raw, &table()).unwrap();
        assert_eq!(ix.kind, InstructionKind::Parsed);
        assert_eq!(ix.semantic_type, "transferChecked");
        let labels: Vec<_> = ix.account_refs.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                AccountLabel::Field("source"),
                AccountLabel::Field("destination"),
                AccountLabel::Field("authority"),
                AccountLabel::Field("mint"),
            ]
        );
        assert_eq!(ix.account_refs[0].table_index, None);
        assert_eq!(ix.account_refs[1].table_index, Some(1));
        assert!(!ix.is_unknown_type());
    }

    #[test]
    fn parsed_instruction_without_type_is_unknown() {
        let raw = serde_json::json!({
            "program": "spl-memo",
            "programId": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
            "parsed": "hello"
        });
        let ix = normalize(&raw, &table()).unwrap();
        assert_eq!(ix.kind, InstructionKind::Parsed);
        assert_eq!(ix.semantic_type, UNKNOWN_INSTRUCTION_TYPE);
        assert!(ix.account_refs.is_empty());
        assert!(ix.is_unknown_type());
    }

    #[test]
    fn partially_decoded_accounts_are_positional() {
        let raw = serde_json::json!({
            "programId": "Custom111111111111111111111111111111111111",
            "accounts": ["payer", "dest", "unlisted"],
            "data": "3Bxs4h24hBtQy9rw"
        });
        let ix = normalize(&raw, &table()).unwrap();
        assert_eq!(ix.kind, InstructionKind::PartiallyDecoded);
        assert_eq!(ix.account_refs.len(), 3);
        assert_eq!(ix.account_refs[2].label, AccountLabel::Positional(3));
        assert_eq!(ix.account_refs[2].table_index, None);
        assert_eq!(ix.account_refs[0].table_index, Some(0));
    }

    #[test]
    fn compiled_instruction_resolves_through_table() {
        let raw = serde_json::json!({
            "programIdIndex": 4,
            "accounts": [0, 1, 2],
            "data": "3Bxs4h24hBtQy9rw"
        });
        let ix = normalize(&raw, &table()).unwrap();
        assert_eq!(ix.kind, InstructionKind::Compiled);
        assert_eq!(ix.program_id, TOKEN_PROGRAM_ID);
        assert_eq!(ix.account_refs[1].address, "dest");
        assert_eq!(ix.account_refs[1].table_index, Some(1));
        assert!(ix.is_unknown_type());
    }

    #[test]
    fn compiled_instruction_with_out_of_range_program_is_dropped() {
        let raw = serde_json::json!({ "programIdIndex": 9, "accounts": [0] });
        assert!(normalize(&raw, &table()).is_none());
    }

    #[test]
    fn compiled_instruction_skips_out_of_range_accounts() {
        let raw = serde_json::json!({ "programIdIndex": 3, "accounts": [0, 42, 1] });
        let ix = normalize(&raw, &table()).unwrap();
        let addresses: Vec<_> = ix.account_refs.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(addresses, vec!["payer", "dest"]);
        assert_eq!(ix.account_refs[1].label, AccountLabel::Positional(2));
    }

    #[test]
    fn unrecognised_shape_is_dropped() {
        assert!(normalize(&serde_json::json!({ "foo": 1 }), &table()).is_none());
        assert!(normalize(&serde_json::json!("text"), &table()).is_none());
    }

    fn compute_budget_data(tag: u8, payload: &[u8]) -> String {
        let mut bytes = vec![tag];
        bytes.extend_from_slice(payload);
        bs58::encode(bytes).into_string()
    }

    #[test]
    fn compute_unit_limit_is_decoded_from_instruction_data() {
        let data = compute_budget_data(SET_COMPUTE_UNIT_LIMIT, &400_000_u32.to_le_bytes());
        let partially_decoded = serde_json::json!({
            "programId": COMPUTE_BUDGET_PROGRAM_ID,
            "accounts": [],
            "data": data,
            "stackHeight": null
        });
        let ix = normalize(&partially_decoded, &table()).unwrap();
        assert_eq!(ix.kind, InstructionKind::PartiallyDecoded);
        assert_eq!(ix.compute_unit_limit, Some(400_000));

        let mut addresses = table();
        addresses.push(COMPUTE_BUDGET_PROGRAM_ID.to_string());
        let compiled = serde_json::json!({ "programIdIndex": 5, "accounts": [], "data": data });
        assert_eq!(
            normalize(&compiled, &addresses).unwrap().compute_unit_limit,
            Some(400_000)
        );
    }

    #[test]
    fn other_compute_budget_instructions_declare_no_limit() {
        let price = compute_budget_data(0x03, &12_500_u64.to_le_bytes());
        let truncated = compute_budget_data(SET_COMPUTE_UNIT_LIMIT, &[0x80, 0x1a]);
        for data in [price, truncated, "0OIl".to_string()] {
            let raw = serde_json::json!({ "programId": COMPUTE_BUDGET_PROGRAM_ID, "accounts": [], "data": data });
            assert_eq!(normalize(&raw, &table()).unwrap().compute_unit_limit, None);
        }

        let elsewhere = serde_json::json!({
            "programId": "Custom111111111111111111111111111111111111",
            "accounts": [],
            "data": compute_budget_data(SET_COMPUTE_UNIT_LIMIT, &400_000_u32.to_le_bytes())
        });
        assert_eq!(normalize(&elsewhere, &table()).unwrap().compute_unit_limit, None);
    }
}
