/// A confirmed transaction as returned by the `getTransaction` RPC method
/// (`json` or `jsonParsed` encoding).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRecord {
    /// Slot in which the transaction landed.
    pub slot: u64,
    /// Estimated production time of the block, seconds since epoch.
    #[serde(default)]
    pub block_time: Option<i64>,
    pub transaction: RawTransaction,
    /// Execution metadata. `None` is treated as a successful transaction
    /// with zeroed balances, fee and compute usage.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: RawMessage,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Transaction-wide address table. Absent only for malformed records.
    #[serde(default)]
    pub account_keys: Option<Vec<AccountKey>>,
    /// Only present in the `json` encoding.
    #[serde(default)]
    pub header: Option<MessageHeader>,
    /// Top-level instructions, each in one of the three encodings the
    /// normalizer understands. Kept opaque until normalization.
    #[serde(default)]
    pub instructions: Vec<serde_json::Value>,
}

/// One entry of the address table.
///
/// The `json` encoding carries bare base58 strings, `jsonParsed` carries
/// objects with signer/writable flags.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
    Address(String),
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
        #[serde(default)]
        source: Option<String>,
    },
}

impl AccountKey {
    pub fn address(&self) -> &str {
        match self {
            Self::Address(address) => address,
            Self::Parsed { pubkey, .. } => pubkey,
        }
    }
}

/// Positional permission counts from the message header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// The first `num_required_signatures` addresses are signers.
    pub num_required_signatures: u8,
    /// The last `num_readonly_signed_accounts` signers are read-only.
    pub num_readonly_signed_accounts: u8,
    /// The last `num_readonly_unsigned_accounts` non-signers are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Opaque failure value, `None` on success.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructionGroup>>,
    #[serde(default)]
    pub compute_units_consumed: Option<u64>,
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
    /// Lookup-table addresses of a v0 message, `json` encoding only.
    #[serde(default)]
    pub loaded_addresses: Option<LoadedAddresses>,
}

/// Addresses a v0 message loads from address lookup tables. They follow the
/// static keys in the address table, writable ones first.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

/// Shape of the transaction-wide address table: static message keys, then
/// loaded writable, then loaded read-only addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub static_count: usize,
    pub loaded_writable: usize,
    pub loaded_readonly: usize,
}

impl TableLayout {
    /// Layout of a legacy message with `count` static keys.
    pub fn legacy(count: usize) -> Self {
        Self {
            static_count: count,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.static_count + self.loaded_writable + self.loaded_readonly
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Instructions invoked via CPI while executing top-level instruction `index`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InnerInstructionGroup {
    pub index: usize,
    #[serde(default)]
    pub instructions: Vec<serde_json::Value>,
}

impl RawTransactionRecord {
    /// First signature, which identifies the transaction.
    pub fn signature(&self) -> Option<&str> {
        self.transaction.signatures.first().map(String::as_str)
    }

    /// Addresses of the account table in order, or `None` when the table is
    /// missing entirely. Includes lookup-table addresses of v0 messages.
    pub fn addresses(&self) -> Option<Vec<String>> {
        let keys = self.transaction.message.account_keys.as_ref()?;
        let mut addresses: Vec<String> = keys.iter().map(|k| k.address().to_string()).collect();
        if let Some(loaded) = self.separately_loaded() {
            addresses.extend(loaded.writable.iter().cloned());
            addresses.extend(loaded.readonly.iter().cloned());
        }
        Some(addresses)
    }

    pub fn table_layout(&self) -> TableLayout {
        let static_count = self
            .transaction
            .message
            .account_keys
            .as_ref()
            .map_or(0, Vec::len);
        match self.separately_loaded() {
            Some(loaded) => TableLayout {
                static_count,
                loaded_writable: loaded.writable.len(),
                loaded_readonly: loaded.readonly.len(),
            },
            None => TableLayout::legacy(static_count),
        }
    }

    /// Loaded addresses not already listed in `accountKeys`. `jsonParsed`
    /// key lists carry lookup-table entries inline.
    fn separately_loaded(&self) -> Option<&LoadedAddresses> {
        let keys = self.transaction.message.account_keys.as_ref()?;
        if keys.iter().any(|k| matches!(k, AccountKey::Parsed { .. })) {
            return None;
        }
        self.meta.as_ref()?.loaded_addresses.as_ref()
    }

    pub fn failure(&self) -> Option<&serde_json::Value> {
        self.meta
            .as_ref()
            .and_then(|m| m.err.as_ref())
            .filter(|err| !err.is_null())
    }

    pub fn compute_units_consumed(&self) -> u64 {
        self.meta
            .as_ref()
            .and_then(|m| m.compute_units_consumed)
            .unwrap_or(0)
    }

    pub fn fee(&self) -> u64 {
        self.meta.as_ref().map_or(0, |m| m.fee)
    }

    pub fn pre_balances(&self) -> &[u64] {
        self.meta
            .as_ref()
            .map(|m| m.pre_balances.as_slice())
            .unwrap_or_default()
    }

    pub fn post_balances(&self) -> &[u64] {
        self.meta
            .as_ref()
            .map(|m| m.post_balances.as_slice())
            .unwrap_or_default()
    }

    pub fn log_messages(&self) -> &[String] {
        self.meta
            .as_ref()
            .and_then(|m| m.log_messages.as_deref())
            .unwrap_or(&[])
    }

    /// Inner instruction groups anchored at top-level `index`, in source order.
    pub fn inner_instructions_at(&self, index: usize) -> impl Iterator<Item = &serde_json::Value> {
        self.meta
            .as_ref()
            .and_then(|m| m.inner_instructions.as_deref())
            .unwrap_or(&[])
            .iter()
            .filter(move |group| group.index == index)
            .flat_map(|group| group.instructions.iter())
    }

    /// Number of inner instructions across all groups, reachable or not.
    pub fn inner_instruction_count(&self) -> usize {
        self.meta
            .as_ref()
            .and_then(|m| m.inner_instructions.as_deref())
            .unwrap_or(&[])
            .iter()
            .map(|group| group.instructions.len())
            .sum()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn account_keys_accept_both_encodings() {
        let keys: Vec<AccountKey> = serde_json::from_value(serde_json::json!([
            "Payer1111111111111111111111111111111111111",
            { "pubkey": "Dest111111111111111111111111111111111111111", "signer": false, "writable": true, "source": "transaction" }
        ]))
        .unwrap();
        assert_eq!(keys[0].address(), "Payer1111111111111111111111111111111111111");
        assert_eq!(keys[1].address(), "Dest111111111111111111111111111111111111111");
    }

    #[test]
    fn null_err_is_not_a_failure() {
        let record: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "slot": 1,
            "transaction": { "signatures": ["sig"], "message": { "accountKeys": [], "instructions": [] } },
            "meta": { "err": null, "fee": 5000, "preBalances": [], "postBalances": [] }
        }))
        .unwrap();
        assert!(record.failure().is_none());
        assert_eq!(record.fee(), 5000);
        assert_eq!(record.compute_units_consumed(), 0);
        assert_eq!(record.signature(), Some("sig"));
    }

    #[test]
    fn missing_meta_yields_zeroed_signals() {
        let record: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "slot": 7,
            "transaction": { "message": { "accountKeys": ["a"] } }
        }))
        .unwrap();
        assert!(record.failure().is_none());
        assert!(record.pre_balances().is_empty());
        assert_eq!(record.inner_instruction_count(), 0);
        assert_eq!(record.inner_instructions_at(0).count(), 0);
    }

    #[test]
    fn inner_instructions_are_selected_by_anchor_index() {
        let record: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "slot": 7,
            "transaction": { "message": { "accountKeys": ["a"] } },
            "meta": {
                "innerInstructions": [
                    { "index": 1, "instructions": [{ "programIdIndex": 0, "accounts": [] }] },
                    { "index": 0, "instructions": [
                        { "programIdIndex": 0, "accounts": [0] },
                        { "programIdIndex": 0, "accounts": [] }
                    ] }
                ]
            }
        }))
        .unwrap();
        assert_eq!(record.inner_instructions_at(0).count(), 2);
        assert_eq!(record.inner_instructions_at(1).count(), 1);
        assert_eq!(record.inner_instructions_at(2).count(), 0);
        assert_eq!(record.inner_instruction_count(), 3);
    }

    #[test]
    fn loaded_addresses_extend_the_table_after_static_keys() {
        let record: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "slot": 7,
            "transaction": { "message": { "accountKeys": ["payer", "program"] } },
            "meta": { "loadedAddresses": { "writable": ["dest"], "readonly": ["token"] } }
        }))
        .unwrap();
        assert_eq!(
            record.addresses().unwrap(),
            vec!["payer", "program", "dest", "token"]
        );
        assert_eq!(
            record.table_layout(),
            TableLayout {
                static_count: 2,
                loaded_writable: 1,
                loaded_readonly: 1,
            }
        );
    }

    #[test]
    fn parsed_key_lists_already_include_loaded_addresses() {
        let record: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "slot": 7,
            "transaction": { "message": { "accountKeys": [
                { "pubkey": "payer", "signer": true, "writable": true, "source": "transaction" },
                { "pubkey": "dest", "signer": false, "writable": true, "source": "lookupTable" }
            ] } },
            "meta": { "loadedAddresses": { "writable": ["dest"], "readonly": [] } }
        }))
        .unwrap();
        assert_eq!(record.addresses().unwrap(), vec!["payer", "dest"]);
        assert_eq!(record.table_layout(), TableLayout::legacy(2));
    }
}
