use std::collections::HashMap;

#[cfg(feature = "native")]
use crate::error::Error;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
pub const COMPUTE_BUDGET_PROGRAM_ID: &str = "ComputeBudget111111111111111111111111111111";
pub const VOTE_PROGRAM_ID: &str = "Vote111111111111111111111111111111111111111";
pub const STAKE_PROGRAM_ID: &str = "Stake11111111111111111111111111111111111111";
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";
pub const MEMO_V1_PROGRAM_ID: &str = "Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo";
pub const ADDRESS_LOOKUP_TABLE_PROGRAM_ID: &str = "AddressLookupTab1e1111111111111111111111111";
pub const BPF_LOADER_UPGRADEABLE_PROGRAM_ID: &str = "BPFLoaderUpgradeab1e11111111111111111111111";
pub const BPF_LOADER_PROGRAM_ID: &str = "BPFLoader2111111111111111111111111111111111";
pub const JUPITER_V6_PROGRAM_ID: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
pub const JUPITER_V4_PROGRAM_ID: &str = "JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB";
pub const RAYDIUM_AMM_V4_PROGRAM_ID: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
pub const ORCA_WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";
pub const SERUM_DEX_V3_PROGRAM_ID: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
pub const OPENBOOK_PROGRAM_ID: &str = "srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX";

pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

const WELL_KNOWN_PROGRAMS: &[(&str, &str)] = &[
    (SYSTEM_PROGRAM_ID, "System Program"),
    (TOKEN_PROGRAM_ID, "Token Program"),
    (TOKEN_2022_PROGRAM_ID, "Token-2022 Program"),
    (ASSOCIATED_TOKEN_PROGRAM_ID, "Associated Token Program"),
    (COMPUTE_BUDGET_PROGRAM_ID, "Compute Budget Program"),
    (VOTE_PROGRAM_ID, "Vote Program"),
    (STAKE_PROGRAM_ID, "Stake Program"),
    (MEMO_PROGRAM_ID, "Memo Program"),
    (MEMO_V1_PROGRAM_ID, "Memo Program (v1)"),
    (ADDRESS_LOOKUP_TABLE_PROGRAM_ID, "Address Lookup Table Program"),
    (BPF_LOADER_UPGRADEABLE_PROGRAM_ID, "BPF Upgradeable Loader"),
    (BPF_LOADER_PROGRAM_ID, "BPF Loader"),
    (JUPITER_V6_PROGRAM_ID, "Jupiter Aggregator v6"),
    (JUPITER_V4_PROGRAM_ID, "Jupiter Aggregator v4"),
    (RAYDIUM_AMM_V4_PROGRAM_ID, "Raydium AMM v4"),
    (ORCA_WHIRLPOOL_PROGRAM_ID, "Orca Whirlpool"),
    (SERUM_DEX_V3_PROGRAM_ID, "Serum DEX v3"),
    (OPENBOOK_PROGRAM_ID, "OpenBook DEX"),
];

/// Read-only lookup from program address to display name.
///
/// Built once and shared; unknown addresses resolve to [`UNKNOWN_PROGRAM`].
#[derive(Debug, Clone, Default)]
pub struct ProgramRegistry {
    names: HashMap<String, String>,
}

impl ProgramRegistry {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: entries
                .into_iter()
                .map(|(address, name)| (address.into(), name.into()))
                .collect(),
        }
    }

    /// Registry preloaded with system, token, compute-budget, voting,
    /// staking and DEX programs.
    pub fn well_known() -> Self {
        Self::new(WELL_KNOWN_PROGRAMS.iter().copied())
    }

    /// Returns a registry with `entries` added, overriding existing names.
    pub fn with_entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.names.extend(
            entries
                .into_iter()
                .map(|(address, name)| (address.into(), name.into())),
        );
        self
    }

    /// Like [`ProgramRegistry::new`], but rejects keys that are not valid
    /// base58-encoded 32-byte addresses.
    #[cfg(feature = "native")]
    pub fn validated<I, K, V>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        use std::str::FromStr;

        let mut names = HashMap::new();
        for (address, name) in entries {
            let address = address.into();
            if solana_pubkey::Pubkey::from_str(&address).is_err() {
                return Err(Error::InvalidProgramId { address });
            }
            names.insert(address, name.into());
        }
        Ok(Self { names })
    }

    pub fn name(&self, program_id: &str) -> &str {
        self.names
            .get(program_id)
            .map_or(UNKNOWN_PROGRAM, String::as_str)
    }

    pub fn contains(&self, program_id: &str) -> bool {
        self.names.contains_key(program_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
