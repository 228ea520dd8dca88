use crate::instruction::AccountLabel;
use crate::types::{MessageHeader, TableLayout};

/// Signer count assumed when the message header is unavailable.
pub const FALLBACK_REQUIRED_SIGNATURES: usize = 1;
/// Leading addresses assumed writable when the message header is unavailable.
pub const FALLBACK_WRITABLE_PREFIX: usize = 5;

pub const DEFAULT_ROLE: &str = "Account";

const ROLE_LABELS: &[(&str, &str)] = &[
    ("account", "Token Account"),
    ("source", "Source Account"),
    ("destination", "Destination Account"),
    ("authority", "Authority Account"),
    ("mint", "Mint Account"),
    ("owner", "Owner Account"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFlags {
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Derive signer/writable permissions from an address's table position.
///
/// With a header the result is exact. Without one (`jsonParsed` records)
/// a conservative layout is assumed: one signer, and every address past the
/// fifth is read-only. Lookup-table addresses are never signers and are
/// writable only when loaded as writable. Addresses outside the table get
/// no permissions.
pub fn resolve_flags(
    table_index: Option<usize>,
    layout: TableLayout,
    header: Option<&MessageHeader>,
) -> AccountFlags {
    let Some(index) = table_index.filter(|i| *i < layout.len()) else {
        return AccountFlags::default();
    };
    if index >= layout.static_count {
        return AccountFlags {
            is_signer: false,
            is_writable: index < layout.static_count + layout.loaded_writable,
        };
    }

    let static_count = layout.static_count;
    match header {
        Some(header) => positional_flags(
            index,
            static_count,
            usize::from(header.num_required_signatures),
            usize::from(header.num_readonly_signed_accounts),
            usize::from(header.num_readonly_unsigned_accounts),
        ),
        None => positional_flags(
            index,
            static_count,
            FALLBACK_REQUIRED_SIGNATURES,
            0,
            static_count.saturating_sub(FALLBACK_WRITABLE_PREFIX),
        ),
    }
}

fn positional_flags(
    index: usize,
    address_count: usize,
    required_signatures: usize,
    readonly_signed: usize,
    readonly_unsigned: usize,
) -> AccountFlags {
    let is_signer = index < required_signatures;
    let is_writable = if is_signer {
        index < required_signatures.saturating_sub(readonly_signed)
    } else {
        index < address_count.saturating_sub(readonly_unsigned)
    };
    AccountFlags {
        is_signer,
        is_writable,
    }
}

/// Human-readable role for an account reference.
pub fn role_name(label: AccountLabel) -> String {
    match label {
        AccountLabel::Field(field) => ROLE_LABELS
            .iter()
            .find(|(name, _)| *name == field)
            .map_or(DEFAULT_ROLE, |(_, role)| *role)
            .to_string(),
        AccountLabel::Positional(position) => format!("{DEFAULT_ROLE} {position}"),
    }
}
