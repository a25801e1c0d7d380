//! Transaction payloads as `getBlock` returns them, and their canonical form.
//!
//! Current nodes answer with the `{transaction, meta}` shape that
//! [`EncodedTransactionWithStatusMeta`] describes. Older or trimmed payloads
//! may put the message at the top level, omit the header, or list keys under
//! `accounts`; those go through a lenient fallback. Everything is folded into
//! a [`TransactionRecord`] here so nothing downstream looks at raw JSON.

use serde::Deserialize;
use serde_json::Value;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedTransaction, EncodedTransactionWithStatusMeta, UiMessage, UiTransactionStatusMeta,
};

use crate::common::error::{Result, ScannerError};

#[derive(Debug, Default, Deserialize)]
struct LegacyTransactionWithMeta {
    #[serde(default)]
    transaction: Option<LegacyTransaction>,
    #[serde(default)]
    message: Option<LegacyMessage>,
    #[serde(default)]
    meta: Option<LegacyMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyTransaction {
    #[serde(default)]
    signatures: Vec<String>,
    #[serde(default)]
    message: Option<LegacyMessage>,
}

/// Key lists stay untyped so a non-list `accountKeys` can fall back to
/// `accounts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMessage {
    #[serde(default)]
    account_keys: Option<Value>,
    #[serde(default)]
    accounts: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyAccountKey {
    Plain(String),
    Parsed { pubkey: String },
}

impl LegacyAccountKey {
    fn into_key(self) -> String {
        match self {
            Self::Plain(key) | Self::Parsed { pubkey: key } => key,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMeta {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    fee: u64,
    #[serde(default)]
    pre_balances: Vec<u64>,
    #[serde(default)]
    post_balances: Vec<u64>,
    #[serde(default)]
    loaded_addresses: Option<LegacyLoadedAddresses>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyLoadedAddresses {
    #[serde(default)]
    writable: Vec<String>,
    #[serde(default)]
    readonly: Vec<String>,
}

/// One transaction with just the fields the scanner needs.
///
/// Balances stay in lamports; `account_keys[i]` owns `pre_balances[i]` and
/// `post_balances[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    /// First signature, or empty when the payload carried none.
    pub signature: String,
    pub account_keys: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub fee: u64,
    /// The transaction's status carried an error.
    pub failed: bool,
}

impl TransactionRecord {
    /// Normalizes one element of a `getBlock` `transactions` array.
    ///
    /// With `include_loaded_addresses`, addresses loaded from lookup tables
    /// are appended after the static keys, writable first.
    ///
    /// # Errors
    ///
    /// Returns `MalformedTransaction` when the transaction is not
    /// JSON-encoded, when the value fits neither shape, or when the message
    /// carries no list of account keys.
    pub fn from_value(value: &Value, include_loaded_addresses: bool) -> Result<Self> {
        if value.get("transaction").is_some() {
            if let Ok(encoded) = EncodedTransactionWithStatusMeta::deserialize(value) {
                return Self::from_encoded(encoded, include_loaded_addresses);
            }
        }
        Self::from_legacy(value, include_loaded_addresses)
    }

    /// Normalizes the typed RPC shape.
    ///
    /// # Errors
    ///
    /// Returns `MalformedTransaction` for binary or account-list encodings.
    pub fn from_encoded(
        encoded: EncodedTransactionWithStatusMeta,
        include_loaded_addresses: bool,
    ) -> Result<Self> {
        let EncodedTransaction::Json(transaction) = encoded.transaction else {
            return Err(ScannerError::MalformedTransaction(
                "transaction is not JSON-encoded".to_string(),
            ));
        };

        let mut account_keys = match transaction.message {
            UiMessage::Raw(message) => message.account_keys,
            UiMessage::Parsed(message) => message
                .account_keys
                .into_iter()
                .map(|account| account.pubkey)
                .collect(),
        };
        let signature = transaction.signatures.into_iter().next().unwrap_or_default();

        let Some(meta) = encoded.meta else {
            return Ok(Self {
                signature,
                account_keys,
                ..Self::default()
            });
        };
        let UiTransactionStatusMeta {
            err,
            status,
            fee,
            pre_balances,
            post_balances,
            loaded_addresses,
            ..
        } = meta;

        if include_loaded_addresses {
            if let OptionSerializer::Some(loaded) = loaded_addresses {
                account_keys.extend(loaded.writable);
                account_keys.extend(loaded.readonly);
            }
        }

        Ok(Self {
            signature,
            account_keys,
            pre_balances,
            post_balances,
            fee,
            failed: err.is_some() || status.is_err(),
        })
    }

    fn from_legacy(value: &Value, include_loaded_addresses: bool) -> Result<Self> {
        let raw = LegacyTransactionWithMeta::deserialize(value)
            .map_err(|e| ScannerError::MalformedTransaction(e.to_string()))?;

        let (signature, message) = match raw.transaction {
            Some(inner) => (inner.signatures.into_iter().next(), inner.message),
            None => (None, raw.message),
        };

        let message = message.ok_or_else(|| {
            ScannerError::MalformedTransaction("transaction has no message".to_string())
        })?;
        let mut account_keys = legacy_account_keys(message)?;

        let meta = raw.meta.unwrap_or_default();
        if include_loaded_addresses {
            if let Some(loaded) = meta.loaded_addresses {
                account_keys.extend(loaded.writable);
                account_keys.extend(loaded.readonly);
            }
        }

        Ok(Self {
            signature: signature.unwrap_or_default(),
            account_keys,
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
            fee: meta.fee,
            // `"err": null` deserializes to `None`.
            failed: meta.err.is_some(),
        })
    }
}

/// `accountKeys` when it is a list, otherwise `accounts` when that is.
fn legacy_account_keys(message: LegacyMessage) -> Result<Vec<String>> {
    let keys = [message.account_keys, message.accounts]
        .into_iter()
        .flatten()
        .find(Value::is_array)
        .ok_or_else(|| {
            ScannerError::MalformedTransaction(
                "message has no accountKeys or accounts list".to_string(),
            )
        })?;

    Vec::<LegacyAccountKey>::deserialize(keys)
        .map(|keys| keys.into_iter().map(LegacyAccountKey::into_key).collect())
        .map_err(|e| ScannerError::MalformedTransaction(format!("bad account key: {e}")))
}
