//! Batch transaction enrichment: prompt construction and reply parsing.
//!
//! The model is asked to answer with a JSON array keyed by transaction id.
//! Replies are treated as a restricted JSON document: an optional markdown
//! fence is tolerated, anything else that is not the expected array is a
//! [`Error::MalformedProviderOutput`].

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::HashSet, fmt::Write};

/// Hard cap on transactions per batch request.
pub const MAX_BATCH: usize = 25;

/// A transaction as described to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichTransaction {
    /// Transaction id, echoed back in suggestions.
    pub id: String,

    /// Raw transaction name, as it appears on the statement.
    pub name: String,

    /// Signed amount.
    #[serde(default)]
    pub amount: f64,

    /// Merchant already attached to the transaction, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

/// A category suggestion for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCategorization {
    /// The transaction the suggestion is for.
    pub transaction_id: String,

    /// Suggested category, `None` when nothing fits.
    pub category_name: Option<String>,
}

/// A merchant suggestion for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDetectedMerchant {
    /// The transaction the suggestion is for.
    pub transaction_id: String,

    /// Detected business name, `None` when unknown.
    pub business_name: Option<String>,

    /// Detected business website, `None` when unknown.
    pub business_url: Option<String>,
}

/// Reject batches over [`MAX_BATCH`].
pub fn check_batch(operation: &'static str, transactions: &[EnrichTransaction]) -> Result<()> {
    if transactions.len() > MAX_BATCH {
        return Err(Error::TooManyItems {
            operation,
            count: transactions.len(),
            max: MAX_BATCH,
        });
    }
    Ok(())
}

/// Build the categorization prompt.
pub fn categorization_prompt(transactions: &[EnrichTransaction], categories: &[String]) -> String {
    let mut prompt =
        String::from("Categorize the following transactions into one of these categories:\n");
    for category in categories {
        let _ = writeln!(prompt, "- {category}");
    }
    prompt.push_str("\nTransactions:\n");
    for tx in transactions {
        let _ = writeln!(
            prompt,
            "ID: {}, Name: {}, Amount: {:.2}, Merchant: {}",
            tx.id,
            tx.name,
            tx.amount,
            tx.merchant.as_deref().unwrap_or("unknown"),
        );
    }
    prompt.push_str(
        "\nReturn a JSON array with objects containing \"transaction_id\" and \
         \"category_name\" fields. Use null for \"category_name\" when no category fits. \
         Respond with the JSON array only.\n",
    );
    prompt
}

/// Build the merchant detection prompt.
pub fn merchant_detection_prompt(
    transactions: &[EnrichTransaction],
    merchants: &[String],
) -> String {
    let mut prompt =
        String::from("Detect the merchant business name and website for these transactions:\n");
    for tx in transactions {
        let _ = writeln!(prompt, "ID: {}, Name: {}", tx.id, tx.name);
    }
    prompt.push_str("\nKnown merchants:\n");
    for merchant in merchants {
        let _ = writeln!(prompt, "- {merchant}");
    }
    prompt.push_str(
        "\nReturn a JSON array with objects containing \"transaction_id\", \
         \"business_name\", and \"business_url\" fields. Use null for fields you \
         cannot determine. Respond with the JSON array only.\n",
    );
    prompt
}

/// Parse a categorization reply.
pub fn parse_categorizations(
    provider: &'static str,
    text: &str,
    transactions: &[EnrichTransaction],
) -> Result<Vec<AutoCategorization>> {
    let raw: Vec<RawCategorization> = parse_array(provider, "categorization", text)?;
    let known = known_ids(transactions);
    Ok(raw
        .into_iter()
        .filter_map(|item| {
            let transaction_id = keep_known(&known, item.transaction_id)?;
            Some(AutoCategorization {
                transaction_id,
                category_name: item.category_name,
            })
        })
        .collect())
}

/// Parse a merchant detection reply.
pub fn parse_merchants(
    provider: &'static str,
    text: &str,
    transactions: &[EnrichTransaction],
) -> Result<Vec<AutoDetectedMerchant>> {
    let raw: Vec<RawMerchant> = parse_array(provider, "merchant detection", text)?;
    let known = known_ids(transactions);
    Ok(raw
        .into_iter()
        .filter_map(|item| {
            let transaction_id = keep_known(&known, item.transaction_id)?;
            Some(AutoDetectedMerchant {
                transaction_id,
                business_name: item.business_name,
                business_url: item.business_url,
            })
        })
        .collect())
}

/// Strip an optional markdown code fence around a JSON document.
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_array<T: for<'de> Deserialize<'de>>(
    provider: &'static str,
    what: &str,
    text: &str,
) -> Result<Vec<T>> {
    serde_json::from_str(strip_fence(text))
        .map_err(|e| Error::malformed(provider, format!("failed to parse {what} response: {e}")))
}

fn known_ids(transactions: &[EnrichTransaction]) -> HashSet<&str> {
    transactions.iter().map(|tx| tx.id.as_str()).collect()
}

fn keep_known(known: &HashSet<&str>, id: String) -> Option<String> {
    if known.contains(id.as_str()) {
        Some(id)
    } else {
        tracing::warn!("dropping suggestion for unknown transaction {id}");
        None
    }
}

#[derive(Deserialize)]
struct RawCategorization {
    #[serde(deserialize_with = "transaction_id")]
    transaction_id: String,
    #[serde(deserialize_with = "Option::deserialize")]
    category_name: Option<String>,
}

#[derive(Deserialize)]
struct RawMerchant {
    #[serde(deserialize_with = "transaction_id")]
    transaction_id: String,
    #[serde(deserialize_with = "Option::deserialize")]
    business_name: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    business_url: Option<String>,
}

/// Models echo ids back as strings or bare numbers; accept both.
fn transaction_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "transaction_id must be a string or number, got {other}"
        ))),
    }
}
