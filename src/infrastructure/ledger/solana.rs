use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

/// Answers whether a payment proof refers to a confirmed transaction.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn is_confirmed(&self, signature: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResult {
    transaction: EncodedTransaction,
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct EncodedTransaction {
    message: TransactionMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMessage {
    #[serde(default)]
    account_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    err: Option<serde_json::Value>,
}

/// Solana JSON-RPC lookup at `confirmed` commitment.
#[derive(Clone)]
pub struct SolanaRpcLedger {
    client: Client,
    endpoint: Url,
    receiver: Option<String>,
}

impl SolanaRpcLedger {
    pub fn new(client: Client, endpoint: Url, receiver: Option<String>) -> Self {
        info!("✅ Payment ledger at {}", endpoint);
        Self {
            client,
            endpoint,
            receiver,
        }
    }
}

#[async_trait]
impl PaymentLedger for SolanaRpcLedger {
    async fn is_confirmed(&self, signature: &str) -> Result<bool> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [
                signature,
                {
                    "commitment": "confirmed",
                    "encoding": "json",
                    "maxSupportedTransactionVersion": 0
                }
            ]
        });

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .context("Payment ledger request failed")?
            .error_for_status()
            .context("Payment ledger returned an error status")?;

        let parsed: RpcResponse<TransactionResult> = resp
            .json()
            .await
            .context("Payment ledger returned malformed JSON")?;

        let confirmed = interpret(parsed, self.receiver.as_deref())?;
        debug!(signature, confirmed, "Payment lookup finished");
        Ok(confirmed)
    }
}

/// JSON-RPC "invalid params": the node rejected the signature itself.
const RPC_INVALID_PARAMS: i64 = -32602;

/// A signature the node cannot parse names no transaction, so it is unpaid.
/// Every other RPC error is a lookup failure.
fn interpret(parsed: RpcResponse<TransactionResult>, receiver: Option<&str>) -> Result<bool> {
    match parsed.error {
        Some(err) if err.code == RPC_INVALID_PARAMS => {
            warn!("Payment ledger rejected signature: {}", err.message);
            Ok(false)
        }
        Some(err) => Err(anyhow!("Payment ledger error {}: {}", err.code, err.message)),
        None => Ok(accepts(parsed.result.as_ref(), receiver)),
    }
}

fn accepts(result: Option<&TransactionResult>, receiver: Option<&str>) -> bool {
    let Some(tx) = result else {
        return false;
    };

    if tx.meta.as_ref().is_some_and(|m| m.err.is_some()) {
        warn!("Payment transaction exists but failed on chain");
        return false;
    }

    match receiver {
        Some(wallet) => tx.transaction.message.account_keys.iter().any(|k| k == wallet),
        None => true,
    }
}
