//! Ethereum transfer verification over JSON-RPC
//!
//! Request shape: `<verb> verify <from> <to> <proof> <amount> <txid> <unused>`.
//! A transfer is valid when it succeeded on chain, has enough confirmations,
//! was sent from `from` to `to`, moved exactly `amount` wei and carries
//! `proof` as its input data.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Outcome, Plugin, PluginConfig};
use crate::{Error, Result};

/// Confirmations required unless `confirmationsCount` overrides it
pub const DEFAULT_CONFIRMATIONS: u64 = 12;

/// Tokens after the verb for a `verify` request, including `verify`
const VERIFY_ARITY: usize = 7;

/// Destination marking a transfer through the Creditcoin exchange contract
const CREDITCOIN_DESTINATION: &str = "creditcoin";

/// Ethereum transfer verifier
#[derive(Debug, Clone)]
pub struct EthereumPlugin {
    verb: String,
    client: reqwest::Client,
}

impl EthereumPlugin {
    /// Bind the capability to a verb
    #[must_use]
    pub fn new(verb: &str) -> Self {
        Self {
            verb: verb.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn verify(&self, config: &PluginConfig, args: &[String]) -> anyhow::Result<Outcome> {
        if args.len() != VERIFY_ARITY {
            return Ok(Outcome::failure(format!("Invalid arguments: expected {VERIFY_ARITY}")));
        }
        let source = &args[1];
        let destination = &args[2];
        let proof = &args[3];
        let amount = &args[4];
        let tx_id = &args[5];

        let Some(rpc_url) = config.get_non_blank("rpc") else {
            return Ok(Outcome::failure(format!("{}.rpc is not set", self.verb)));
        };
        let confirmations_expected = config
            .get_parsed::<u64>("confirmationsCount")
            .unwrap_or(DEFAULT_CONFIRMATIONS);

        let rpc = RpcClient::new(&self.client, rpc_url);

        let Some(tx) = rpc
            .call::<Transaction>("eth_getTransactionByHash", json!([tx_id]))
            .await?
        else {
            return Ok(Outcome::failure("Failed to retrieve transaction info"));
        };

        let receipt = rpc
            .call::<Receipt>("eth_getTransactionReceipt", json!([tx_id]))
            .await?
            .ok_or_else(|| anyhow::anyhow!("transaction receipt for {tx_id} is not available"))?;
        if receipt.status.as_deref().map(parse_quantity).transpose()? == Some(0) {
            return Ok(Outcome::failure("Invalid transaction: transaction status is 'failed'"));
        }

        let confirmations = match tx.block_number.as_deref() {
            Some(tx_block) => {
                let head = rpc
                    .call::<String>("eth_blockNumber", json!([]))
                    .await?
                    .ok_or_else(|| Error::Rpc("eth_blockNumber returned null".to_string()))?;
                parse_quantity(&head)?.saturating_sub(parse_quantity(tx_block)?)
            }
            None => 0,
        };
        if confirmations < u128::from(confirmations_expected) {
            return Ok(Outcome::failure("Invalid transaction: not enough confirmations"));
        }

        Ok(check_transfer(&tx, source, destination, proof, amount)?)
    }
}

#[async_trait]
impl Plugin for EthereumPlugin {
    fn verb(&self) -> &str {
        &self.verb
    }

    async fn run(&self, config: &PluginConfig, args: &[String]) -> anyhow::Result<Outcome> {
        match args.first().map(String::as_str) {
            Some("verify") => self.verify(config, args).await,
            Some(other) => Ok(Outcome::failure(format!("Unknown command: {other}"))),
            None => Ok(Outcome::failure("Unknown command: ")),
        }
    }
}

/// Compare a fetched transaction against the claimed transfer
fn check_transfer(
    tx: &Transaction,
    source: &str,
    destination: &str,
    proof: &str,
    amount: &str,
) -> Result<Outcome> {
    if !tx.from.eq_ignore_ascii_case(source) {
        return Ok(Outcome::failure("Invalid transaction: wrong sourceAddressString"));
    }

    if destination == CREDITCOIN_DESTINATION {
        return Ok(Outcome::failure("creditcoin contract transfers are not supported"));
    }

    if parse_quantity(&tx.value)?.to_string() != amount {
        return Ok(Outcome::failure("Invalid transaction: wrong amount"));
    }

    let Some(input) = tx.input.as_deref() else {
        return Ok(Outcome::failure("Invalid transaction: expecting data"));
    };

    let proof = if proof.starts_with("0x") {
        proof.to_string()
    } else {
        format!("0x{proof}")
    };
    if !input.eq_ignore_ascii_case(&proof) {
        return Ok(Outcome::failure("Invalid transaction: wrong proof"));
    }

    if !tx
        .to
        .as_deref()
        .is_some_and(|to| to.eq_ignore_ascii_case(destination))
    {
        return Ok(Outcome::failure("Invalid transaction: wrong destinationAddressString"));
    }

    Ok(Outcome::success())
}

/// Parse a JSON-RPC hex quantity (`0x1b4`)
fn parse_quantity(raw: &str) -> Result<u128> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| Error::Rpc(format!("invalid quantity: {raw}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| Error::Rpc(format!("invalid quantity {raw}: {e}")))
}

/// Transaction fields the verifier inspects
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transaction {
    from: String,
    #[serde(default)]
    to: Option<String>,
    value: String,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Receipt {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC client over a shared HTTP client
struct RpcClient<'a> {
    client: &'a reqwest::Client,
    url: &'a str,
}

impl<'a> RpcClient<'a> {
    const fn new(client: &'a reqwest::Client, url: &'a str) -> Self {
        Self { client, url }
    }

    /// Call a method; `Ok(None)` when the node answers `null`
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response: RpcResponse<T> = self
            .client
            .post(self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(Error::Rpc(format!("{method} failed ({}): {}", err.code, err.message)));
        }

        Ok(response.result)
    }
}
