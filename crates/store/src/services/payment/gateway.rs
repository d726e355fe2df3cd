//! Payment gateway HTTP client (Zarinpal-shaped v4 API).
//!
//! Two endpoints: `request.json` opens a transaction and returns an authority
//! token, `verify.json` settles it after the shopper returns. Result code 100
//! means success, 101 means the transaction was verified before; anything
//! else is a failure. Gateway responses put payload under `data` with a
//! parallel `errors` field — and on errors `data` degrades to an empty array,
//! so bodies are decoded as JSON values and interpreted explicitly.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use blood_orange_core::Toman;

/// Gateway result code for a successful transaction.
pub const CODE_SUCCESS: i64 = 100;
/// Gateway result code for a transaction that was already verified.
pub const CODE_ALREADY_VERIFIED: i64 = 101;

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant identity sent with every request.
    pub merchant_id: String,
    /// Gateway origin, e.g. `https://sandbox.zarinpal.com`.
    pub base_url: Url,
    /// Bound on each gateway round-trip.
    pub timeout: Duration,
}

/// Errors from gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failure, including timeouts.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with something that is not the documented JSON.
    #[error("invalid response from payment gateway: {0}")]
    InvalidResponse(String),

    /// The gateway refused to open the transaction.
    #[error("payment request rejected by gateway (code {code})")]
    Rejected {
        /// Gateway result code.
        code: i64,
    },
}

/// An accepted payment request.
#[derive(Debug, Clone)]
pub struct PaymentAuthority {
    /// Gateway transaction authority token.
    pub authority: String,
}

/// Result of a verify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Verified now; the payment went through.
    Verified { ref_id: i64 },
    /// Verified by an earlier call; do not apply side effects again.
    AlreadyVerified { ref_id: i64 },
    /// The gateway did not confirm the payment.
    Failed { code: i64 },
}

/// Client for the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    merchant_id: String,
    base_url: Url,
}

impl GatewayClient {
    /// Create a gateway client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the underlying client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            merchant_id: config.merchant_id.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Open a transaction for `amount` and return the authority token.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Rejected`] when the gateway declines,
    /// [`GatewayError::InvalidResponse`] on a malformed body,
    /// [`GatewayError::Http`] on transport failure or timeout.
    #[instrument(skip(self, description, callback_url))]
    pub async fn request_payment(
        &self,
        amount: Toman,
        description: &str,
        callback_url: &str,
    ) -> Result<PaymentAuthority, GatewayError> {
        let body = serde_json::json!({
            "merchant_id": self.merchant_id,
            "amount": amount.amount(),
            "description": description,
            "callback_url": callback_url,
        });

        let response = self
            .client
            .post(self.endpoint("pg/v4/payment/request.json"))
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let value = decode_json_body(response).await?;
        debug!("payment request answered");
        parse_request_response(&value)
    }

    /// Verify a transaction after the shopper returns from the gateway.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidResponse`] on a malformed body,
    /// [`GatewayError::Http`] on transport failure or timeout. A gateway
    /// refusal is a [`VerifyOutcome::Failed`], not an error.
    #[instrument(skip(self, authority))]
    pub async fn verify(
        &self,
        amount: Toman,
        authority: &str,
    ) -> Result<VerifyOutcome, GatewayError> {
        let body = serde_json::json!({
            "merchant_id": self.merchant_id,
            "amount": amount.amount(),
            "authority": authority,
        });

        let response = self
            .client
            .post(self.endpoint("pg/v4/payment/verify.json"))
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let value = decode_json_body(response).await?;
        parse_verify_response(&value)
    }

    /// The redirect URL the shopper is sent to for an authority token.
    #[must_use]
    pub fn start_pay_url(&self, authority: &str) -> String {
        format!("{}/{}", self.endpoint("pg/StartPay"), authority)
    }
}

/// Decode a gateway response body as JSON, without trusting it to be JSON.
async fn decode_json_body(response: reqwest::Response) -> Result<Value, GatewayError> {
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|_| GatewayError::InvalidResponse("non-JSON body".to_owned()))
}

/// Interpret a `request.json` response body.
pub fn parse_request_response(body: &Value) -> Result<PaymentAuthority, GatewayError> {
    if let Some(data) = body.get("data")
        && let Some(code) = data.get("code").and_then(Value::as_i64)
    {
        if code == CODE_SUCCESS
            && let Some(authority) = data.get("authority").and_then(Value::as_str)
        {
            return Ok(PaymentAuthority {
                authority: authority.to_owned(),
            });
        }
        return Err(GatewayError::Rejected { code });
    }

    // Failure shape: `data` is an empty array and `errors` carries the code.
    if let Some(code) = body
        .get("errors")
        .and_then(|errors| errors.get("code"))
        .and_then(Value::as_i64)
    {
        return Err(GatewayError::Rejected { code });
    }

    Err(GatewayError::InvalidResponse(
        "missing data.code".to_owned(),
    ))
}

/// Interpret a `verify.json` response body.
pub fn parse_verify_response(body: &Value) -> Result<VerifyOutcome, GatewayError> {
    if let Some(data) = body.get("data")
        && let Some(code) = data.get("code").and_then(Value::as_i64)
    {
        let ref_id = data.get("ref_id").and_then(Value::as_i64);
        return match (code, ref_id) {
            (CODE_SUCCESS, Some(ref_id)) => Ok(VerifyOutcome::Verified { ref_id }),
            (CODE_ALREADY_VERIFIED, Some(ref_id)) => Ok(VerifyOutcome::AlreadyVerified { ref_id }),
            (CODE_SUCCESS | CODE_ALREADY_VERIFIED, None) => Err(GatewayError::InvalidResponse(
                "success without ref_id".to_owned(),
            )),
            (code, _) => Ok(VerifyOutcome::Failed { code }),
        };
    }

    if let Some(code) = body
        .get("errors")
        .and_then(|errors| errors.get("code"))
        .and_then(Value::as_i64)
    {
        return Ok(VerifyOutcome::Failed { code });
    }

    Err(GatewayError::InvalidResponse(
        "missing data.code".to_owned(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_success() {
        let body = json!({
            "data": {"code": 100, "message": "Success", "authority": "A0000012345", "fee": 100},
            "errors": []
        });
        let authority = parse_request_response(&body).unwrap();
        assert_eq!(authority.authority, "A0000012345");
    }

    #[test]
    fn test_request_rejected_in_data() {
        let body = json!({"data": {"code": -11, "message": "Request failed"}, "errors": []});
        assert!(matches!(
            parse_request_response(&body),
            Err(GatewayError::Rejected { code: -11 })
        ));
    }

    #[test]
    fn test_request_rejected_in_errors() {
        let body = json!({"data": [], "errors": {"code": -9, "message": "validation error"}});
        assert!(matches!(
            parse_request_response(&body),
            Err(GatewayError::Rejected { code: -9 })
        ));
    }

    #[test]
    fn test_request_malformed() {
        let body = json!({"unexpected": true});
        assert!(matches!(
            parse_request_response(&body),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_verify_success() {
        let body = json!({"data": {"code": 100, "ref_id": 201}, "errors": []});
        assert_eq!(
            parse_verify_response(&body).unwrap(),
            VerifyOutcome::Verified { ref_id: 201 }
        );
    }

    #[test]
    fn test_verify_already_verified() {
        let body = json!({"data": {"code": 101, "ref_id": 201}, "errors": []});
        assert_eq!(
            parse_verify_response(&body).unwrap(),
            VerifyOutcome::AlreadyVerified { ref_id: 201 }
        );
    }

    #[test]
    fn test_verify_failure_code() {
        let body = json!({"data": {"code": -53}, "errors": []});
        assert_eq!(
            parse_verify_response(&body).unwrap(),
            VerifyOutcome::Failed { code: -53 }
        );
    }

    #[test]
    fn test_verify_success_without_ref_id_is_invalid() {
        let body = json!({"data": {"code": 100}, "errors": []});
        assert!(matches!(
            parse_verify_response(&body),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_start_pay_url() {
        let config = GatewayConfig {
            merchant_id: "m".to_owned(),
            base_url: Url::parse("https://sandbox.zarinpal.com").unwrap(),
            timeout: Duration::from_secs(10),
        };
        let client = GatewayClient::new(&config).unwrap();
        assert_eq!(
            client.start_pay_url("A00042"),
            "https://sandbox.zarinpal.com/pg/StartPay/A00042"
        );
    }
}
