// common/src/models/login.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, SecondsFormat, Utc};

/// Sign-in-with-Ethereum style login payload, issued by the server and
/// signed by the wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPayloadData {
    pub domain: String,
    pub address: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub invalid_before: DateTime<Utc>,
}

fn default_version() -> String {
    "1".to_string()
}

/// Payload together with the wallet's signature over its message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub payload: LoginPayloadData,
    pub signature: String,
}

impl LoginPayloadData {
    /// Text presented to the wallet for signing
    pub fn message(&self) -> String {
        let mut message = format!(
            "{} wants you to sign in with your Ethereum account:\n{}\n\n",
            self.domain, self.address
        );

        if !self.statement.is_empty() {
            message.push_str(&self.statement);
            message.push_str("\n\n");
        }

        if let Some(uri) = &self.uri {
            message.push_str(&format!("URI: {}\n", uri));
        }
        message.push_str(&format!("Version: {}\n", self.version));
        if let Some(chain_id) = self.chain_id {
            message.push_str(&format!("Chain ID: {}\n", chain_id));
        }
        message.push_str(&format!("Nonce: {}\n", self.nonce));
        message.push_str(&format!("Issued At: {}\n", rfc3339(&self.issued_at)));
        message.push_str(&format!("Expiration Time: {}\n", rfc3339(&self.expiration_time)));
        message.push_str(&format!("Not Before: {}", rfc3339(&self.invalid_before)));

        message
    }
}

fn rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_layout() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let payload = LoginPayloadData {
            domain: "example.com".to_string(),
            address: "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23".to_string(),
            statement: "Sign in".to_string(),
            uri: None,
            version: "1".to_string(),
            chain_id: Some(80001),
            nonce: "abc".to_string(),
            issued_at: issued,
            expiration_time: issued + chrono::Duration::minutes(10),
            invalid_before: issued - chrono::Duration::minutes(1),
        };

        let expected = "example.com wants you to sign in with your Ethereum account:\n\
            0x2c7536E3605D9C16a7a3D7b1898e529396a65c23\n\n\
            Sign in\n\n\
            Version: 1\n\
            Chain ID: 80001\n\
            Nonce: abc\n\
            Issued At: 2024-01-02T03:04:05.000Z\n\
            Expiration Time: 2024-01-02T03:14:05.000Z\n\
            Not Before: 2024-01-02T03:03:05.000Z";
        assert_eq!(payload.message(), expected);
    }

    #[test]
    fn test_payload_deserializes_without_optional_fields() {
        let json = serde_json::json!({
            "payload": {
                "domain": "example.com",
                "address": "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23",
                "nonce": "n",
                "issued_at": "2024-01-02T03:04:05Z",
                "expiration_time": "2024-01-02T03:14:05Z",
                "invalid_before": "2024-01-02T03:03:05Z"
            },
            "signature": "0x00"
        });
        let login: LoginPayload = serde_json::from_value(json).unwrap();
        assert_eq!(login.payload.version, "1");
        assert!(login.payload.chain_id.is_none());
    }
}
