//! Stripe webhook signature verification.
//!
//! Stripe signs `"{t}.{raw body}"` with HMAC-SHA256 under the endpoint's
//! signing secret and sends the result in the `Stripe-Signature` header. The
//! MAC is computed over the exact bytes received; callers must not re-encode
//! the body before handing it over.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::stripe_event::StripeEvent;

/// Default maximum age of a signed delivery (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for deliveries stamped in the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Why an inbound delivery could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfRange,

    #[error("Webhook timestamp is in the future")]
    InvalidTimestamp,

    #[error("Failed to parse webhook payload: {0}")]
    ParseError(String),

    #[error("Webhook signing secret is unusable")]
    InvalidSecret,
}

/// Parsed components of a `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the signature was generated at.
    pub timestamp: i64,
    /// Every `v1` signature present; Stripe sends several while a secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<timestamp>,v1=<hex>[,v1=<hex>...]`. Unknown keys such as the
    /// legacy `v0` scheme are skipped.
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| VerificationError::MalformedHeader("invalid header format".into()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        VerificationError::MalformedHeader("invalid timestamp".into())
                    })?);
                }
                "v1" => {
                    let signature = hex::decode(value).map_err(|_| {
                        VerificationError::MalformedHeader("invalid v1 signature hex".into())
                    })?;
                    v1_signatures.push(signature);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| VerificationError::MalformedHeader("missing timestamp".into()))?;
        if v1_signatures.is_empty() {
            return Err(VerificationError::MalformedHeader(
                "missing v1 signature".into(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the default 5 minute replay window.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Authenticates `payload` against `signature_header` and parses the
    /// event envelope.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - header missing pieces or not hex
    /// - `TimestampOutOfRange` - older than the tolerance
    /// - `InvalidTimestamp` - further in the future than the allowed skew
    /// - `InvalidSignature` - no `v1` signature matches
    /// - `ParseError` - authentic body that is not an event envelope
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, VerificationError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    pub(crate) fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, VerificationError> {
        let header = SignatureHeader::parse(signature_header)?;
        self.validate_timestamp(header.timestamp, now)?;

        let expected = compute_signature(&self.secret, header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(VerificationError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| VerificationError::ParseError(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), VerificationError> {
        // Only a timestamp far in the past can overflow here.
        let Some(age) = now.checked_sub(timestamp) else {
            return Err(VerificationError::TimestampOutOfRange);
        };
        if age > self.tolerance_secs {
            return Err(VerificationError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(VerificationError::InvalidTimestamp);
        }
        Ok(())
    }
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

/// Builds a valid `Stripe-Signature` header for `payload`, as Stripe would.
///
/// Used by tests and local tooling that replays fixtures.
pub fn generate_signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, VerificationError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<Vec<u8>, VerificationError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_704_067_200;
    const PAYLOAD: &str = r#"{"id":"evt_test123","type":"product.created","created":1704067200,"data":{"object":{"id":"prod_1"}},"livemode":false}"#;

    fn signed(payload: &[u8], timestamp: i64) -> String {
        generate_signature_header(TEST_SECRET, timestamp, payload).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_single_v1() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "a".repeat(64))).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_header_collects_every_v1_and_skips_v0() {
        let header_str = format!(
            "t=1234567890,v1={},v1={},v0={}",
            "a".repeat(64),
            "b".repeat(64),
            "c".repeat(64)
        );

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_tolerates_spaces_after_commas() {
        let header = SignatureHeader::parse(&format!("t=1, v1={}", "a".repeat(64))).unwrap();
        assert_eq!(header.timestamp, 1);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(VerificationError::MalformedHeader(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(VerificationError::MalformedHeader(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(VerificationError::MalformedHeader(_))));
    }

    #[test]
    fn parse_empty_header_fails() {
        assert!(matches!(
            SignatureHeader::parse(""),
            Err(VerificationError::MalformedHeader(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = signed(PAYLOAD.as_bytes(), NOW);

        let event = verifier.verify_at(PAYLOAD.as_bytes(), &header, NOW).unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.event_type, "product.created");
    }

    #[test]
    fn verify_with_real_clock() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = signed(PAYLOAD.as_bytes(), chrono::Utc::now().timestamp());

        assert!(verifier.verify_and_parse(PAYLOAD.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_accepts_any_matching_v1() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let good = signed(PAYLOAD.as_bytes(), NOW);
        let good_sig = good.split_once(",v1=").unwrap().1;
        let header = format!("t={},v1={},v1={}", NOW, "0".repeat(64), good_sig);

        assert!(verifier.verify_at(PAYLOAD.as_bytes(), &header, NOW).is_ok());
    }

    #[test]
    fn verify_invalid_signature_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = format!("t={},v1={}", NOW, "a".repeat(64));

        let result = verifier.verify_at(PAYLOAD.as_bytes(), &header, NOW);

        assert!(matches!(result, Err(VerificationError::InvalidSignature)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = StripeWebhookVerifier::new("whsec_other");
        let header = signed(PAYLOAD.as_bytes(), NOW);

        let result = verifier.verify_at(PAYLOAD.as_bytes(), &header, NOW);

        assert!(matches!(result, Err(VerificationError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = signed(PAYLOAD.as_bytes(), NOW);
        let tampered = PAYLOAD.replace("prod_1", "prod_2");

        let result = verifier.verify_at(tampered.as_bytes(), &header, NOW);

        assert!(matches!(result, Err(VerificationError::InvalidSignature)));
    }

    #[test]
    fn verify_reserialized_payload_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = signed(PAYLOAD.as_bytes(), NOW);
        let value: serde_json::Value = serde_json::from_str(PAYLOAD).unwrap();
        let pretty = serde_json::to_vec_pretty(&value).unwrap();

        let result = verifier.verify_at(&pretty, &header, NOW);

        assert!(matches!(result, Err(VerificationError::InvalidSignature)));
    }

    #[test]
    fn verify_signs_non_utf8_bytes_exactly() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let payload = [0xffu8, 0xfe, b'{'];
        let header = signed(&payload, NOW);

        let result = verifier.verify_at(&payload, &header, NOW);

        // Authentic bytes that are not an event envelope fail at parse, not MAC.
        assert!(matches!(result, Err(VerificationError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_at_boundary_succeeds() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        assert!(verifier.validate_timestamp(NOW - 300, NOW).is_ok());
    }

    #[test]
    fn timestamp_just_past_boundary_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        assert!(matches!(
            verifier.validate_timestamp(NOW - 301, NOW),
            Err(VerificationError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn custom_tolerance_is_honored() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET).with_tolerance(10);
        assert!(verifier.validate_timestamp(NOW - 10, NOW).is_ok());
        assert!(verifier.validate_timestamp(NOW - 11, NOW).is_err());
    }

    #[test]
    fn timestamp_from_future_within_skew_succeeds() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        assert!(verifier.validate_timestamp(NOW + 30, NOW).is_ok());
    }

    #[test]
    fn timestamp_from_future_beyond_skew_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        assert!(matches!(
            verifier.validate_timestamp(NOW + 120, NOW),
            Err(VerificationError::InvalidTimestamp)
        ));
    }

    #[test]
    fn stale_delivery_rejected_before_signature_check() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let header = signed(PAYLOAD.as_bytes(), NOW - 3600);

        let result = verifier.verify_at(PAYLOAD.as_bytes(), &header, NOW);

        assert!(matches!(result, Err(VerificationError::TimestampOutOfRange)));
    }

    #[test]
    fn extreme_header_timestamps_are_rejected() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let sig = "a".repeat(64);

        let oldest = verifier.verify_and_parse(
            PAYLOAD.as_bytes(),
            &format!("t={},v1={}", i64::MIN, sig),
        );
        let newest = verifier.verify_and_parse(
            PAYLOAD.as_bytes(),
            &format!("t={},v1={}", i64::MAX, sig),
        );

        assert!(matches!(oldest, Err(VerificationError::TimestampOutOfRange)));
        assert!(matches!(newest, Err(VerificationError::InvalidTimestamp)));
        assert!(matches!(
            verifier.validate_timestamp(i64::MIN, i64::MAX),
            Err(VerificationError::TimestampOutOfRange)
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Parsing and Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_invalid_json_fails() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        let payload = b"not valid json";
        let header = signed(payload, NOW);

        let result = verifier.verify_at(payload, &header, NOW);

        assert!(matches!(result, Err(VerificationError::ParseError(_))));
    }

    #[test]
    fn constant_time_compare_behaviour() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
        assert!(constant_time_compare(&[], &[]));
    }

    #[test]
    fn debug_output_hides_secret() {
        let verifier = StripeWebhookVerifier::new(TEST_SECRET);
        assert!(!format!("{:?}", verifier).contains(TEST_SECRET));
    }

    proptest! {
        #[test]
        fn generated_headers_always_verify(id in "[a-z0-9_]{1,24}", offset in -60i64..=300) {
            let payload = format!(
                r#"{{"id":"{}","type":"price.updated","created":1,"data":{{"object":{{}}}},"livemode":false}}"#,
                id
            );
            let verifier = StripeWebhookVerifier::new(TEST_SECRET);
            let header = signed(payload.as_bytes(), NOW - offset);

            let event = verifier.verify_at(payload.as_bytes(), &header, NOW).unwrap();
            prop_assert_eq!(event.id, id);
        }
    }
}
