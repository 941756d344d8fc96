use haus_core::{HausError, HausResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tolerance for float accumulation in the running spend total.
const SPEND_EPSILON: f64 = 1e-9;

/// The amount and destination a mutating command declares before it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendIntent {
    /// Amount in whole units of `currency`.
    pub amount: f64,
    /// Currency symbol.
    pub currency: String,
    /// Recipient address, when the command sends to one.
    pub destination: Option<String>,
}

impl SpendIntent {
    /// Spend with no destination.
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            destination: None,
        }
    }

    /// Sets the recipient.
    pub fn to(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Per-agent safety snapshot for one turn.
///
/// `spending_used` is the only mutable part and is advanced by the dispatcher
/// after a mutating command succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyPolicy {
    /// Ceiling on the running total.
    pub spending_limit: f64,
    /// Running total committed so far.
    pub spending_used: f64,
    /// Ceiling on a single command.
    pub max_transaction_amount: f64,
    /// Hold mutating commands until the owner confirms them.
    pub require_confirmation: bool,
    #[serde(deserialize_with = "deserialize_blocklist")]
    blocked_addresses: HashSet<String>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            spending_limit: 100.0,
            spending_used: 0.0,
            max_transaction_amount: 50.0,
            require_confirmation: false,
            blocked_addresses: HashSet::new(),
        }
    }
}

impl SafetyPolicy {
    /// Policy with the given limits and nothing spent.
    pub fn new(spending_limit: f64, max_transaction_amount: f64) -> Self {
        Self {
            spending_limit,
            max_transaction_amount,
            ..Self::default()
        }
    }

    /// Holds every mutating command for owner confirmation.
    pub fn with_confirmation(mut self, required: bool) -> Self {
        self.require_confirmation = required;
        self
    }

    /// Adds an address to the blocklist. Matching is case-insensitive.
    pub fn block(&mut self, address: &str) {
        self.blocked_addresses.insert(normalize(address));
    }

    /// Adds every address to the blocklist.
    pub fn with_blocked<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for address in addresses {
            self.block(address.as_ref());
        }
        self
    }

    /// Whether `address` is on the blocklist, ignoring case.
    pub fn is_blocked(&self, address: &str) -> bool {
        self.blocked_addresses.contains(&normalize(address))
    }

    /// Blocked addresses, lower-cased.
    pub fn blocked_addresses(&self) -> impl Iterator<Item = &String> {
        self.blocked_addresses.iter()
    }

    /// Budget left in this turn's running total.
    pub fn remaining(&self) -> f64 {
        (self.spending_limit - self.spending_used).max(0.0)
    }

    /// Checks an intent against the blocklist, the per-transaction cap and the
    /// running total. Never mutates the policy.
    pub fn check(&self, intent: &SpendIntent) -> HausResult<()> {
        if let Some(dest) = intent.destination.as_deref() {
            if self.is_blocked(dest) {
                return Err(HausError::Safety(format!(
                    "destination {dest} is on the blocked address list"
                )));
            }
        }

        if !intent.amount.is_finite() || intent.amount < 0.0 {
            return Err(HausError::Validation(format!(
                "amount {} is not a valid spend",
                intent.amount
            )));
        }

        if intent.amount > self.max_transaction_amount + SPEND_EPSILON {
            return Err(HausError::Safety(format!(
                "amount {} {} exceeds the per-transaction maximum of {}",
                intent.amount, intent.currency, self.max_transaction_amount
            )));
        }

        if self.spending_used + intent.amount > self.spending_limit + SPEND_EPSILON {
            return Err(HausError::Safety(format!(
                "amount {} {} exceeds the remaining spending budget of {} (limit {}, used {})",
                intent.amount,
                intent.currency,
                self.remaining(),
                self.spending_limit,
                self.spending_used
            )));
        }

        Ok(())
    }

    /// Adds a completed spend to the running total.
    pub fn commit(&mut self, amount: f64) {
        self.spending_used += amount;
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

fn deserialize_blocklist<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().map(|a| normalize(a)).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const BAD: &str = "0x000000000000000000000000000000000000dEaD";

    #[test]
    fn test_within_limits() {
        let policy = SafetyPolicy::new(10.0, 5.0);
        assert!(policy.check(&SpendIntent::new(5.0, "CELO")).is_ok());
    }

    #[test]
    fn test_max_transaction_amount() {
        let policy = SafetyPolicy::new(100.0, 5.0);
        let err = policy.check(&SpendIntent::new(5.01, "CELO")).unwrap_err();
        assert!(matches!(err, HausError::Safety(_)));
    }

    #[test]
    fn test_running_total_not_static_limit() {
        let mut policy = SafetyPolicy::new(10.0, 8.0);
        let intent = SpendIntent::new(6.0, "CELO");
        assert!(policy.check(&intent).is_ok());
        policy.commit(6.0);
        assert!(matches!(policy.check(&intent), Err(HausError::Safety(_))));
        assert!((policy.remaining() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let policy = SafetyPolicy::new(10.0, 5.0).with_blocked([BAD]);
        let intent = SpendIntent::new(1.0, "CELO").to(BAD.to_lowercase());
        assert!(matches!(policy.check(&intent), Err(HausError::Safety(_))));
    }

    #[test]
    fn test_float_accumulation_tolerated() {
        let mut policy = SafetyPolicy::new(0.3, 1.0);
        policy.commit(0.1);
        policy.commit(0.1);
        assert!(policy.check(&SpendIntent::new(0.1, "CELO")).is_ok());
    }

    #[test]
    fn test_deserialize_normalizes_blocklist() {
        let policy: SafetyPolicy = serde_json::from_value(serde_json::json!({
            "spending_limit": 20.0,
            "blocked_addresses": [BAD],
        }))
        .unwrap();
        assert!(policy.is_blocked(&BAD.to_uppercase().replace("0X", "0x")));
        assert_eq!(policy.max_transaction_amount, 50.0);
        assert!(!policy.require_confirmation);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let policy = SafetyPolicy::default();
        assert!(matches!(
            policy.check(&SpendIntent::new(-1.0, "CELO")),
            Err(HausError::Validation(_))
        ));
    }
}
