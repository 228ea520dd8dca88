/// Thresholds used when scoring a transaction.
///
/// Deserializable so callers can load overrides from JSON; missing fields
/// keep their defaults.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticsConfig {
    /// Consumed units above which a compute warning is raised.
    pub compute_ceiling: u64,
    /// Minimum rent-exempt balance, in lamports, of a zero-data account.
    pub rent_exempt_minimum: u64,
    /// Floor for the requested-units estimate.
    pub min_requested_units: u64,
    /// Multiplier applied to consumed units to estimate the requested limit.
    pub requested_headroom: f64,
    /// Nominal slot duration used for the confirmation estimate.
    pub slot_duration_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            compute_ceiling: 800_000,
            rent_exempt_minimum: 890_880,
            min_requested_units: 200_000,
            requested_headroom: 1.2,
            slot_duration_ms: 400,
        }
    }
}

impl DiagnosticsConfig {
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.requested_headroom.is_finite() || self.requested_headroom <= 0.0 {
            return Err(crate::Error::InvalidConfig {
                reason: format!(
                    "requestedHeadroom must be a positive number, got {}",
                    self.requested_headroom
                ),
            });
        }
        if self.slot_duration_ms == 0 {
            return Err(crate::Error::InvalidConfig {
                reason: "slotDurationMs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
