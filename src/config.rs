//! Protocol constants and the tunable limits of a [`RangeProofEngine`](::RangeProofEngine).

use errors::ProofError;

/// Bit width of every committed value.
pub const INPUT_VALUE_BITS: usize = 64;

/// Number of message bytes packed together with the first value into `alpha`.
pub const MESSAGE_PREFIX_SIZE: usize = 23;

/// Number of message bytes that fit into `tau1` after the prefix.
pub const MESSAGE_SUFFIX_CAPACITY: usize = 31;

/// Nonce salt for the blinding of the bit commitment `A`.
pub const ALPHA_SALT: u64 = 1;
/// Nonce salt for the blinding of the commitment `S`.
pub const RHO_SALT: u64 = 2;
/// Nonce salt for the blinding of `T1`.
pub const TAU1_SALT: u64 = 3;
/// Nonce salt for the blinding of `T2`.
pub const TAU2_SALT: u64 = 4;
/// Nonce salt of the blinding of value `i` is `GAMMA_SALT_BASE + i`.
pub const GAMMA_SALT_BASE: u64 = 100;

/// Limits applied when proving and verifying.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeProofConfig {
    /// Maximum number of values committed in a single proof.
    pub max_input_values: usize,
    /// Maximum length of the message embedded in a proof.
    pub max_message_size: usize,
    /// Number of proving attempts before giving up on degenerate challenges.
    pub max_prove_tries: usize,
}

impl Default for RangeProofConfig {
    fn default() -> Self {
        RangeProofConfig {
            max_input_values: 16,
            max_message_size: MESSAGE_PREFIX_SIZE + MESSAGE_SUFFIX_CAPACITY,
            max_prove_tries: 100,
        }
    }
}

impl RangeProofConfig {
    /// Checks that the limits can be honoured by the proof encoding.
    pub fn validate(&self) -> Result<(), ProofError> {
        if self.max_input_values == 0 {
            return Err(ProofError::InvalidInput(
                "max_input_values must be positive".into(),
            ));
        }
        if self.max_message_size > MESSAGE_PREFIX_SIZE + MESSAGE_SUFFIX_CAPACITY {
            return Err(ProofError::InvalidInput(format!(
                "max_message_size cannot exceed {} bytes",
                MESSAGE_PREFIX_SIZE + MESSAGE_SUFFIX_CAPACITY
            )));
        }
        Ok(())
    }

    /// Number of `Gi`/`Hi` generators needed for the largest allowed proof.
    pub fn generators_capacity(&self) -> usize {
        self.max_input_values.next_power_of_two() * INPUT_VALUE_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RangeProofConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_message_size, 54);
        assert_eq!(config.generators_capacity(), 16 * 64);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let config = RangeProofConfig {
            max_input_values: 5,
            ..RangeProofConfig::default()
        };
        assert_eq!(config.generators_capacity(), 8 * 64);
    }

    #[test]
    fn rejects_unusable_limits() {
        let no_values = RangeProofConfig {
            max_input_values: 0,
            ..RangeProofConfig::default()
        };
        assert!(no_values.validate().is_err());

        let huge_message = RangeProofConfig {
            max_message_size: 55,
            ..RangeProofConfig::default()
        };
        assert!(huge_message.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_bincode() {
        let config: RangeProofConfig =
            bincode::deserialize(&bincode::serialize(&RangeProofConfig::default()).unwrap())
                .unwrap();
        assert_eq!(config, RangeProofConfig::default());
    }
}
