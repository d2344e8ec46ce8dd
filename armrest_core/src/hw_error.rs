//! Maps `Box<dyn Error>` from trait boundaries to typed `ArmrestError`.
//!
//! `AnalogFrontEnd` returns `Box<dyn Error + Send + Sync>` so any driver can
//! plug in; this module converts those to our typed error enum, with an
//! optional feature-gated path for `armrest_hardware::HwError` downcasting.

use crate::error::ArmrestError;

/// Map a trait-boundary error to a typed `ArmrestError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ArmrestError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<armrest_hardware::error::HwError>() {
            return match hw {
                armrest_hardware::error::HwError::ChannelOutOfRange(_) => {
                    ArmrestError::Config(hw.to_string())
                }
                other => ArmrestError::SensorFault(other.to_string()),
            };
        }
    }

    ArmrestError::Sensor(e.to_string())
}
