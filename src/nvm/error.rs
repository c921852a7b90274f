/// Fault flags latched by the flash controller after a programming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareFault {
    /// Write error, e.g. the target is write protected.
    WriteError,
    /// Low-voltage detect tripped while the operation was running.
    LowVoltage,
}

/// Errors that can occur during buffered NVM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NvmError {
    /// Address lies outside the NVM region.
    InvalidAddress,
    /// An erase or program operation reported a hardware fault.
    NvmWriteFailed(HardwareFault),
    /// Operation attempted with zero length.
    ZeroLength,
    /// A RAM endpoint is shorter than the requested length.
    OutOfBounds,
    /// Address or length violates word, row or page alignment.
    Unaligned,
}

impl core::fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HardwareFault::WriteError => write!(f, "write error"),
            HardwareFault::LowVoltage => write!(f, "low voltage detected"),
        }
    }
}

impl core::fmt::Display for NvmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NvmError::InvalidAddress => write!(f, "address outside the nvm region"),
            NvmError::NvmWriteFailed(fault) => write!(f, "nvm write failed: {fault}"),
            NvmError::ZeroLength => write!(f, "operation attempted with zero length"),
            NvmError::OutOfBounds => write!(f, "buffer shorter than requested length"),
            NvmError::Unaligned => write!(f, "address or length not aligned"),
        }
    }
}

impl From<HardwareFault> for NvmError {
    fn from(fault: HardwareFault) -> Self {
        NvmError::NvmWriteFailed(fault)
    }
}
