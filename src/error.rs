use core::fmt;

/// Why a sample was rejected before reaching a strategy's math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFault {
    /// NaN or infinity in one of the fields
    NonFinite,
    /// Reading outside of what the sensor can physically report
    OutOfRange,
    /// Raw sample given to a quaternion decoder or the other way around
    WrongKind,
    /// Timestamp did not move forward
    NonMonotonic,
}

/// Construction-time configuration problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFault {
    /// Nominal fusion update rate must be finite and positive
    SampleRate,
    /// Fusion gain must be finite and non-negative
    Gain,
    /// Validation limits must be finite and positive
    Limits,
    /// Starting quaternion of the fusion filter cannot be normalized
    InitialAttitude,
    /// Strategy code read from configuration storage is unknown
    UnknownStrategy(u8),
}

/// All possible errors in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Quaternion or vector with near-zero norm, cannot be normalized
    DegenerateInput,
    InvalidSample(SampleFault),
    /// Only returned from constructors, never from the update path
    Misconfiguration(ConfigFault),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Soft faults are recovered by skipping the sample
    pub fn is_soft(&self) -> bool {
        !matches!(self, Error::Misconfiguration(_))
    }
}

impl From<SampleFault> for Error {
    fn from(fault: SampleFault) -> Self {
        Error::InvalidSample(fault)
    }
}

impl From<ConfigFault> for Error {
    fn from(fault: ConfigFault) -> Self {
        Error::Misconfiguration(fault)
    }
}

impl fmt::Display for SampleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SampleFault::NonFinite => "non-finite value",
            SampleFault::OutOfRange => "value out of physical range",
            SampleFault::WrongKind => "sample kind not accepted by strategy",
            SampleFault::NonMonotonic => "timestamp did not increase",
        })
    }
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFault::SampleRate => f.write_str("sample rate must be positive"),
            ConfigFault::Gain => f.write_str("fusion gain must be non-negative"),
            ConfigFault::Limits => f.write_str("sample limits must be positive"),
            ConfigFault::InitialAttitude => f.write_str("initial attitude is not a rotation"),
            ConfigFault::UnknownStrategy(code) => write!(f, "unknown strategy code {code}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DegenerateInput => f.write_str("degenerate input: norm too close to zero"),
            Error::InvalidSample(fault) => write!(f, "invalid sample: {fault}"),
            Error::Misconfiguration(fault) => write!(f, "misconfigured strategy: {fault}"),
        }
    }
}

impl core::error::Error for Error {}
