#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// register address or count outside of the register store
    OutOfRange,
    /// response buffer capacity exceeded
    OOB,
    /// less than a full request frame buffered
    FrameIncomplete,
    AddressMismatch,
    CrcMismatch,
    UnsupportedFunction,
    CommunicationError,
}

impl ErrorKind {
    /// Frame-level faults which end with no response on the wire and nothing reported upwards
    pub fn is_silent_drop(self) -> bool {
        matches!(
            self,
            ErrorKind::AddressMismatch | ErrorKind::CrcMismatch | ErrorKind::UnsupportedFunction
        )
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &str = match self {
            ErrorKind::OutOfRange => "REGISTER ADDRESS OUT OF RANGE",
            ErrorKind::OOB => "OUT OF BUFFER",
            ErrorKind::FrameIncomplete => "FRAME INCOMPLETE",
            ErrorKind::AddressMismatch => "FRAME NOT ADDRESSED TO THIS SLAVE",
            ErrorKind::CrcMismatch => "FRAME CRC ERROR",
            ErrorKind::UnsupportedFunction => "UNSUPPORTED FUNCTION",
            ErrorKind::CommunicationError => "COMMUNICATION ERROR",
        };
        write!(f, "{}", msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ErrorKind {}
