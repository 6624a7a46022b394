/// Serial line settings.
///
/// Data bits, parity, stop bits and flow control are fixed at 8N1 with no flow
/// control, which is what the controller firmware speaks. Only the rate varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line rate in baud.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Default line rate of the controller firmware.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Baud rates accepted by [`SerialConfig`].
    pub const SUPPORTED_BAUD_RATES: [u32; 6] = [9_600, 19_200, 38_400, 57_600, 115_200, 230_400];

    /// Whether `baud_rate` is one the controller firmware can be built for.
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED_BAUD_RATES.contains(&self.baud_rate)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: Self::DEFAULT_BAUD_RATE,
        }
    }
}
