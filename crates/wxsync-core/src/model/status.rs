// ── Status side channel ──

/// Last-operation outcome written to the platform data record.
///
/// The only health signal visible on the platform side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum StatusMessage {
    #[strum(serialize = "Successfully converted Netatmo data to UDM")]
    ConversionSucceeded,
    #[strum(serialize = "Failed to convert Netatmo data")]
    ConversionFailed,
    #[strum(serialize = "Successfully updated UDM data")]
    UpdateSucceeded,
    #[strum(serialize = "Failed to update UDM data")]
    UpdateFailed,
}

impl StatusMessage {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::ConversionFailed | Self::UpdateFailed)
    }
}
