use serde::Serialize;
use std::fmt;

/// Barcode symbology inferred from the shape of a decoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BarcodeSymbology {
    /// 13-digit EAN with a trailing check digit
    #[serde(rename = "EAN13")]
    Ean13,
    /// 12-digit UPC-A with a trailing check digit
    #[serde(rename = "UPCA")]
    UpcA,
    /// 8-14 digit numeric code with no checksum
    GenericNumeric,
    /// 8-24 character code drawn from `[A-Za-z0-9-./+]`
    AlphanumericCode,
}

impl BarcodeSymbology {
    /// All symbologies in classification order
    pub const ALL: [BarcodeSymbology; 4] = [
        BarcodeSymbology::Ean13,
        BarcodeSymbology::UpcA,
        BarcodeSymbology::GenericNumeric,
        BarcodeSymbology::AlphanumericCode,
    ];

    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            BarcodeSymbology::Ean13 => "EAN-13",
            BarcodeSymbology::UpcA => "UPC-A",
            BarcodeSymbology::GenericNumeric => "numeric",
            BarcodeSymbology::AlphanumericCode => "alphanumeric",
        }
    }

    /// Whether payloads of this symbology carry a verified check digit
    pub fn has_checksum(&self) -> bool {
        matches!(self, BarcodeSymbology::Ean13 | BarcodeSymbology::UpcA)
    }
}

impl fmt::Display for BarcodeSymbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
