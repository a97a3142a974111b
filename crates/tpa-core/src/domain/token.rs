//! Token & control-message formats.
//!
//! Rather than reading raw byte offsets into packet buffers ad hoc,
//! `EspView` is a typed accessor over an ESP datagram with bounds checks
//! living in one place.

use tpa_types::{Error, HashValue};

/// `sizeof(ESP-header)`: 4-byte SPI + 4-byte sequence number (RFC 4303).
pub const ESP_HEADER_LEN: usize = 8;

/// One `(seq, packet_hash)` entry of a cumulative authentication block:
/// trailing items after the in-ESP token, used by the CUMULATIVE and
/// PARA_CUMUL transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeItem {
    pub seq: u32,
    pub packet_hash: HashValue,
}

/// A checked view over one ESP datagram: `[SPI|seq | token | cumul items
/// | ciphertext...]`. All offset arithmetic lives here so nothing else in
/// the crate touches a raw byte index.
pub struct EspView<'a> {
    data: &'a [u8],
    hash_len: usize,
    cumul_item_count: usize,
}

impl<'a> EspView<'a> {
    /// Build a view, checking the datagram is long enough to hold the
    /// ESP header, the token, and `cumul_item_count` cumulative entries.
    pub fn new(data: &'a [u8], hash_len: usize, cumul_item_count: usize) -> Result<Self, Error> {
        let view = Self {
            data,
            hash_len,
            cumul_item_count,
        };
        if data.len() < view.esp_data_offset() {
            return Err(Error::Malformed(format!(
                "ESP datagram too short: {} bytes, need at least {}",
                data.len(),
                view.esp_data_offset()
            )));
        }
        Ok(view)
    }

    /// `esp_data_offset = sizeof(ESP-header) + L + k*(4+L)`.
    pub fn esp_data_offset(&self) -> usize {
        ESP_HEADER_LEN + self.hash_len + self.cumul_item_count * (4 + self.hash_len)
    }

    pub fn spi(&self) -> u32 {
        u32::from_be_bytes(self.data[0..4].try_into().unwrap())
    }

    /// The ESP sequence number, `esp_seq` everywhere the verifier refers to it.
    pub fn seq(&self) -> u32 {
        u32::from_be_bytes(self.data[4..8].try_into().unwrap())
    }

    /// The `L`-byte opaque token immediately after the ESP header.
    pub fn token(&self) -> HashValue {
        let start = ESP_HEADER_LEN;
        HashValue::from_slice(&self.data[start..start + self.hash_len])
            .expect("hash_len bounded by MAX_HASH_LEN, checked at config load")
    }

    /// The `k`-th cumulative `(seq, packet_hash)` entry, if present.
    pub fn cumulative_item(&self, k: usize) -> Option<CumulativeItem> {
        if k >= self.cumul_item_count {
            return None;
        }
        let item_start = ESP_HEADER_LEN + self.hash_len + k * (4 + self.hash_len);
        let seq = u32::from_be_bytes(self.data[item_start..item_start + 4].try_into().unwrap());
        let hash_start = item_start + 4;
        let packet_hash =
            HashValue::from_slice(&self.data[hash_start..hash_start + self.hash_len])
                .expect("hash_len bounded by MAX_HASH_LEN");
        Some(CumulativeItem { seq, packet_hash })
    }

    /// Iterate every cumulative item present in this datagram.
    pub fn cumulative_items(&self) -> impl Iterator<Item = CumulativeItem> + '_ {
        (0..self.cumul_item_count).filter_map(move |k| self.cumulative_item(k))
    }

    /// The bytes of the encrypted payload (IV + ciphertext + auth-tag),
    /// i.e. everything after `esp_data_offset`. Not covered by the token's
    /// own authentication — only used here to hash whole-packet content
    /// for the cumulative-ring comparison.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.esp_data_offset()..]
    }

    /// The whole datagram, for whole-ESP-payload hashing (`H(whole ESP
    /// payload)`, fed into the cumulative ring).
    pub fn whole(&self) -> &[u8] {
        self.data
    }
}
