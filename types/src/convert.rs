//! Pure conversion helpers shared by every processor.

/// Longest keyword a document field may hold.
pub const MAX_FIELD_LENGTH: usize = 32766;
/// Longest raw value that still fits [`MAX_FIELD_LENGTH`] once base64 encoded.
pub const MAX_FIELD_LENGTH_BEFORE_BASE64: usize = 24575;

const TAGS_KEY: &str = "tags";
const METADATA_KEY: &str = "metadata";
const NUM_DECIMALS_IN_FLOAT: i32 = 10;

/// Minimal big-endian hex of `nonce`, always of even length.
pub fn nonce_to_hex(nonce: u64) -> String {
    let bytes = nonce.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    hex::encode(&bytes[first..])
}

/// Identifier of one NFT/SFT nonce inside a collection.
pub fn nft_identifier(token: &str, nonce: u64) -> String {
    format!("{}-{}", token, nonce_to_hex(nonce))
}

/// Big-endian unsigned decode. Empty input is zero; `None` if the value
/// does not fit 128 bits.
pub fn bytes_to_u128(bytes: &[u8]) -> Option<u128> {
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => return Some(0),
    };
    if significant.len() > 16 {
        return None;
    }
    Some(significant.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

/// Big-endian decode that saturates at `u64::MAX`.
pub fn bytes_to_u64(bytes: &[u8]) -> u64 {
    match bytes_to_u128(bytes) {
        Some(v) => u64::try_from(v).unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Big-endian decode of an NFT nonce; `None` when it does not fit 64 bits.
pub fn bytes_to_nonce(bytes: &[u8]) -> Option<u64> {
    bytes_to_u128(bytes).and_then(|v| u64::try_from(v).ok())
}

pub fn bytes_to_bool(bytes: &[u8]) -> bool {
    bytes == b"true"
}

/// Renders integer amounts as floats using the chain denomination.
#[derive(Clone, Copy, Debug)]
pub struct BalanceConverter {
    denomination: i32,
}

impl BalanceConverter {
    pub fn new(denomination: u32) -> Self {
        Self {
            denomination: i32::try_from(denomination).unwrap_or(i32::MAX),
        }
    }

    pub fn to_float(&self, value: u128) -> f64 {
        let raw = value as f64 / 10f64.powi(self.denomination);
        let scale = 10f64.powi(NUM_DECIMALS_IN_FLOAT);
        (raw * scale).round() / scale
    }

    /// Decimal string to float; unparsable input renders as zero.
    pub fn str_to_float(&self, value: &str) -> f64 {
        value.parse::<u128>().map(|v| self.to_float(v)).unwrap_or(0.0)
    }
}

fn truncate_at(field: &str, max: usize) -> &str {
    if field.len() <= max {
        return field;
    }
    let mut end = max;
    while !field.is_char_boundary(end) {
        end -= 1;
    }
    &field[..end]
}

pub fn truncate_field(field: &str) -> String {
    truncate_at(field, MAX_FIELD_LENGTH).to_string()
}

pub fn truncate_field_base64(field: &str) -> String {
    truncate_at(field, MAX_FIELD_LENGTH_BEFORE_BASE64).to_string()
}

pub fn truncate_slice(fields: &[String]) -> Vec<String> {
    fields.iter().map(|f| truncate_field(f)).collect()
}

/// Bytes as lossy UTF-8, truncated to the keyword limit.
pub fn bytes_to_field(bytes: &[u8]) -> String {
    truncate_field(&String::from_utf8_lossy(bytes))
}

fn attribute_value<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(';').find_map(|part| {
        let (k, v) = part.split_once(':')?;
        (k.trim() == key).then_some(v)
    })
}

/// Tags from attributes of the form `tags:a,b;metadata:...`.
pub fn extract_tags(attributes: &[u8]) -> Vec<String> {
    let attributes = String::from_utf8_lossy(attributes);
    attribute_value(&attributes, TAGS_KEY)
        .map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(truncate_field)
                .collect()
        })
        .unwrap_or_default()
}

pub fn extract_metadata(attributes: &[u8]) -> Option<String> {
    let attributes = String::from_utf8_lossy(attributes);
    attribute_value(&attributes, METADATA_KEY)
        .filter(|m| !m.is_empty())
        .map(truncate_field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nft_identifier_uses_even_length_hex() {
        assert_eq!(nft_identifier("XXXX-abcd", 2), "XXXX-abcd-02");
        assert_eq!(nft_identifier("my-token", 19), "my-token-13");
        assert_eq!(nft_identifier("nft-0123", 20), "nft-0123-14");
        assert_eq!(nonce_to_hex(0), "00");
        assert_eq!(nonce_to_hex(256), "0100");
    }

    #[test]
    fn big_endian_decoding() {
        assert_eq!(bytes_to_u128(&[]), Some(0));
        assert_eq!(bytes_to_u128(&[0x01, 0x00]), Some(256));
        assert_eq!(bytes_to_u128(&[0u8; 20]), Some(0));
        assert_eq!(bytes_to_u128(&[1u8; 17]), None);
        assert_eq!(bytes_to_u64(&[1u8; 9]), u64::MAX);
        assert_eq!(bytes_to_nonce(&[0, 0, 0x01, 0x00]), Some(256));
        assert_eq!(bytes_to_nonce(&[1u8; 9]), None);
        assert_eq!(bytes_to_nonce(&[1u8; 17]), None);
    }

    #[test]
    fn balance_as_float() {
        let converter = BalanceConverter::new(10);
        assert_eq!(converter.to_float(1_000_000_000), 0.1);
        assert_eq!(converter.str_to_float("nope"), 0.0);
        assert_eq!(BalanceConverter::new(18).str_to_float("1000000000000000000"), 1.0);
    }

    #[test]
    fn long_fields_are_truncated() {
        let long = "a".repeat(50_000);
        assert_eq!(truncate_field(&long).len(), MAX_FIELD_LENGTH);
        assert_eq!(truncate_field_base64(&long).len(), MAX_FIELD_LENGTH_BEFORE_BASE64);
        assert_eq!(truncate_field("short"), "short");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let field = "é".repeat(MAX_FIELD_LENGTH);
        let truncated = truncate_field(&field);
        assert!(truncated.len() <= MAX_FIELD_LENGTH);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn tags_and_metadata_from_attributes() {
        let attributes = b"tags:art, music,;metadata:QmHash";
        assert_eq!(extract_tags(attributes), vec!["art", "music"]);
        assert_eq!(extract_metadata(attributes).as_deref(), Some("QmHash"));
        assert!(extract_tags(b"something").is_empty());
        assert_eq!(extract_metadata(b"tags:a"), None);
    }
}
