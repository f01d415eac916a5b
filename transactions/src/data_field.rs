//! Operation labels from the transaction data field.
//!
//! The data field is `function@arg1@arg2...` with hex encoded arguments.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shardex_types::convert::{bytes_to_u128, bytes_to_u64, truncate_slice};
use shardex_types::{nft_identifier, AddressCodec};

pub const OPERATION_TRANSFER: &str = "transfer";
pub const OPERATION_SC_CALL: &str = "scCall";

pub const DCDT_TRANSFER: &str = "DCDTTransfer";
pub const DCDT_NFT_TRANSFER: &str = "DCDTNFTTransfer";
pub const MULTI_DCDT_NFT_TRANSFER: &str = "MultiDCDTNFTTransfer";
pub const DCDT_LOCAL_MINT: &str = "DCDTLocalMint";
pub const DCDT_LOCAL_BURN: &str = "DCDTLocalBurn";
pub const DCDT_NFT_ADD_QUANTITY: &str = "DCDTNFTAddQuantity";
pub const DCDT_NFT_BURN: &str = "DCDTNFTBurn";

/// Built-in functions that label the operation with their own name.
const BUILT_IN_FUNCTIONS: &[&str] = &[
    DCDT_LOCAL_MINT,
    DCDT_LOCAL_BURN,
    DCDT_NFT_ADD_QUANTITY,
    DCDT_NFT_BURN,
    "DCDTNFTCreate",
    "DCDTNFTAddURI",
    "DCDTNFTUpdateAttributes",
    "DCDTFreeze",
    "DCDTUnFreeze",
    "DCDTWipe",
    "DCDTSetRole",
    "DCDTUnSetRole",
    "DCDTNFTCreateRoleTransfer",
    "DCDTMetaDataRecreate",
    "DCDTMetaDataUpdate",
    "DCDTSetNewURIs",
    "DCDTModifyCreator",
    "DCDTModifyRoyalties",
    "ChangeOwnerAddress",
    "ClaimDeveloperRewards",
    "SaveKeyValue",
    "SetUserName",
    "SetGuardian",
    "GuardAccount",
    "UnGuardAccount",
];

const SC_ADDRESS_ZERO_PREFIX: usize = 8;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    pub operation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dcdt_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<String>,
}

impl ParsedData {
    fn operation(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            ..Default::default()
        }
    }
}

/// A smart contract address starts with eight zero bytes.
pub fn is_smart_contract_address(address: &[u8]) -> bool {
    address.len() > SC_ADDRESS_ZERO_PREFIX && address[..SC_ADDRESS_ZERO_PREFIX].iter().all(|b| *b == 0)
}

pub struct DataFieldParser {
    codec: Arc<dyn AddressCodec>,
}

impl DataFieldParser {
    pub fn new(codec: Arc<dyn AddressCodec>) -> Self {
        Self { codec }
    }

    pub fn parse(&self, data: &[u8], sender: &[u8], receiver: &[u8]) -> ParsedData {
        if data.is_empty() || data[0] == b'@' {
            return ParsedData::operation(OPERATION_TRANSFER);
        }

        let text = String::from_utf8_lossy(data);
        let mut parts = text.split('@');
        let function = parts.next().unwrap_or_default().to_string();
        let args: Vec<Vec<u8>> = parts.map(|p| hex::decode(p).unwrap_or_default()).collect();

        let mut parsed = match function.as_str() {
            DCDT_TRANSFER => self.dcdt_transfer(&args),
            DCDT_NFT_TRANSFER => self.nft_transfer(&args, sender, receiver),
            MULTI_DCDT_NFT_TRANSFER => self.multi_transfer(&args, sender, receiver),
            DCDT_LOCAL_MINT | DCDT_LOCAL_BURN => {
                let mut parsed = ParsedData::operation(&function);
                if args.len() >= 2 {
                    parsed.tokens.push(String::from_utf8_lossy(&args[0]).into_owned());
                    parsed.dcdt_values.push(decimal(&args[1]));
                }
                parsed
            }
            DCDT_NFT_ADD_QUANTITY | DCDT_NFT_BURN => {
                let mut parsed = ParsedData::operation(&function);
                if args.len() >= 3 {
                    let token = String::from_utf8_lossy(&args[0]);
                    parsed.tokens.push(nft_identifier(&token, bytes_to_u64(&args[1])));
                    parsed.dcdt_values.push(decimal(&args[2]));
                }
                parsed
            }
            name if BUILT_IN_FUNCTIONS.contains(&name) => ParsedData::operation(name),
            name if is_smart_contract_address(receiver) => ParsedData {
                operation: OPERATION_SC_CALL.to_string(),
                function: name.to_string(),
                ..Default::default()
            },
            _ => ParsedData::operation(OPERATION_TRANSFER),
        };

        parsed.tokens = truncate_slice(&parsed.tokens);
        parsed
    }

    /// `DCDTTransfer@token@value[@function@args...]`
    fn dcdt_transfer(&self, args: &[Vec<u8>]) -> ParsedData {
        let mut parsed = ParsedData::operation(DCDT_TRANSFER);
        if args.len() < 2 {
            return parsed;
        }
        parsed.tokens.push(String::from_utf8_lossy(&args[0]).into_owned());
        parsed.dcdt_values.push(decimal(&args[1]));
        parsed.function = function_arg(args, 2);
        parsed
    }

    /// `DCDTNFTTransfer@token@nonce@value@destination[@function@args...]`,
    /// sent by an account to itself.
    fn nft_transfer(&self, args: &[Vec<u8>], sender: &[u8], receiver: &[u8]) -> ParsedData {
        let mut parsed = ParsedData::operation(DCDT_NFT_TRANSFER);
        if args.len() < 4 || sender != receiver {
            return parsed;
        }
        let token = String::from_utf8_lossy(&args[0]);
        let nonce = bytes_to_u64(&args[1]);
        parsed.tokens.push(token_identifier(&token, nonce));
        parsed.dcdt_values.push(decimal(&args[2]));
        parsed.receivers.push(self.codec.encode_silent(&args[3]));
        parsed.function = function_arg(args, 4);
        parsed
    }

    /// `MultiDCDTNFTTransfer@destination@count@(token@nonce@value)*[@function@args...]`,
    /// sent by an account to itself.
    fn multi_transfer(&self, args: &[Vec<u8>], sender: &[u8], receiver: &[u8]) -> ParsedData {
        let mut parsed = ParsedData::operation(MULTI_DCDT_NFT_TRANSFER);
        if args.len() < 2 || sender != receiver {
            return parsed;
        }
        let count = bytes_to_u64(&args[1]) as usize;
        let transfers_end = 2usize.saturating_add(count.saturating_mul(3));
        if args.len() < transfers_end {
            return parsed;
        }

        parsed.receivers.push(self.codec.encode_silent(&args[0]));
        for transfer in args[2..transfers_end].chunks(3) {
            let token = String::from_utf8_lossy(&transfer[0]);
            parsed.tokens.push(token_identifier(&token, bytes_to_u64(&transfer[1])));
            parsed.dcdt_values.push(decimal(&transfer[2]));
        }
        parsed.function = function_arg(args, transfers_end);
        parsed
    }
}

fn token_identifier(token: &str, nonce: u64) -> String {
    if nonce == 0 {
        token.to_string()
    } else {
        nft_identifier(token, nonce)
    }
}

fn decimal(bytes: &[u8]) -> String {
    bytes_to_u128(bytes).unwrap_or_default().to_string()
}

fn function_arg(args: &[Vec<u8>], index: usize) -> String {
    args.get(index)
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .unwrap_or_default()
}
