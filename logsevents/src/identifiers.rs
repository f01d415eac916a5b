//! The closed vocabulary of event identifiers.

// Issue
pub const ISSUE: &str = "issue";
pub const ISSUE_SEMI_FUNGIBLE: &str = "issueSemiFungible";
pub const ISSUE_NON_FUNGIBLE: &str = "issueNonFungible";
pub const REGISTER_META_DCDT: &str = "registerMetaDCDT";
pub const CHANGE_SFT_TO_META_DCDT: &str = "changeSFTToMetaDCDT";
pub const CHANGE_TO_DYNAMIC: &str = "changeToDynamic";
pub const TRANSFER_OWNERSHIP: &str = "transferOwnership";
pub const REGISTER_AND_SET_ALL_ROLES: &str = "registerAndSetAllRoles";
pub const REGISTER_DYNAMIC: &str = "registerDynamic";
pub const REGISTER_AND_SET_ALL_ROLES_DYNAMIC: &str = "registerAndSetAllRolesDynamic";

// NFTs
pub const NFT_CREATE: &str = "DCDTNFTCreate";
pub const NFT_BURN: &str = "DCDTNFTBurn";
pub const WIPE: &str = "DCDTWipe";

// NFT properties
pub const NFT_ADD_URI: &str = "DCDTNFTAddURI";
pub const NFT_UPDATE_ATTRIBUTES: &str = "DCDTNFTUpdateAttributes";
pub const FREEZE: &str = "DCDTFreeze";
pub const UNFREEZE: &str = "DCDTUnFreeze";
pub const PAUSE: &str = "DCDTPause";
pub const UNPAUSE: &str = "DCDTUnPause";
pub const METADATA_RECREATE: &str = "DCDTMetaDataRecreate";
pub const METADATA_UPDATE: &str = "DCDTMetaDataUpdate";
pub const SET_NEW_URIS: &str = "DCDTSetNewURIs";
pub const MODIFY_CREATOR: &str = "DCDTModifyCreator";
pub const MODIFY_ROYALTIES: &str = "DCDTModifyRoyalties";

// Roles and properties
pub const SET_ROLE: &str = "DCDTSetRole";
pub const UNSET_ROLE: &str = "DCDTUnSetRole";
pub const NFT_CREATE_ROLE_TRANSFER: &str = "DCDTNFTCreateRoleTransfer";
pub const UPGRADE_PROPERTIES: &str = "upgradeProperties";
pub const ROLE_PREFIX: &str = "DCDTRole";
pub const ROLE_NFT_CREATE: &str = "DCDTRoleNFTCreate";

// Delegation
pub const DELEGATE: &str = "delegate";
pub const UNDELEGATE: &str = "unDelegate";
pub const WITHDRAW: &str = "withdraw";
pub const RE_DELEGATE_REWARDS: &str = "reDelegateRewards";
pub const CLAIM_REWARDS: &str = "claimRewards";

// Contracts
pub const SC_DEPLOY: &str = "SCDeploy";
pub const SC_UPGRADE: &str = "SCUpgrade";
pub const CHANGE_OWNER_ADDRESS: &str = "ChangeOwnerAddress";

// Informative
pub const COMPLETED_TX_EVENT: &str = "completedTxEvent";
pub const SIGNAL_ERROR: &str = "signalError";
pub const INTERNAL_VM_ERRORS: &str = "internalVMErrors";
pub const WRITE_LOG: &str = "writeLog";

// Token types whose single unit is the whole NFT document
pub const NON_FUNGIBLE_DCDT: &str = "NonFungibleDCDT";
pub const NON_FUNGIBLE_DCDT_V2: &str = "NonFungibleDCDTv2";
pub const DYNAMIC_NON_FUNGIBLE_DCDT: &str = "DynamicNonFungibleDCDT";
