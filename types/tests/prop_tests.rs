use proptest::prelude::*;

use shardex_types::convert::{bytes_to_u128, nft_identifier, nonce_to_hex};
use shardex_types::StatusInfo;

fn signal() -> impl Strategy<Value = StatusInfo> {
    (any::<bool>(), any::<bool>(), "[a-z]{0,8}")
        .prop_map(|(c, e, s)| StatusInfo::new(c, e, s))
}

proptest! {
    /// The nonce part of an identifier is even-length hex that decodes back to the nonce.
    #[test]
    fn nft_identifier_suffix_decodes_to_nonce(token in "[A-Z]{3,10}-[a-f0-9]{6}", nonce in 0u64..) {
        let id = nft_identifier(&token, nonce);
        let suffix = id.strip_prefix(&format!("{}-", token)).expect("token prefix");
        prop_assert_eq!(suffix.len() % 2, 0);
        prop_assert_eq!(suffix, nonce_to_hex(nonce));
        let bytes = hex::decode(suffix).expect("hex");
        prop_assert_eq!(bytes_to_u128(&bytes), Some(u128::from(nonce)));
    }

    /// Latched booleans do not depend on signal order.
    #[test]
    fn latch_flags_commute(a in signal(), b in signal()) {
        let mut ab = StatusInfo::default();
        ab.latch(&a);
        ab.latch(&b);

        let mut ba = StatusInfo::default();
        ba.latch(&b);
        ba.latch(&a);

        prop_assert_eq!(ab.completed_event, ba.completed_event);
        prop_assert_eq!(ab.error_event, ba.error_event);
    }

    /// After an error, non-error signals leave the status untouched.
    #[test]
    fn status_after_error_is_immune(later in prop::collection::vec("[a-z]{0,8}", 0..5)) {
        let mut info = StatusInfo::default();
        info.latch(&StatusInfo::failed());
        for s in later {
            info.latch(&StatusInfo::new(true, false, s));
        }
        prop_assert_eq!(info.status, "fail");
        prop_assert!(info.error_event);
    }
}
