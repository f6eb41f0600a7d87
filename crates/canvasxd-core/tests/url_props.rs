//! Origin stripping properties.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use canvasxd_core::protocol::url::strip_url;
use proptest::prelude::*;

proptest! {
    #[test]
    fn strip_is_idempotent_for_urls(
        u in "https?://[a-z0-9.]{1,16}(:[0-9]{1,5})?(/[a-z0-9.]{0,8}){0,3}(\\?[a-z=&]{0,12})?(#[a-z:/.]{0,12})?"
    ) {
        let once = strip_url(&u).unwrap();
        prop_assert_eq!(strip_url(&once).unwrap(), once.clone());
        prop_assert!(!once.contains('?'));
        prop_assert!(!once.contains('#'));
    }

    #[test]
    fn strip_is_idempotent_for_any_text(u in "[^\n\r]{1,64}") {
        let once = strip_url(&u).unwrap();
        prop_assert_eq!(strip_url(&once), Some(once.clone()));
    }
}

#[test]
fn strip_examples() {
    assert_eq!(
        strip_url("https://na2.salesforce.com/apex?id=0x23586902#abcdefg").as_deref(),
        Some("https://na2.salesforce.com")
    );
    assert_eq!(strip_url("https://na3.salesforce.com/my.jsp").as_deref(), Some("https://na3.salesforce.com"));
    assert_eq!(strip_url(""), None);
}
