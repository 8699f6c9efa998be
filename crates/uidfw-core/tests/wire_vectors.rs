//! Boundary decoding vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use uidfw_core::{FirewallChain, FirewallRule, Result, Uid};

use vector_loader::{load, RawCall};

// Same order a service applies: chain, then uid, then rule.
fn decode(call: &RawCall) -> Result<(FirewallChain, Uid, FirewallRule)> {
    let chain = FirewallChain::try_from(call.chain)?;
    let uid = Uid::try_from(call.uid)?;
    let rule = FirewallRule::try_from(call.rule)?;
    Ok((chain, uid, rule))
}

#[test]
fn wire_vectors() {
    let files = [
        "set_rule_ok.json",
        "set_rule_default.json",
        "bad_chain.json",
        "bad_rule.json",
        "negative_uid.json",
        "chain_zero.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode(&v.call);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let (chain, uid, rule) = res.expect("expected ok decode");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(chain.as_str(), ex["chain"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(uid.as_u32() as u64, ex["uid"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(rule.as_str(), ex["rule"].as_str().unwrap(), "vector={}", v.description);

        // Re-encoding yields the original wire values.
        assert_eq!(chain.as_raw(), v.call.chain, "vector={}", v.description);
        assert_eq!(uid.as_raw(), v.call.uid, "vector={}", v.description);
        assert_eq!(rule.as_raw(), v.call.rule, "vector={}", v.description);
    }
}
