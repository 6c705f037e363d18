//! Integration coverage for vocabulary derivation, in-place attachment, and
//! custom operation semantics.

use chainstack::{args, CallRecord, ChainError, Kind, Reply};
use serde_json::json;

fn expect_chain(reply: Reply) -> chainstack::Chain {
    reply.into_chain().expect("fluent op yields chain")
}

#[test]
fn derived_kind_supports_base_and_new_operations() -> Result<(), ChainError> {
    let base = Kind::root("base").extend(&["shared"]);
    let derived = base.extend(&["a", "b"]);

    let c = derived.chain();
    c.call("shared", args![])?
        .call("a", args![1])?
        .call("b", args![2])?;
    assert_eq!(c.len(), 3);

    // The base never learned the new names.
    assert!(matches!(
        base.construct().call("a", args![]),
        Err(ChainError::UnknownOperation { .. })
    ));
    Ok(())
}

#[test]
fn kinds_never_cross_contaminate() -> Result<(), ChainError> {
    let base = Kind::root("base").extend(&["op"]);
    let derived = base.extend(&["extra"]);

    let base_chain = base.chain();
    let derived_chain = derived.chain();
    derived_chain.call("op", args!["d"])?.call("extra", args![])?;
    base_chain.call("op", args!["b"])?;

    assert_eq!(base_chain.stack(), vec![CallRecord::new("op", args!["b"])]);
    assert_eq!(derived_chain.len(), 2);
    assert_ne!(base_chain.kind(), derived_chain.kind());
    Ok(())
}

#[test]
fn bare_kind_entry_point_matches_the_instance_path() -> Result<(), ChainError> {
    let kind = Kind::root("t").extend(&["op"]);

    let via_kind = kind
        .call("op", args![1, "x"])?
        .into_chain()
        .expect("fluent op yields chain");
    let via_instance = kind
        .construct()
        .call("op", args![1, "x"])?
        .into_chain()
        .expect("fluent op yields chain");

    assert_eq!(via_kind.stack(), via_instance.stack());
    assert_eq!(via_kind.attributes(), via_instance.attributes());
    Ok(())
}

#[test]
fn custom_operation_returning_none_keeps_the_chain_fluent() -> Result<(), ChainError> {
    let kind = Kind::root("t")
        .derive()
        .op("op")
        .custom("tag", |chain, cal_args| {
            if let Some(value) = cal_args.first() {
                chain.set_attribute("tag", value.clone());
            }
            None
        })
        .seal();

    let c = kind.chain();
    let reply = c.call("op", args![1])?.call("tag", args!["audit"])?;
    let back = expect_chain(reply);
    back.call("op", args![2])?;

    assert_eq!(c.len(), 2);
    assert_eq!(c.attribute("tag"), Some(json!("audit")));
    Ok(())
}

#[test]
fn custom_operation_returning_some_ends_the_chain_with_that_value() -> Result<(), ChainError> {
    let kind = Kind::root("t")
        .derive()
        .ops(["op"])
        .custom("build", |chain, _args| {
            let methods: Vec<String> = chain.stack().into_iter().map(|r| r.method).collect();
            Some(json!(methods))
        })
        .seal();

    let value = kind
        .chain()
        .call("op", args![])?
        .call("op", args![])?
        .call("build", args![])?
        .into_value()
        .expect("build is terminal");
    assert_eq!(value, json!(["op", "op"]));
    Ok(())
}

#[test]
fn custom_operation_on_bare_kind_binds_a_fresh_instance() {
    let kind = Kind::root("t");
    kind.attach_with("probe", |chain, _args| Some(json!(chain.len())));
    let value = kind
        .call("probe", args![])
        .expect("custom op")
        .into_value()
        .expect("probe is terminal");
    assert_eq!(value, json!(0));
}

#[test]
fn attach_with_installs_in_place_without_deriving() -> Result<(), ChainError> {
    let kind = Kind::root("t").extend(&["op"]);
    let c = kind.chain();
    c.call("op", args![1])?;

    kind.attach_with("sum", |chain, _args| {
        let total: i64 = chain
            .stack()
            .iter()
            .filter_map(|r| r.args.first().and_then(|v| v.as_i64()))
            .sum();
        Some(json!(total))
    });

    let value = c
        .call("op", args![2])?
        .call("sum", args![])?
        .into_value()
        .expect("sum is terminal");
    assert_eq!(value, json!(3));
    Ok(())
}

#[test]
fn wrapped_chain_keeps_recording_under_the_wrapping_kind() -> Result<(), ChainError> {
    let base = Kind::root("base").extend(&["op"]);
    let derived = base.extend(&["extra"]);

    let original = base.chain();
    original.call("op", args![1])?;

    let wrapped = derived.wrap(&original);
    wrapped.chain();
    wrapped.call("extra", args![])?;

    assert_eq!(wrapped.len(), 2);
    assert_eq!(wrapped.kind(), &derived);
    assert_eq!(original.len(), 1);
    Ok(())
}
