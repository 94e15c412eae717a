//! Structural conformance for generator unrolling: a generator header must
//! expand to exactly the instances and connections its range implies, with
//! `name{i}` template substitution producing the expected instance names.

use shdl_ir::PrimitiveKind;

const INVERTER_BUS: &str = "
component InverterBus(In[4]) -> (Out[4]) {
    > i [4] {
        b{i}: NOT;
    }
    connect {
        > i [4] {
            In[i] -> b{i}.A;
            b{i}.O -> Out[i];
        }
    }
}
";

#[test]
fn single_range_generator_unrolls_to_one_instance_per_iteration() {
    let result = shdl_conformance::front_end(INVERTER_BUS, None);
    assert!(!result.has_errors, "diagnostics: {:?}", result.diagnostics);
    let base = result.base.expect("front end should produce a Base component");

    assert_eq!(base.primitives.len(), 4);
    for p in base.primitives.values() {
        assert_eq!(p.kind, PrimitiveKind::Not);
    }
    let names: Vec<&str> = base.primitives.iter().map(|(_, p)| p.name.as_str()).collect();
    for i in 1..=4 {
        assert!(names.contains(&format!("b{i}").as_str()), "missing instance b{i}");
    }
    // each inverter has one input connection and one output connection
    assert_eq!(base.connections.len(), 8);
}

const RANGE_LIST_BUS: &str = "
component Selective(In[6]) -> (Out[6]) {
    > i [1:2, 4:6] {
        p{i}: NOT;
    }
    connect {
        > i [1:2, 4:6] {
            In[i] -> p{i}.A;
            p{i}.O -> Out[i];
        }
    }
}
";

#[test]
fn multi_range_header_produces_the_union_in_order() {
    let result = shdl_conformance::front_end(RANGE_LIST_BUS, None);
    assert!(!result.has_errors, "diagnostics: {:?}", result.diagnostics);
    let base = result.base.expect("front end should produce a Base component");

    // union of {1,2} and {4,5,6}; bit 3 is intentionally left unconnected.
    let names: Vec<&str> = base.primitives.iter().map(|(_, p)| p.name.as_str()).collect();
    assert_eq!(base.primitives.len(), 5);
    for i in [1, 2, 4, 5, 6] {
        assert!(names.contains(&format!("p{i}").as_str()), "missing instance p{i}");
    }
    assert!(!names.contains(&"p3"));
}
