//! Conformance for named-constant materialization: every constant bit
//! becomes a `__VCC__`/`__GND__` primitive, and indexing a constant beyond
//! its inferred width is a hard error.

use shdl_ir::PrimitiveKind;

#[test]
fn constant_bits_materialize_to_the_correct_vcc_gnd_pattern() {
    // 5 = 0b101: bit1=1 (VCC), bit2=0 (GND), bit3=1 (VCC)
    let source = "
        component WithConst() -> (Out[3]) {
            K[3] = 5;
            connect {
                K[1] -> Out[1];
                K[2] -> Out[2];
                K[3] -> Out[3];
            }
        }
    ";
    let result = shdl_conformance::front_end(source, None);
    assert!(!result.has_errors, "diagnostics: {:?}", result.diagnostics);
    let base = result.base.expect("front end should produce a Base component");

    assert_eq!(base.primitives.len(), 3);
    let kind_of = |suffix: &str| {
        base.primitives
            .values()
            .find(|p| p.name == format!("K_bit{suffix}"))
            .unwrap_or_else(|| panic!("missing K_bit{suffix}"))
            .kind
    };
    assert_eq!(kind_of("1"), PrimitiveKind::Vcc);
    assert_eq!(kind_of("2"), PrimitiveKind::Gnd);
    assert_eq!(kind_of("3"), PrimitiveKind::Vcc);
}

#[test]
fn indexing_a_constant_beyond_its_inferred_width_is_an_error() {
    // 3 infers to a 2-bit width (ceil(log2(4)) = 2); bit 3 is out of range.
    let source = "
        component BadConst() -> (Out) {
            K = 3;
            connect {
                K[3] -> Out;
            }
        }
    ";
    let result = shdl_conformance::front_end(source, None);
    assert!(result.has_errors);
    assert!(result.base.is_none());
}

#[test]
fn truth_values_of_materialized_constants_simulate_correctly() {
    if !shdl_conformance::has_any_compiler() {
        return;
    }
    let source = "
        component ConstOut() -> (Out[3]) {
            K[3] = 5;
            connect {
                K[1] -> Out[1];
                K[2] -> Out[2];
                K[3] -> Out[3];
            }
        }
    ";
    let sim = shdl_conformance::simulate(source, None).expect("should build and load");
    sim.reset();
    sim.step(1);
    assert_eq!(sim.peek("Out"), 5);
}
