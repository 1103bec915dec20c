//! Integration tests for connection semantics.
//!
//! These tests exercise `Design::connect` and `Design::generate_netlist`
//! through the public API: idempotence, N-ary joins, pin exclusivity,
//! net naming and netlist completeness.

use std::collections::BTreeSet;

use hat_netlist::netlist::{Catalog, Design, NetlistError, Netlist, PartId};

const CONNECTOR: &str = "Connector";
const RPI_HEADER: &str = "Raspberry_Pi_2_3";
const USB_C: &str = "USB_C_Receptacle_USB2.0";
const USB_FOOTPRINT: &str = "USB_C_Receptacle_GCT_USB4085";

struct Fixture {
    design: Design,
    header: PartId,
    usb_out: PartId,
    usb_in: PartId,
}

fn fixture() -> Fixture {
    let mut design = Design::new("fixture", Catalog::builtin());
    let header = design
        .declare_part(CONNECTOR, RPI_HEADER, "Samtec_HLE-120-02-xx-DV-TE_2x20_P2.54mm_Horizontal")
        .unwrap();
    let usb_out = design
        .declare_part(CONNECTOR, USB_C, USB_FOOTPRINT)
        .unwrap();
    let usb_in = design
        .declare_part(CONNECTOR, USB_C, USB_FOOTPRINT)
        .unwrap();
    Fixture {
        design,
        header,
        usb_out,
        usb_in,
    }
}

fn members(netlist: &Netlist, net: &str) -> BTreeSet<(String, String)> {
    netlist
        .net(net)
        .unwrap_or_else(|| panic!("net {net} missing"))
        .pins()
        .map(|(reference, pin)| (reference.to_string(), pin.to_string()))
        .collect()
}

fn set(pins: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    pins.iter()
        .map(|(reference, pin)| ((*reference).to_string(), (*pin).to_string()))
        .collect()
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_connecting_twice_is_idempotent() {
    let Fixture {
        mut design,
        usb_out,
        usb_in,
        ..
    } = fixture();
    let gnd = design.declare_net("GND").unwrap();

    design.connect([(usb_in, "A1"), (usb_out, "A1")], gnd).unwrap();
    let once = design.generate_netlist();

    design.connect([(usb_in, "A1"), (usb_out, "A1")], gnd).unwrap();
    design.connect([(usb_in, "A1")], gnd).unwrap();
    let twice = design.generate_netlist();

    assert_eq!(members(&once, "GND"), members(&twice, "GND"));
    assert_eq!(twice.net("GND").unwrap().nodes.len(), 2);
}

#[test]
fn test_same_pin_by_number_and_name_collapses() {
    let Fixture {
        mut design, header, ..
    } = fixture();
    let sel = design.declare_net("SD_MUX_SEL").unwrap();

    design
        .connect([(header, "GPIO23"), (header, "16")], sel)
        .unwrap();

    let netlist = design.generate_netlist();
    assert_eq!(members(&netlist, "SD_MUX_SEL"), set(&[("J1", "16")]));
}

// =============================================================================
// N-ary joins
// =============================================================================

#[test]
fn test_shared_pin_joins_three_members() {
    let Fixture {
        mut design,
        header,
        usb_out,
        usb_in,
    } = fixture();
    let sel = design.declare_net("SEL").unwrap();

    design.connect([(header, "GPIO23"), (usb_out, "SBU1")], sel).unwrap();
    design.connect([(header, "GPIO23"), (usb_in, "SBU2")], sel).unwrap();

    let netlist = design.generate_netlist();
    assert_eq!(
        members(&netlist, "SEL"),
        set(&[("J1", "16"), ("J2", "A8"), ("J3", "B8")])
    );
}

#[test]
fn test_single_statement_bus_join() {
    let Fixture {
        mut design,
        usb_out,
        usb_in,
        ..
    } = fixture();
    let usb_pn = design.declare_net("USB_PN").unwrap();

    design
        .connect(
            [(usb_in, "A6"), (usb_in, "B6"), (usb_out, "A6"), (usb_out, "B6")],
            usb_pn,
        )
        .unwrap();

    let net = design.net(usb_pn).unwrap();
    assert_eq!(net.len(), 4);
}

// =============================================================================
// Pin exclusivity
// =============================================================================

#[test]
fn test_pin_not_aliased_into_other_nets() {
    let Fixture {
        mut design,
        header,
        usb_out,
        ..
    } = fixture();
    let sel = design.declare_net("SD_MUX_SEL").unwrap();
    let rst = design.declare_net("SD_MUX_RST").unwrap();

    design.connect([(header, "GPIO23"), (usb_out, "SBU1")], sel).unwrap();
    design.connect([(header, "GPIO24"), (usb_out, "CC1")], rst).unwrap();

    let netlist = design.generate_netlist();
    assert!(netlist.net("SD_MUX_SEL").unwrap().contains("J1", "16"));
    assert!(!netlist.net("SD_MUX_RST").unwrap().contains("J1", "16"));
    assert!(!netlist.net("SD_MUX_SEL").unwrap().contains("J1", "18"));
}

#[test]
fn test_pin_on_two_nets_rejected() {
    let Fixture {
        mut design,
        header,
        usb_out,
        ..
    } = fixture();
    let sel = design.declare_net("SD_MUX_SEL").unwrap();
    let rst = design.declare_net("SD_MUX_RST").unwrap();

    design.connect([(header, "GPIO23")], sel).unwrap();
    let err = design
        .connect([(usb_out, "CC1"), (header, "GPIO23")], rst)
        .unwrap_err();

    match err {
        NetlistError::PinConflict {
            reference,
            pin,
            existing,
            requested,
        } => {
            assert_eq!(reference, "J1");
            assert_eq!(pin, "16");
            assert_eq!(existing, "SD_MUX_SEL");
            assert_eq!(requested, "SD_MUX_RST");
        }
        other => panic!("unexpected error: {other}"),
    }

    let netlist = design.generate_netlist();
    assert!(netlist.net("SD_MUX_RST").unwrap().nodes.is_empty());
}

// =============================================================================
// Net naming
// =============================================================================

#[test]
fn test_duplicate_net_name_rejected() {
    let mut design = Design::new("dup", Catalog::builtin());
    design.declare_net("GND").unwrap();

    let err = design.declare_net("GND").unwrap_err();
    assert!(matches!(err, NetlistError::DuplicateNet { ref name } if name == "GND"));
    assert_eq!(design.net_count(), 1);
}

#[test]
fn test_net_lookup_by_name() {
    let mut design = Design::new("lookup", Catalog::builtin());
    let vcc = design.declare_net("VCC").unwrap();
    assert_eq!(design.net_by_name("VCC"), Some(vcc));
    assert_eq!(design.net_by_name("vcc"), None);
}

// =============================================================================
// Netlist completeness
// =============================================================================

#[test]
fn test_netlist_has_one_entry_per_net() {
    let Fixture {
        mut design,
        header,
        usb_out,
        usb_in,
    } = fixture();
    let gnd = design.declare_net("GND").unwrap();
    let vcc = design.declare_net("VCC").unwrap();
    let sel = design.declare_net("SD_MUX_SEL").unwrap();

    // 7 connect calls over 3 nets
    design.connect([(usb_in, "A1"), (usb_out, "A1")], gnd).unwrap();
    design.connect([(usb_in, "B12"), (usb_out, "B12")], gnd).unwrap();
    design.connect([(usb_in, "A1"), (usb_out, "B12")], gnd).unwrap();
    design.connect([(usb_in, "B4"), (usb_out, "B4")], vcc).unwrap();
    design.connect([(usb_in, "A9")], vcc).unwrap();
    design.connect([(header, "GPIO23"), (usb_out, "SBU1")], sel).unwrap();
    design.connect([(header, "GPIO23"), (usb_out, "SBU2")], sel).unwrap();

    let netlist = design.generate_netlist();
    assert_eq!(netlist.len(), 3);
    assert_eq!(
        members(&netlist, "GND"),
        set(&[("J3", "A1"), ("J2", "A1"), ("J3", "B12"), ("J2", "B12")])
    );
    assert_eq!(
        members(&netlist, "VCC"),
        set(&[("J3", "B4"), ("J2", "B4"), ("J3", "A9")])
    );
    assert_eq!(
        members(&netlist, "SD_MUX_SEL"),
        set(&[("J1", "16"), ("J2", "A8"), ("J2", "B8")])
    );
    for net in &netlist.nets {
        let unique: BTreeSet<_> = net.pins().collect();
        assert_eq!(unique.len(), net.nodes.len(), "duplicates in {}", net.name);
    }
}

#[test]
fn test_power_pass_through_scenario() {
    let Fixture {
        mut design,
        usb_out,
        usb_in,
        ..
    } = fixture();
    let gnd = design.declare_net("GND").unwrap();
    let vcc = design.declare_net("VCC").unwrap();

    design.connect([(usb_in, "A1"), (usb_out, "A1")], gnd).unwrap();
    design.connect([(usb_in, "B4"), (usb_out, "B4")], vcc).unwrap();

    let netlist = design.generate_netlist();
    assert_eq!(netlist.len(), 2);
    assert_eq!(members(&netlist, "GND"), set(&[("J3", "A1"), ("J2", "A1")]));
    assert_eq!(members(&netlist, "VCC"), set(&[("J3", "B4"), ("J2", "B4")]));
}

#[test]
fn test_premature_snapshot_is_incomplete_but_valid() {
    let Fixture {
        mut design,
        usb_out,
        usb_in,
        ..
    } = fixture();
    let gnd = design.declare_net("GND").unwrap();
    design.connect([(usb_in, "A1")], gnd).unwrap();

    let early = design.generate_netlist();
    design.connect([(usb_out, "A1")], gnd).unwrap();
    let late = design.generate_netlist();

    assert_eq!(early.net("GND").unwrap().nodes.len(), 1);
    assert_eq!(early.degenerate_nets().count(), 1);
    assert_eq!(late.net("GND").unwrap().nodes.len(), 2);
    assert_eq!(late.degenerate_nets().count(), 0);
}
