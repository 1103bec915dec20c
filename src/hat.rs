//! The Autokit HAT.
//!
//! A Raspberry Pi HAT carrying two USB-C receptacles. USB 2.0 data and power
//! pass straight through from the input receptacle to the output receptacle,
//! while two GPIO lines drive the SD mux on the far side through the output
//! connector's sideband (SBU) and configuration-channel (CC) pins.
//!
//! | Net          | Members                                   |
//! |--------------|-------------------------------------------|
//! | `SD_MUX_SEL` | header GPIO23, out SBU1, out SBU2         |
//! | `SD_MUX_RST` | header GPIO24, out CC1, out CC2           |
//! | `USB_PN`     | in/out A6, B6                             |
//! | `USB_DN`     | in/out A7, B7                             |
//! | `GND`        | in/out A1, A12, B1, B12                   |
//! | `VCC`        | in/out A4, A9, B4, B9                     |

use tracing::info;

use crate::netlist::catalog::{CONNECTOR_CATEGORY, RPI_HEADER_NAME, USB_C_RECEPTACLE_NAME};
use crate::netlist::{Catalog, Design, NetlistResult, PartId};

/// Design name, written as the netlist source.
pub const DESIGN_NAME: &str = "autokit-hat";

/// Right-angle 2x20 header footprint.
pub const RPI_HEADER_FOOTPRINT: &str = "Samtec_HLE-120-02-xx-DV-TE_2x20_P2.54mm_Horizontal";

/// USB-C receptacle footprint used for both connectors.
pub const USB_C_FOOTPRINT: &str = "USB_C_Receptacle_GCT_USB4085";

/// Net names.
pub mod nets {
    /// Ground, shared by both receptacles.
    pub const GND: &str = "GND";
    /// VBUS pass-through.
    pub const VCC: &str = "VCC";
    /// SD mux select (GPIO23).
    pub const SD_MUX_SEL: &str = "SD_MUX_SEL";
    /// SD mux reset (GPIO24).
    pub const SD_MUX_RST: &str = "SD_MUX_RST";
    /// USB D- pass-through.
    pub const USB_DN: &str = "USB_DN";
    /// USB D+ pass-through.
    pub const USB_PN: &str = "USB_PN";
}

/// The declared HAT and handles to its parts.
#[derive(Debug, Clone)]
pub struct AutokitHat {
    /// The full design.
    pub design: Design,
    /// 40-pin GPIO header (J1).
    pub rpi_header: PartId,
    /// Output USB-C receptacle, towards the SD mux (J2).
    pub usb_out: PartId,
    /// Input USB-C receptacle (J3).
    pub usb_in: PartId,
}

impl AutokitHat {
    /// Declares every part, net and connection of the HAT.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog lacks one of the connector templates.
    pub fn build(catalog: Catalog) -> NetlistResult<Self> {
        let mut design = Design::new(DESIGN_NAME, catalog);

        let rpi_header =
            design.declare_part(CONNECTOR_CATEGORY, RPI_HEADER_NAME, RPI_HEADER_FOOTPRINT)?;
        let usb_out =
            design.declare_part(CONNECTOR_CATEGORY, USB_C_RECEPTACLE_NAME, USB_C_FOOTPRINT)?;
        let usb_in =
            design.declare_part(CONNECTOR_CATEGORY, USB_C_RECEPTACLE_NAME, USB_C_FOOTPRINT)?;

        let gnd = design.declare_net(nets::GND)?;
        let vcc = design.declare_net(nets::VCC)?;
        let sd_mux_sel = design.declare_net(nets::SD_MUX_SEL)?;
        let sd_mux_rst = design.declare_net(nets::SD_MUX_RST)?;
        let usb_dn = design.declare_net(nets::USB_DN)?;
        let usb_pn = design.declare_net(nets::USB_PN)?;

        // SD mux control
        design.connect([(rpi_header, "GPIO23"), (usb_out, "SBU1")], sd_mux_sel)?;
        design.connect([(rpi_header, "GPIO23"), (usb_out, "SBU2")], sd_mux_sel)?;
        design.connect([(rpi_header, "GPIO24"), (usb_out, "CC1")], sd_mux_rst)?;
        design.connect([(rpi_header, "GPIO24"), (usb_out, "CC2")], sd_mux_rst)?;

        // USB 2.0 data
        design.connect(
            [(usb_in, "A6"), (usb_in, "B6"), (usb_out, "A6"), (usb_out, "B6")],
            usb_pn,
        )?;
        design.connect(
            [(usb_in, "A7"), (usb_in, "B7"), (usb_out, "A7"), (usb_out, "B7")],
            usb_dn,
        )?;

        for pin in ["A1", "A12", "B1", "B12"] {
            design.connect([(usb_in, pin), (usb_out, pin)], gnd)?;
        }
        for pin in ["B4", "A9", "A4", "B9"] {
            design.connect([(usb_in, pin), (usb_out, pin)], vcc)?;
        }

        info!(
            parts = design.part_count(),
            nets = design.net_count(),
            "Declared Autokit HAT"
        );

        Ok(Self {
            design,
            rpi_header,
            usb_out,
            usb_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_builtin_catalog() {
        let hat = AutokitHat::build(Catalog::builtin()).unwrap();
        assert_eq!(hat.design.part_count(), 3);
        assert_eq!(hat.design.net_count(), 6);
        assert_eq!(hat.design.part(hat.rpi_header).unwrap().reference(), "J1");
        assert_eq!(hat.design.part(hat.usb_out).unwrap().reference(), "J2");
        assert_eq!(hat.design.part(hat.usb_in).unwrap().reference(), "J3");
    }

    #[test]
    fn fails_without_connector_templates() {
        assert!(AutokitHat::build(Catalog::new()).is_err());
    }

    #[test]
    fn no_degenerate_nets() {
        let hat = AutokitHat::build(Catalog::builtin()).unwrap();
        assert_eq!(hat.design.generate_netlist().degenerate_nets().count(), 0);
    }

    #[test]
    fn header_ground_is_unconnected() {
        let hat = AutokitHat::build(Catalog::builtin()).unwrap();
        assert!(hat.design.net_of(hat.rpi_header, "6").unwrap().is_none());
    }
}
