//! Part catalog: templates from which parts are instantiated.
//!
//! A template is addressed by a `(category, name)` pair, mirroring the
//! `library:symbol` convention of schematic tools. The catalog ships with the
//! two connector templates the HAT needs and can be extended from a JSON file:
//!
//! ```json
//! {
//!   "parts": [
//!     {
//!       "category": "Device",
//!       "name": "R",
//!       "description": "Resistor",
//!       "reference_prefix": "R",
//!       "pins": [
//!         { "number": "1", "name": "~", "type": "passive" },
//!         { "number": "2", "name": "~", "type": "passive" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NetlistError, NetlistResult};

/// Category shared by both built-in templates.
pub const CONNECTOR_CATEGORY: &str = "Connector";

/// 40-pin Raspberry Pi 2/3 GPIO header.
pub const RPI_HEADER_NAME: &str = "Raspberry_Pi_2_3";

/// USB 2.0 only USB-C receptacle.
pub const USB_C_RECEPTACLE_NAME: &str = "USB_C_Receptacle_USB2.0";

/// Electrical type of a pin.
///
/// Serialised using the `KiCad` netlist spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    /// Input.
    Input,
    /// Output.
    Output,
    /// Bidirectional signal.
    Bidirectional,
    /// Tri-state output.
    TriState,
    /// Passive (connector contacts, resistors, ...).
    #[default]
    Passive,
    /// Free pin, no electrical rules.
    Free,
    /// Unspecified.
    Unspecified,
    /// Power input.
    PowerIn,
    /// Power output.
    PowerOut,
    /// Open collector.
    OpenCollector,
    /// Open emitter.
    OpenEmitter,
    /// Not connected.
    NoConnect,
}

impl PinType {
    /// Returns the `KiCad` netlist spelling (`power_in`, `passive`, ...).
    #[must_use]
    pub const fn as_kicad(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Bidirectional => "bidirectional",
            Self::TriState => "tri_state",
            Self::Passive => "passive",
            Self::Free => "free",
            Self::Unspecified => "unspecified",
            Self::PowerIn => "power_in",
            Self::PowerOut => "power_out",
            Self::OpenCollector => "open_collector",
            Self::OpenEmitter => "open_emitter",
            Self::NoConnect => "no_connect",
        }
    }

    /// Short upper-case label used in part descriptions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::Bidirectional => "BIDIR",
            Self::TriState => "TRISTATE",
            Self::Passive => "PASSIVE",
            Self::Free => "FREE",
            Self::Unspecified => "UNSPEC",
            Self::PowerIn => "PWRIN",
            Self::PowerOut => "PWROUT",
            Self::OpenCollector => "OPENCOLL",
            Self::OpenEmitter => "OPENEMIT",
            Self::NoConnect => "NOCONNECT",
        }
    }
}

/// A pin definition within a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinTemplate {
    /// Pin number, unique within the template (e.g. "16", "A6").
    pub number: String,

    /// Pin name (e.g. "GPIO23", "CC1"). Need not be unique.
    pub name: String,

    /// Electrical type.
    #[serde(rename = "type", default)]
    pub electrical_type: PinType,

    /// Alternate names the pin can be referenced by (e.g. "SDA").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl PinTemplate {
    /// Creates a pin definition without aliases.
    #[must_use]
    pub fn new(number: impl Into<String>, name: impl Into<String>, electrical_type: PinType) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            electrical_type,
            aliases: Vec::new(),
        }
    }

    /// Adds an alternate name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartTemplate {
    /// Catalog category (e.g. "Connector").
    pub category: String,

    /// Template name within the category.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Prefix for auto-assigned reference designators (e.g. "J").
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,

    /// Pin definitions, in symbol order.
    pub pins: Vec<PinTemplate>,
}

fn default_reference_prefix() -> String {
    "U".to_string()
}

impl PartTemplate {
    /// Checks that the template can be instantiated.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or reference prefix is empty, or if two
    /// pins share a number.
    pub fn validate(&self) -> NetlistResult<()> {
        let fail = |message: String| {
            Err(NetlistError::invalid_template(
                &self.category,
                &self.name,
                message,
            ))
        };

        if self.category.is_empty() || self.name.is_empty() {
            return fail("category and name must not be empty".to_string());
        }
        if self.reference_prefix.is_empty() {
            return fail("reference prefix must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for pin in &self.pins {
            if pin.number.is_empty() {
                return fail("pin number must not be empty".to_string());
            }
            if !seen.insert(pin.number.as_str()) {
                return fail(format!("duplicate pin number '{}'", pin.number));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PartTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}?)", self.category, self.name, self.reference_prefix)?;
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        for pin in &self.pins {
            write!(
                f,
                "\n    /{}/{}/{}",
                pin.number,
                pin.name,
                pin.electrical_type.label()
            )?;
        }
        Ok(())
    }
}

/// On-disk catalog format.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    parts: Vec<PartTemplate>,
}

/// Collection of part templates, grouped by category.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: IndexMap<String, IndexMap<String, PartTemplate>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in connector templates.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for template in [rpi_header_template(), usb_c_receptacle_template()] {
            catalog
                .categories
                .entry(template.category.clone())
                .or_default()
                .insert(template.name.clone(), template);
        }
        catalog
    }

    /// Adds a template, replacing any existing one with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails validation.
    pub fn insert(&mut self, template: PartTemplate) -> NetlistResult<()> {
        template.validate()?;
        debug!(
            category = %template.category,
            name = %template.name,
            pins = template.pins.len(),
            "Registering part template"
        );
        self.categories
            .entry(template.category.clone())
            .or_default()
            .insert(template.name.clone(), template);
        Ok(())
    }

    /// Looks up a template.
    #[must_use]
    pub fn lookup(&self, category: &str, name: &str) -> Option<&PartTemplate> {
        self.categories.get(category)?.get(name)
    }

    /// Returns the printable form of a template.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownPart`] if the template does not exist.
    pub fn describe(&self, category: &str, name: &str) -> NetlistResult<String> {
        self.lookup(category, name)
            .map(ToString::to_string)
            .ok_or_else(|| NetlistError::unknown_part(category, name))
    }

    /// Returns an iterator over all templates.
    pub fn iter(&self) -> impl Iterator<Item = &PartTemplate> {
        self.categories.values().flat_map(IndexMap::values)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    /// Returns true if the catalog holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds every template from a JSON catalog document.
    ///
    /// `origin` is only used in error messages. Returns the number of
    /// templates added. Nothing is added if any template is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a template is invalid.
    pub fn extend_from_json(&mut self, json: &str, origin: &Path) -> NetlistResult<usize> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| NetlistError::CatalogParse {
                path: origin.to_path_buf(),
                source: e,
            })?;

        for template in &file.parts {
            template.validate()?;
        }

        let count = file.parts.len();
        for template in file.parts {
            self.insert(template)?;
        }
        Ok(count)
    }

    /// Loads a JSON catalog file and adds its templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> NetlistResult<usize> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| NetlistError::file_read(path, e))?;
        let count = self.extend_from_json(&contents, path)?;
        debug!(path = %path.display(), templates = count, "Loaded part catalog");
        Ok(count)
    }
}

fn rpi_header_template() -> PartTemplate {
    use PinType::{Bidirectional, PowerIn};

    // (number, name, type, alternate function)
    const PINS: [(&str, &str, PinType, Option<&str>); 40] = [
        ("1", "3V3", PowerIn, None),
        ("2", "5V", PowerIn, None),
        ("3", "GPIO2", Bidirectional, Some("SDA")),
        ("4", "5V", PowerIn, None),
        ("5", "GPIO3", Bidirectional, Some("SCL")),
        ("6", "GND", PowerIn, None),
        ("7", "GPIO4", Bidirectional, Some("GCLK0")),
        ("8", "GPIO14", Bidirectional, Some("TXD")),
        ("9", "GND", PowerIn, None),
        ("10", "GPIO15", Bidirectional, Some("RXD")),
        ("11", "GPIO17", Bidirectional, None),
        ("12", "GPIO18", Bidirectional, Some("PWM0")),
        ("13", "GPIO27", Bidirectional, None),
        ("14", "GND", PowerIn, None),
        ("15", "GPIO22", Bidirectional, None),
        ("16", "GPIO23", Bidirectional, None),
        ("17", "3V3", PowerIn, None),
        ("18", "GPIO24", Bidirectional, None),
        ("19", "GPIO10", Bidirectional, Some("MOSI0")),
        ("20", "GND", PowerIn, None),
        ("21", "GPIO9", Bidirectional, Some("MISO0")),
        ("22", "GPIO25", Bidirectional, None),
        ("23", "GPIO11", Bidirectional, Some("SCLK0")),
        ("24", "GPIO8", Bidirectional, Some("~CE0")),
        ("25", "GND", PowerIn, None),
        ("26", "GPIO7", Bidirectional, Some("~CE1")),
        ("27", "GPIO0", Bidirectional, Some("ID_SD")),
        ("28", "GPIO1", Bidirectional, Some("ID_SC")),
        ("29", "GPIO5", Bidirectional, Some("GCLK1")),
        ("30", "GND", PowerIn, None),
        ("31", "GPIO6", Bidirectional, Some("GCLK2")),
        ("32", "GPIO12", Bidirectional, Some("PWM0")),
        ("33", "GPIO13", Bidirectional, Some("PWM1")),
        ("34", "GND", PowerIn, None),
        ("35", "GPIO19", Bidirectional, Some("MISO1")),
        ("36", "GPIO16", Bidirectional, None),
        ("37", "GPIO26", Bidirectional, None),
        ("38", "GPIO20", Bidirectional, Some("MOSI1")),
        ("39", "GND", PowerIn, None),
        ("40", "GPIO21", Bidirectional, Some("SCLK1")),
    ];

    let pins = PINS
        .iter()
        .map(|&(number, name, electrical_type, alias)| {
            let pin = PinTemplate::new(number, name, electrical_type);
            match alias {
                Some(alias) => pin.with_alias(alias),
                None => pin,
            }
        })
        .collect();

    PartTemplate {
        category: CONNECTOR_CATEGORY.to_string(),
        name: RPI_HEADER_NAME.to_string(),
        description: "Expansion header for Raspberry Pi 2 & 3".to_string(),
        reference_prefix: "J".to_string(),
        pins,
    }
}

fn usb_c_receptacle_template() -> PartTemplate {
    use PinType::{Bidirectional, Passive};

    const PINS: [(&str, &str, PinType); 17] = [
        ("A1", "GND", Passive),
        ("A4", "VBUS", Passive),
        ("A5", "CC1", Bidirectional),
        ("A6", "D+", Bidirectional),
        ("A7", "D-", Bidirectional),
        ("A8", "SBU1", Bidirectional),
        ("A9", "VBUS", Passive),
        ("A12", "GND", Passive),
        ("B1", "GND", Passive),
        ("B4", "VBUS", Passive),
        ("B5", "CC2", Bidirectional),
        ("B6", "D+", Bidirectional),
        ("B7", "D-", Bidirectional),
        ("B8", "SBU2", Bidirectional),
        ("B9", "VBUS", Passive),
        ("B12", "GND", Passive),
        ("S1", "SHIELD", Passive),
    ];

    PartTemplate {
        category: CONNECTOR_CATEGORY.to_string(),
        name: USB_C_RECEPTACLE_NAME.to_string(),
        description: "USB 2.0-only Type-C Receptacle connector".to_string(),
        reference_prefix: "J".to_string(),
        pins: PINS
            .iter()
            .map(|&(number, name, electrical_type)| PinTemplate::new(number, name, electrical_type))
            .collect(),
    }
}
