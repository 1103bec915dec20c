//! The generated netlist and its serialisations.
//!
//! Three formats are supported:
//!
//! - [`OutputFormat::Kicad`]: `KiCad` netlist export (s-expression, version E)
//! - [`OutputFormat::Json`]: pretty-printed JSON of [`Netlist`]
//! - [`OutputFormat::Csv`]: one row per net member (`net,reference,pin,pin_name`)

use std::fmt::{self, Write as _};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::PinType;
use super::{NetlistError, NetlistResult};

/// Netlist serialisation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `KiCad` s-expression netlist.
    #[default]
    Kicad,
    /// JSON document.
    Json,
    /// CSV wire list.
    Csv,
}

impl OutputFormat {
    /// Format name as accepted on the command line and in the config file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kicad => "kicad",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Reference designator.
    pub reference: String,
    /// Template name, used as the component value.
    pub value: String,
    /// Footprint identifier.
    pub footprint: String,
    /// Catalog category the template came from.
    pub library: String,
    /// Template description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A net member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Reference designator of the part.
    pub reference: String,
    /// Pin number.
    pub pin: String,
    /// Pin name.
    pub pin_function: String,
    /// Electrical type of the pin.
    pub pin_type: PinType,
}

/// A net and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetEntry {
    /// 1-based net code, in declaration order.
    pub code: usize,
    /// Net name.
    pub name: String,
    /// Member pins, without duplicates.
    pub nodes: Vec<Node>,
}

impl NetEntry {
    /// Returns true if the given pin is a member.
    #[must_use]
    pub fn contains(&self, reference: &str, pin: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.reference == reference && node.pin == pin)
    }

    /// Returns the members as `(reference, pin)` pairs.
    pub fn pins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .iter()
            .map(|node| (node.reference.as_str(), node.pin.as_str()))
    }

    /// A net with fewer than two members connects nothing.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.nodes.len() < 2
    }
}

/// Immutable snapshot of a design's connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    /// Name of the design the netlist was generated from.
    pub source: String,
    /// Generation time (`%Y-%m-%d %H:%M:%S`, local time).
    pub date: String,
    /// Tool name and version.
    pub tool: String,
    /// Components, in declaration order.
    pub components: Vec<Component>,
    /// Nets, in declaration order.
    pub nets: Vec<NetEntry>,
}

impl Netlist {
    pub(crate) fn new(source: String, components: Vec<Component>, nets: Vec<NetEntry>) -> Self {
        Self {
            source,
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            tool: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string(),
            components,
            nets,
        }
    }

    /// Looks up a net by name.
    #[must_use]
    pub fn net(&self, name: &str) -> Option<&NetEntry> {
        self.nets.iter().find(|net| net.name == name)
    }

    /// Looks up a component by reference designator.
    #[must_use]
    pub fn component(&self, reference: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| component.reference == reference)
    }

    /// Returns the number of nets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// Returns true if no net was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Nets with fewer than two members.
    pub fn degenerate_nets(&self) -> impl Iterator<Item = &NetEntry> {
        self.nets.iter().filter(|net| net.is_degenerate())
    }

    /// Renders the netlist in the requested format.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::Serialise`] if the serialiser fails.
    pub fn render(&self, format: OutputFormat) -> NetlistResult<String> {
        match format {
            OutputFormat::Kicad => Ok(self.to_kicad()),
            OutputFormat::Json => self.to_json(),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    /// Renders and writes the netlist.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write<W: Write>(&self, format: OutputFormat, mut writer: W) -> NetlistResult<()> {
        let text = self.render(format)?;
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| NetlistError::file_write("<stream>", e))
    }

    /// Renders the netlist and saves it to a file.
    ///
    /// The file is only created once rendering has succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn save(&self, format: OutputFormat, path: impl AsRef<Path>) -> NetlistResult<()> {
        let path = path.as_ref();
        let text = self.render(format)?;
        std::fs::write(path, text)
            .map_err(|e| NetlistError::file_write(path.display().to_string(), e))?;
        info!(path = %path.display(), %format, "Netlist written");
        Ok(())
    }

    /// Renders the `KiCad` s-expression netlist.
    #[must_use]
    pub fn to_kicad(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_kicad(&mut out);
        out
    }

    fn write_kicad(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "(export (version \"E\")")?;
        writeln!(out, "  (design")?;
        writeln!(out, "    (source {})", quote(&self.source))?;
        writeln!(out, "    (date {})", quote(&self.date))?;
        writeln!(out, "    (tool {}))", quote(&self.tool))?;

        write!(out, "  (components")?;
        for comp in &self.components {
            write!(out, "\n    (comp (ref {})", quote(&comp.reference))?;
            write!(out, "\n      (value {})", quote(&comp.value))?;
            write!(out, "\n      (footprint {})", quote(&comp.footprint))?;
            if !comp.description.is_empty() {
                write!(out, "\n      (description {})", quote(&comp.description))?;
            }
            write!(
                out,
                "\n      (libsource (lib {}) (part {}) (description {})))",
                quote(&comp.library),
                quote(&comp.value),
                quote(&comp.description)
            )?;
        }
        writeln!(out, ")")?;

        write!(out, "  (nets")?;
        for net in &self.nets {
            write!(
                out,
                "\n    (net (code {}) (name {})",
                quote(&net.code.to_string()),
                quote(&net.name)
            )?;
            for node in &net.nodes {
                write!(
                    out,
                    "\n      (node (ref {}) (pin {}) (pinfunction {}) (pintype {}))",
                    quote(&node.reference),
                    quote(&node.pin),
                    quote(&node.pin_function),
                    quote(node.pin_type.as_kicad())
                )?;
            }
            write!(out, ")")?;
        }
        writeln!(out, "))")
    }

    /// Renders the netlist as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::Serialise`] if serialisation fails.
    pub fn to_json(&self) -> NetlistResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NetlistError::Serialise {
            format: OutputFormat::Json.name(),
            message: e.to_string(),
        })
    }

    /// Renders the netlist as a CSV wire list.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::Serialise`] if serialisation fails.
    pub fn to_csv(&self) -> NetlistResult<String> {
        let fail = |message: String| NetlistError::Serialise {
            format: OutputFormat::Csv.name(),
            message,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["net", "reference", "pin", "pin_name"])
            .map_err(|e| fail(e.to_string()))?;
        for net in &self.nets {
            for node in &net.nodes {
                writer
                    .write_record([
                        net.name.as_str(),
                        node.reference.as_str(),
                        node.pin.as_str(),
                        node.pin_function.as_str(),
                    ])
                    .map_err(|e| fail(e.to_string()))?;
            }
        }

        let bytes = writer.into_inner().map_err(|e| fail(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| fail(e.to_string()))
    }
}

/// Quotes a string for an s-expression, escaping backslashes and quotes.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Netlist {
        let node = |reference: &str, pin: &str, function: &str| Node {
            reference: reference.to_string(),
            pin: pin.to_string(),
            pin_function: function.to_string(),
            pin_type: PinType::Passive,
        };
        Netlist::new(
            "sample".to_string(),
            vec![Component {
                reference: "J1".to_string(),
                value: "USB_C_Receptacle_USB2.0".to_string(),
                footprint: "USB_C_Receptacle_GCT_USB4085".to_string(),
                library: "Connector".to_string(),
                description: String::new(),
            }],
            vec![
                NetEntry {
                    code: 1,
                    name: "GND".to_string(),
                    nodes: vec![node("J1", "A1", "GND"), node("J2", "A1", "GND")],
                },
                NetEntry {
                    code: 2,
                    name: "SPARE".to_string(),
                    nodes: vec![node("J1", "S1", "SHIELD")],
                },
            ],
        )
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn kicad_output_structure() {
        let text = sample().to_kicad();
        assert!(text.starts_with("(export (version \"E\")"));
        assert!(text.contains("(source \"sample\")"));
        assert!(text.contains("(comp (ref \"J1\")"));
        assert!(text.contains("(footprint \"USB_C_Receptacle_GCT_USB4085\")"));
        assert!(text.contains("(net (code \"1\") (name \"GND\")"));
        assert!(text.contains(
            "(node (ref \"J2\") (pin \"A1\") (pinfunction \"GND\") (pintype \"passive\"))"
        ));

        let opens = text.matches('(').count();
        let closes = text.matches(')').count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn csv_output_has_one_row_per_node() {
        let text = sample().to_csv().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "net,reference,pin,pin_name");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "SPARE,J1,S1,SHIELD");
    }

    #[test]
    fn json_round_trips() {
        let netlist = sample();
        let json = netlist.to_json().unwrap();
        let parsed: Netlist = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, netlist);
        assert!(json.contains("\"pin_type\": \"passive\""));
    }

    #[test]
    fn lookup_and_degenerate() {
        let netlist = sample();
        assert_eq!(netlist.len(), 2);
        assert!(netlist.net("GND").unwrap().contains("J2", "A1"));
        assert!(!netlist.net("GND").unwrap().contains("J2", "B1"));
        assert!(netlist.net("VCC").is_none());
        assert!(netlist.component("J1").is_some());

        let degenerate: Vec<&str> = netlist
            .degenerate_nets()
            .map(|net| net.name.as_str())
            .collect();
        assert_eq!(degenerate, vec!["SPARE"]);
    }

    #[test]
    fn write_to_stream() {
        let mut buffer = Vec::new();
        sample().write(OutputFormat::Csv, &mut buffer).unwrap();
        assert!(String::from_utf8(buffer)
            .unwrap()
            .starts_with("net,reference"));
    }
}
