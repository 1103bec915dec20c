//! Connectivity declaration.
//!
//! A [`Design`] is the registry for one declaration session. Parts and nets
//! are declared into it and addressed afterwards by the copyable handles
//! [`PartId`] and [`NetId`]:
//!
//! ```
//! use hat_netlist::netlist::{Catalog, Design};
//!
//! let mut design = Design::new("example", Catalog::builtin());
//! let usb_in = design
//!     .declare_part("Connector", "USB_C_Receptacle_USB2.0", "USB_C_Receptacle_GCT_USB4085")
//!     .unwrap();
//! let usb_out = design
//!     .declare_part("Connector", "USB_C_Receptacle_USB2.0", "USB_C_Receptacle_GCT_USB4085")
//!     .unwrap();
//!
//! let gnd = design.declare_net("GND").unwrap();
//! design.connect([(usb_in, "A1"), (usb_out, "A1")], gnd).unwrap();
//!
//! let netlist = design.generate_netlist();
//! assert_eq!(netlist.net("GND").unwrap().nodes.len(), 2);
//! ```
//!
//! # Connection semantics
//!
//! [`Design::connect`] is an N-ary join: every listed pin becomes a member of
//! the net. Repeating a `(pin, net)` pair is a no-op. A pin belongs to at most
//! one net, so connecting a pin that is already on a different net fails with
//! [`NetlistError::PinConflict`]. A failing call leaves the design unchanged.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use super::catalog::{Catalog, PartTemplate, PinType};
use super::output::{Component, NetEntry, Netlist, Node};
use super::{NetlistError, NetlistResult};

/// Handle to a part declared in a [`Design`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(usize);

impl PartId {
    /// Returns the declaration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle to a net declared in a [`Design`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(usize);

impl NetId {
    /// Returns the declaration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifies one pin of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PinKey {
    part: PartId,
    pin: usize,
}

/// A pin on a declared part.
#[derive(Debug, Clone)]
pub struct Pin {
    number: String,
    name: String,
    electrical_type: PinType,
    aliases: Vec<String>,
    net: Option<NetId>,
}

impl Pin {
    /// Pin number, unique within the part.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Pin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Electrical type.
    #[must_use]
    pub const fn electrical_type(&self) -> PinType {
        self.electrical_type
    }

    /// Alternate names.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Net the pin is connected to, if any.
    #[must_use]
    pub const fn net(&self) -> Option<NetId> {
        self.net
    }
}

/// A physical component instance.
#[derive(Debug, Clone)]
pub struct Part {
    reference: String,
    category: String,
    type_name: String,
    footprint: String,
    description: String,
    pins: Vec<Pin>,
}

impl Part {
    fn from_template(template: &PartTemplate, reference: String, footprint: &str) -> Self {
        let pins = template
            .pins
            .iter()
            .map(|pin| Pin {
                number: pin.number.clone(),
                name: pin.name.clone(),
                electrical_type: pin.electrical_type,
                aliases: pin.aliases.clone(),
                net: None,
            })
            .collect();

        Self {
            reference,
            category: template.category.clone(),
            type_name: template.name.clone(),
            footprint: footprint.to_string(),
            description: template.description.clone(),
            pins,
        }
    }

    /// Reference designator (e.g. "J1").
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Catalog category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Catalog template name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Footprint identifier.
    #[must_use]
    pub fn footprint(&self) -> &str {
        &self.footprint
    }

    /// All pins, in template order.
    #[must_use]
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Resolves a pin reference to an index into [`Part::pins`].
    ///
    /// The key is matched against pin numbers first, then pin names, then
    /// aliases.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::InvalidPin`] if nothing matches, or
    /// [`NetlistError::AmbiguousPin`] if a name matches several pins.
    pub fn resolve_pin(&self, key: &str) -> NetlistResult<usize> {
        if let Some(index) = self.pins.iter().position(|pin| pin.number == key) {
            return Ok(index);
        }

        let mut matches: Vec<usize> = self.matching(|pin| pin.name == key);
        if matches.is_empty() {
            matches = self.matching(|pin| pin.aliases.iter().any(|alias| alias == key));
        }

        match matches.as_slice() {
            [] => Err(NetlistError::invalid_pin(&self.reference, key)),
            [index] => Ok(*index),
            _ => Err(NetlistError::AmbiguousPin {
                reference: self.reference.clone(),
                pin: key.to_string(),
                candidates: matches
                    .iter()
                    .map(|&index| self.pins[index].number.clone())
                    .collect(),
            }),
        }
    }

    fn matching(&self, predicate: impl Fn(&Pin) -> bool) -> Vec<usize> {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pin)| predicate(pin))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A named set of electrically common pins.
#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    members: IndexSet<PinKey>,
}

impl Net {
    /// Net name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of member pins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if no pin has been connected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Registry of the parts and nets of one design.
#[derive(Debug, Clone)]
pub struct Design {
    name: String,
    catalog: Catalog,
    parts: IndexMap<String, Part>,
    nets: IndexMap<String, Net>,
}

impl Design {
    /// Creates an empty design whose parts come from `catalog`.
    #[must_use]
    pub fn new(name: impl Into<String>, catalog: Catalog) -> Self {
        Self {
            name: name.into(),
            catalog,
            parts: IndexMap::new(),
            nets: IndexMap::new(),
        }
    }

    /// Design name, used as the netlist source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The catalog parts are instantiated from.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Declares a part with the next free reference designator for its
    /// template prefix (`J1`, `J2`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownPart`] if the catalog has no such template.
    pub fn declare_part(
        &mut self,
        category: &str,
        type_name: &str,
        footprint: &str,
    ) -> NetlistResult<PartId> {
        let template = self.template(category, type_name)?;
        let reference = self.next_reference(&template.reference_prefix);
        let part = Part::from_template(template, reference, footprint);
        Ok(self.insert_part(part))
    }

    /// Declares a part with an explicit reference designator.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unknown or the designator is
    /// already taken.
    pub fn declare_part_with_reference(
        &mut self,
        category: &str,
        type_name: &str,
        footprint: &str,
        reference: &str,
    ) -> NetlistResult<PartId> {
        if self.parts.contains_key(reference) {
            return Err(NetlistError::DuplicateReference {
                reference: reference.to_string(),
            });
        }
        let template = self.template(category, type_name)?;
        let part = Part::from_template(template, reference.to_string(), footprint);
        Ok(self.insert_part(part))
    }

    fn template(&self, category: &str, type_name: &str) -> NetlistResult<&PartTemplate> {
        self.catalog
            .lookup(category, type_name)
            .ok_or_else(|| NetlistError::unknown_part(category, type_name))
    }

    fn next_reference(&self, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|candidate| !self.parts.contains_key(candidate))
            .unwrap_or_else(|| prefix.to_string())
    }

    fn insert_part(&mut self, part: Part) -> PartId {
        debug!(
            reference = %part.reference,
            part = %format!("{}/{}", part.category, part.type_name),
            footprint = %part.footprint,
            "Declared part"
        );
        let (index, _) = self.parts.insert_full(part.reference.clone(), part);
        PartId(index)
    }

    /// Declares an empty net.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or already declared.
    pub fn declare_net(&mut self, name: &str) -> NetlistResult<NetId> {
        if name.trim().is_empty() {
            return Err(NetlistError::InvalidNetName {
                name: name.to_string(),
            });
        }
        if self.nets.contains_key(name) {
            return Err(NetlistError::DuplicateNet {
                name: name.to_string(),
            });
        }

        let net = Net {
            name: name.to_string(),
            members: IndexSet::new(),
        };
        let (index, _) = self.nets.insert_full(name.to_string(), net);
        debug!(net = name, "Declared net");
        Ok(NetId(index))
    }

    /// Makes every listed pin a member of `net`.
    ///
    /// Pins are given as `(part, pin)` pairs where `pin` is a pin number,
    /// name or alias.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale, a pin does not resolve, or a pin
    /// is already on another net. No pin is connected in that case.
    pub fn connect<'a, I>(&mut self, pins: I, net: NetId) -> NetlistResult<()>
    where
        I: IntoIterator<Item = (PartId, &'a str)>,
    {
        let net_name = self.net(net)?.name.clone();

        let mut resolved = Vec::new();
        for (part_id, key) in pins {
            let part = self.part(part_id)?;
            let index = part.resolve_pin(key)?;
            if let Some(existing) = part.pins[index].net {
                if existing != net {
                    return Err(NetlistError::PinConflict {
                        reference: part.reference.clone(),
                        pin: part.pins[index].number.clone(),
                        existing: self.nets[existing.0].name.clone(),
                        requested: net_name,
                    });
                }
            }
            resolved.push(PinKey {
                part: part_id,
                pin: index,
            });
        }

        let mut added = 0;
        for key in resolved {
            self.parts[key.part.0].pins[key.pin].net = Some(net);
            if self.nets[net.0].members.insert(key) {
                added += 1;
            }
        }

        debug!(
            net = %net_name,
            added,
            members = self.nets[net.0].members.len(),
            "Connected pins"
        );
        Ok(())
    }

    /// Returns a declared part.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownPartHandle`] for handles from another design.
    pub fn part(&self, id: PartId) -> NetlistResult<&Part> {
        self.parts
            .get_index(id.0)
            .map(|(_, part)| part)
            .ok_or(NetlistError::UnknownPartHandle { index: id.0 })
    }

    /// Returns a declared net.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownNetHandle`] for handles from another design.
    pub fn net(&self, id: NetId) -> NetlistResult<&Net> {
        self.nets
            .get_index(id.0)
            .map(|(_, net)| net)
            .ok_or(NetlistError::UnknownNetHandle { index: id.0 })
    }

    /// Looks up a net handle by name.
    #[must_use]
    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.nets.get_index_of(name).map(NetId)
    }

    /// Looks up a part handle by reference designator.
    #[must_use]
    pub fn part_by_reference(&self, reference: &str) -> Option<PartId> {
        self.parts.get_index_of(reference).map(PartId)
    }

    /// Returns the net a pin is connected to, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the pin does not resolve.
    pub fn net_of(&self, part: PartId, pin: &str) -> NetlistResult<Option<&Net>> {
        let part = self.part(part)?;
        let index = part.resolve_pin(pin)?;
        part.pins[index].net.map(|id| self.net(id)).transpose()
    }

    /// Number of declared parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Number of declared nets.
    #[must_use]
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Snapshots the current connectivity.
    ///
    /// Nets appear in declaration order with members in connection order.
    /// Calling this before all connections are made yields an incomplete but
    /// valid netlist.
    #[must_use]
    pub fn generate_netlist(&self) -> Netlist {
        let components = self
            .parts
            .values()
            .map(|part| Component {
                reference: part.reference.clone(),
                value: part.type_name.clone(),
                footprint: part.footprint.clone(),
                library: part.category.clone(),
                description: part.description.clone(),
            })
            .collect();

        let nets = self
            .nets
            .values()
            .enumerate()
            .map(|(index, net)| NetEntry {
                code: index + 1,
                name: net.name.clone(),
                nodes: net.members.iter().map(|key| self.node(*key)).collect(),
            })
            .collect();

        let netlist = Netlist::new(self.name.clone(), components, nets);

        for net in netlist.degenerate_nets() {
            warn!(
                net = %net.name,
                members = net.nodes.len(),
                "Net has fewer than two pins"
            );
        }
        info!(
            design = %self.name,
            parts = netlist.components.len(),
            nets = netlist.nets.len(),
            "Generated netlist"
        );

        netlist
    }

    fn node(&self, key: PinKey) -> Node {
        let part = &self.parts[key.part.0];
        let pin = &part.pins[key.pin];
        Node {
            reference: part.reference.clone(),
            pin: pin.number.clone(),
            pin_function: pin.name.clone(),
            pin_type: pin.electrical_type,
        }
    }
}
