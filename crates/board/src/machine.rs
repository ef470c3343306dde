//! Machine table.
//!
//! Each supported board is a [`MachineDescriptor`] in an explicit table. The
//! embedding firmware selects one against the device tree's root compatible
//! list and then drives bring-up itself; nothing is registered through
//! linker sections.

/// A supported machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineDescriptor {
    /// Human-readable machine name.
    pub name: &'static str,
    /// Root compatible strings this machine handles.
    pub dt_compat: &'static [&'static str],
}

impl MachineDescriptor {
    /// Whether `compatible` names this machine.
    pub fn matches(&self, compatible: &str) -> bool {
        self.dt_compat.contains(&compatible)
    }
}

/// Freescale i.MX6 SoloLite.
pub const IMX6SL: MachineDescriptor = MachineDescriptor {
    name: "Freescale i.MX6 SoloLite (Device Tree)",
    dt_compat: &["fsl,imx6sl"],
};

/// Every machine this crate can bring up.
pub const MACHINES: &[MachineDescriptor] = &[IMX6SL];

/// Pick the machine for a device-tree root.
///
/// `root_compatible` is ordered most specific first; the first entry any
/// machine claims wins.
pub fn select_machine<'a>(
    table: &'a [MachineDescriptor],
    root_compatible: &[&str],
) -> Option<&'a MachineDescriptor> {
    root_compatible
        .iter()
        .find_map(|compat| table.iter().find(|m| m.matches(compat)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OTHER: MachineDescriptor = MachineDescriptor {
        name: "Other",
        dt_compat: &["vendor,board", "fsl,imx6sl-evk"],
    };

    #[test]
    fn selects_imx6sl_from_generic_root() {
        let machine = select_machine(MACHINES, &["remarkable,zero-gravitas", "fsl,imx6sl"]);
        assert_eq!(machine, Some(&IMX6SL));
    }

    #[test]
    fn most_specific_compatible_wins() {
        let table = [IMX6SL, OTHER];
        let machine = select_machine(&table, &["fsl,imx6sl-evk", "fsl,imx6sl"]);
        assert_eq!(machine.map(|m| m.name), Some("Other"));
    }

    #[test]
    fn unknown_root_selects_nothing() {
        assert_eq!(select_machine(MACHINES, &["fsl,imx6q"]), None);
        assert_eq!(select_machine(MACHINES, &[]), None);
    }
}
