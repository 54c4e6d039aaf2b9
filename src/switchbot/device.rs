use std::fmt;

use macaddr::MacAddr6;

/// A SwitchBot Curtain motor addressed over BLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurtainTarget {
    pub address: MacAddr6,

    pub name: String,
}

impl CurtainTarget {
    pub fn new(name: impl Into<String>, address: MacAddr6) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }
}

impl fmt::Display for CurtainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}
