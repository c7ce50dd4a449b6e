#![allow(dead_code)]

use packfold::{Archivable, InheritPacker, PackerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A world position, stored as a nested record.
#[derive(Archivable, Debug, Default, Clone, PartialEq)]
pub struct Location {
    #[archive]
    pub world: String,
    #[archive]
    pub x: f64,
    #[archive]
    pub y: f64,
    #[archive]
    pub z: f64,
}

/// The shared ancestor of every permission node.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub node: String,
}

/// A leaf permission that is persisted through `Permission`'s packer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildPermission {
    pub node: String,
}

impl InheritPacker for BuildPermission {
    type Ancestor = Permission;

    fn to_ancestor(&self) -> Permission {
        Permission {
            node: self.node.clone(),
        }
    }

    fn from_ancestor(ancestor: Permission) -> Option<Self> {
        ancestor
            .node
            .starts_with("town.build")
            .then_some(BuildPermission {
                node: ancestor.node,
            })
    }
}

/// A second leaf sharing `Permission`'s packer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClaimPermission {
    pub node: String,
}

impl InheritPacker for ClaimPermission {
    type Ancestor = Permission;

    fn to_ancestor(&self) -> Permission {
        Permission {
            node: self.node.clone(),
        }
    }

    fn from_ancestor(ancestor: Permission) -> Option<Self> {
        Some(ClaimPermission {
            node: ancestor.node,
        })
    }
}

#[derive(Archivable, Debug, Default, Clone, PartialEq)]
pub struct Rank {
    #[archive]
    pub name: String,
    #[archive]
    pub prefix: Option<String>,
    #[archive]
    pub permissions: Vec<Permission>,
}

#[derive(Archivable, Debug, Default, Clone, PartialEq)]
#[archive(name = "OwnerRank")]
pub struct OwnerRank {
    #[archive(base)]
    pub rank: Rank,
    #[archive]
    pub transferable: bool,
}

#[derive(Archivable, Debug, Default, Clone, PartialEq)]
pub struct Town {
    #[archive]
    pub name: String,
    #[archive]
    pub mayor: Option<String>,
    #[archive]
    pub balance: f64,
    #[archive]
    pub open: bool,
    #[archive]
    pub plots: HashMap<String, i32>,
    #[archive]
    pub spawn: Option<Location>,
    #[archive]
    pub residents: Vec<String>,
    #[archive]
    pub build: BuildPermission,
    #[archive]
    pub ranks: BTreeMap<String, Rank>,
    #[archive]
    pub claim: ClaimPermission,
    #[archive]
    pub claims: Vec<ClaimPermission>,
    /// Runtime only.
    pub online: u32,
}

pub fn registry() -> packfold::Result<PackerRegistry> {
    PackerRegistry::builder()
        .with_primitives()
        .primitive::<Permission>("permission")
        .inherit::<BuildPermission>()
        .inherit::<ClaimPermission>()
        .record::<Location>()
        .record::<Rank>()
        .map::<String, i32>()
        .ordered_map::<String, Rank>()
        .list::<String>()
        .list::<Permission>()
        .list::<ClaimPermission>()
        .build()
}

pub fn sample_town() -> Town {
    let mut town = Town {
        name: "Spawn".into(),
        mayor: Some("alice".into()),
        balance: 1250.75,
        open: true,
        spawn: Some(Location {
            world: "overworld".into(),
            x: 10.5,
            y: 64.0,
            z: -3.25,
        }),
        residents: vec!["alice".into(), "bob".into()],
        build: BuildPermission {
            node: "town.build.place".into(),
        },
        claim: ClaimPermission {
            node: "town.claim.outpost".into(),
        },
        claims: vec![
            ClaimPermission {
                node: "town.claim".into(),
            },
            ClaimPermission {
                node: "town.unclaim".into(),
            },
        ],
        online: 7,
        ..Town::default()
    };
    town.plots.insert("0,0".into(), 1);
    town.plots.insert("0,1".into(), 2);
    town.ranks.insert(
        "assistant".into(),
        Rank {
            name: "assistant".into(),
            prefix: None,
            permissions: vec![Permission {
                node: "town.invite".into(),
            }],
        },
    );
    town
}
