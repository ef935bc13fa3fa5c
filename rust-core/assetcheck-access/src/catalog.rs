// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! The permission catalog.
//!
//! A closed, versioned list of actions. Declaration order of [`Action`] is
//! catalog order: normalized permission sets, API listings and group tables
//! all follow it. `allAccess` comes first and belongs to no group; every
//! other action belongs to exactly one [`Group`].
//!
//! Adding, removing or renaming an action is a catalog change and must bump
//! [`CATALOG_VERSION`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AccessError;

/// Version of the action list and grouping below.
pub const CATALOG_VERSION: u32 = 1;

/// A permission-gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    AllAccess,
    DashboardView,
    DashboardEdit,
    MastersView,
    MastersEdit,
    LocationView,
    LocationEdit,
    StateView,
    StateEdit,
    CityView,
    CityEdit,
    AreaView,
    AreaEdit,
    DepartmentView,
    DepartmentEdit,
    BuildingView,
    BuildingEdit,
    FloorView,
    FloorEdit,
    RoleView,
    RoleEdit,
    UserMasterView,
    UserMasterEdit,
    AssetMasterView,
    AssetMasterEdit,
    AuditReportView,
    AuditReportEdit,
    GenerateQrCode,
}

impl Action {
    /// Number of actions in the catalog.
    pub const COUNT: usize = 28;

    /// Every action, in catalog order.
    pub const ALL: [Action; Action::COUNT] = [
        Action::AllAccess,
        Action::DashboardView,
        Action::DashboardEdit,
        Action::MastersView,
        Action::MastersEdit,
        Action::LocationView,
        Action::LocationEdit,
        Action::StateView,
        Action::StateEdit,
        Action::CityView,
        Action::CityEdit,
        Action::AreaView,
        Action::AreaEdit,
        Action::DepartmentView,
        Action::DepartmentEdit,
        Action::BuildingView,
        Action::BuildingEdit,
        Action::FloorView,
        Action::FloorEdit,
        Action::RoleView,
        Action::RoleEdit,
        Action::UserMasterView,
        Action::UserMasterEdit,
        Action::AssetMasterView,
        Action::AssetMasterEdit,
        Action::AuditReportView,
        Action::AuditReportEdit,
        Action::GenerateQrCode,
    ];

    /// Canonical wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::AllAccess => "allAccess",
            Action::DashboardView => "dashboard:view",
            Action::DashboardEdit => "dashboard:edit",
            Action::MastersView => "masters:view",
            Action::MastersEdit => "masters:edit",
            Action::LocationView => "location:view",
            Action::LocationEdit => "location:edit",
            Action::StateView => "state:view",
            Action::StateEdit => "state:edit",
            Action::CityView => "city:view",
            Action::CityEdit => "city:edit",
            Action::AreaView => "area:view",
            Action::AreaEdit => "area:edit",
            Action::DepartmentView => "department:view",
            Action::DepartmentEdit => "department:edit",
            Action::BuildingView => "building:view",
            Action::BuildingEdit => "building:edit",
            Action::FloorView => "floor:view",
            Action::FloorEdit => "floor:edit",
            Action::RoleView => "role:view",
            Action::RoleEdit => "role:edit",
            Action::UserMasterView => "userMaster:view",
            Action::UserMasterEdit => "userMaster:edit",
            Action::AssetMasterView => "assetMaster:view",
            Action::AssetMasterEdit => "assetMaster:edit",
            Action::AuditReportView => "auditReport:view",
            Action::AuditReportEdit => "auditReport:edit",
            Action::GenerateQrCode => "generateQrCode",
        }
    }

    /// Position of this action in catalog order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Every action except `allAccess`, in catalog order.
    pub fn grantable() -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(|a| *a != Action::AllAccess)
    }

    /// The group this action belongs to (`None` for `allAccess`).
    pub fn group(self) -> Option<&'static Group> {
        GROUPS.iter().find(|g| g.contains(self))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AccessError::UnknownAction(s.to_string()))
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A named cluster of actions shown and bulk-edited together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: &'static str,
    pub actions: &'static [Action],
}

impl Group {
    pub fn contains(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// Look a group up by its display name.
    pub fn by_name(name: &str) -> Result<&'static Group, AccessError> {
        GROUPS
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| AccessError::UnknownGroup(name.to_string()))
    }
}

/// Catalog groups, in display order.
pub const GROUPS: &[Group] = &[
    Group {
        name: "Dashboard",
        actions: &[Action::DashboardView, Action::DashboardEdit],
    },
    Group {
        name: "Masters",
        actions: &[Action::MastersView, Action::MastersEdit],
    },
    Group {
        name: "Location Master",
        actions: &[Action::LocationView, Action::LocationEdit],
    },
    Group {
        name: "State Master",
        actions: &[Action::StateView, Action::StateEdit],
    },
    Group {
        name: "City Master",
        actions: &[Action::CityView, Action::CityEdit],
    },
    Group {
        name: "Area Master",
        actions: &[Action::AreaView, Action::AreaEdit],
    },
    Group {
        name: "Department Master",
        actions: &[Action::DepartmentView, Action::DepartmentEdit],
    },
    Group {
        name: "Building Master",
        actions: &[Action::BuildingView, Action::BuildingEdit],
    },
    Group {
        name: "Floor Master",
        actions: &[Action::FloorView, Action::FloorEdit],
    },
    Group {
        name: "Role Master",
        actions: &[Action::RoleView, Action::RoleEdit],
    },
    Group {
        name: "User Master",
        actions: &[Action::UserMasterView, Action::UserMasterEdit],
    },
    Group {
        name: "Asset Master",
        actions: &[Action::AssetMasterView, Action::AssetMasterEdit],
    },
    Group {
        name: "Audit Reports",
        actions: &[Action::AuditReportView, Action::AuditReportEdit],
    },
    Group {
        name: "QR Codes",
        actions: &[Action::GenerateQrCode],
    },
];
