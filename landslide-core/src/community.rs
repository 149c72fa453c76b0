//! Static registry of the communities the backend publishes risk data for.

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::Serialize;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommunityId {
    Craig,
    Kasaan,
}

impl CommunityId {
    /// Code used in routes and in the backend URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunityId::Craig => "AK91",
            CommunityId::Kasaan => "AK182",
        }
    }

    pub const fn all() -> &'static [CommunityId] {
        &[CommunityId::Craig, CommunityId::Kasaan]
    }

    pub fn location(&self) -> &'static CommunityLocation {
        match self {
            CommunityId::Craig => &CRAIG,
            CommunityId::Kasaan => &KASAAN,
        }
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CommunityId {
    type Error = ValidationError;

    /// Exact, case-sensitive match on the community code.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        CommunityId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| ValidationError(value.to_string()))
    }
}

impl FromStr for CommunityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommunityId::try_from(s)
    }
}

/// Where a community sits on the map and how it is labelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityLocation {
    pub id: CommunityId,
    pub name: &'static str,
    pub display_name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

impl CommunityLocation {
    pub fn map_view(&self) -> MapView {
        MapView { lat: self.lat, lng: self.lng, zoom: self.zoom }
    }
}

/// Center and zoom handed to the map adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

static CRAIG: CommunityLocation = CommunityLocation {
    id: CommunityId::Craig,
    name: "Craig",
    display_name: "Craig (Sháan Séet)",
    lat: 55.476389,
    lng: -133.147778,
    zoom: 13,
};

static KASAAN: CommunityLocation = CommunityLocation {
    id: CommunityId::Kasaan,
    name: "Kasaan",
    display_name: "Kasaan (Gasa'áan)",
    lat: 55.541667,
    lng: -132.401944,
    zoom: 13,
};

pub fn resolve(id: &str) -> Option<&'static CommunityLocation> {
    CommunityId::try_from(id).ok().map(|id| id.location())
}

pub fn is_valid(id: &str) -> bool {
    CommunityId::try_from(id).is_ok()
}

pub fn get_community_location(id: &str) -> Option<MapView> {
    resolve(id).map(CommunityLocation::map_view)
}
