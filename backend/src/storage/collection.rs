//! Catalog of the record collections held by the local store.

use std::fmt;
use std::str::FromStr;

use super::error::StoreError;

/// A named set of uniquely keyed records (one SQLite table each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Sessions,
    Staff,
    Participants,
    Groups,
    Events,
    Rooms,
    RoomConfigs,
    Plannings,
    Treatments,
    CareEntries,
    Signatures,
    Accounting,
    MainCourante,
}

impl Collection {
    pub const ALL: [Collection; 13] = [
        Collection::Sessions,
        Collection::Staff,
        Collection::Participants,
        Collection::Groups,
        Collection::Events,
        Collection::Rooms,
        Collection::RoomConfigs,
        Collection::Plannings,
        Collection::Treatments,
        Collection::CareEntries,
        Collection::Signatures,
        Collection::Accounting,
        Collection::MainCourante,
    ];

    /// Store name, as used in exports and REST paths
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Sessions => "sessions",
            Collection::Staff => "staff",
            Collection::Participants => "jeunes",
            Collection::Groups => "groups",
            Collection::Events => "events",
            Collection::Rooms => "rooms",
            Collection::RoomConfigs => "roomConfigs",
            Collection::Plannings => "plannings",
            Collection::Treatments => "traitements",
            Collection::CareEntries => "soins",
            Collection::Signatures => "signatures",
            Collection::Accounting => "comptabilite",
            Collection::MainCourante => "mainCourante",
        }
    }

    /// SQLite table backing this collection. Always a fixed identifier, so it
    /// is safe to splice into SQL text.
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Sessions => "rec_sessions",
            Collection::Staff => "rec_staff",
            Collection::Participants => "rec_jeunes",
            Collection::Groups => "rec_groups",
            Collection::Events => "rec_events",
            Collection::Rooms => "rec_rooms",
            Collection::RoomConfigs => "rec_room_configs",
            Collection::Plannings => "rec_plannings",
            Collection::Treatments => "rec_traitements",
            Collection::CareEntries => "rec_soins",
            Collection::Signatures => "rec_signatures",
            Collection::Accounting => "rec_comptabilite",
            Collection::MainCourante => "rec_main_courante",
        }
    }

    /// Every collection except the session list itself is scoped by `sessionId`
    pub fn has_session_index(&self) -> bool {
        !matches!(self, Collection::Sessions)
    }

    /// Schema version that introduced the collection
    pub fn since_version(&self) -> i64 {
        match self {
            Collection::Sessions
            | Collection::Staff
            | Collection::Participants
            | Collection::Groups
            | Collection::Events
            | Collection::Rooms
            | Collection::Plannings => 1,
            _ => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::from_name(s).ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_tables_are_unique() {
        let names: HashSet<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        let tables: HashSet<_> = Collection::ALL.iter().map(|c| c.table_name()).collect();
        assert_eq!(names.len(), Collection::ALL.len());
        assert_eq!(tables.len(), Collection::ALL.len());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("jeunes".parse::<Collection>().unwrap(), Collection::Participants);
        assert_eq!("mainCourante".parse::<Collection>().unwrap(), Collection::MainCourante);
        assert!(matches!(
            "nope".parse::<Collection>(),
            Err(StoreError::UnknownCollection(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_only_sessions_lack_session_index() {
        for collection in Collection::ALL {
            assert_eq!(collection.has_session_index(), collection != Collection::Sessions);
        }
    }
}
