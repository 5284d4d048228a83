//! Partitioning of alerts by location
//!
//! Every distinct location is fetched at most once per data kind, so alerts
//! are grouped by their canonical [`LocationKey`] before any network call.

use std::collections::HashMap;

use shared::{Alert, Location, LocationKey};

/// Alerts sharing one location, in their original relative order
#[derive(Debug, Clone)]
pub struct LocationGroup {
    pub key: LocationKey,
    /// Location of the first alert in the group, used for outbound requests
    pub location: Location,
    pub alerts: Vec<Alert>,
}

/// Result of grouping a batch of alerts
#[derive(Debug, Clone, Default)]
pub struct LocationGroups {
    groups: Vec<LocationGroup>,
    index: HashMap<LocationKey, usize>,
    /// Ids of alerts dropped for lacking a usable location
    pub rejected: Vec<String>,
}

impl LocationGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &LocationKey) -> Option<&LocationGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    /// Groups in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = &LocationGroup> {
        self.groups.iter()
    }

    /// Number of alerts kept across all groups
    pub fn alert_count(&self) -> usize {
        self.groups.iter().map(|g| g.alerts.len()).sum()
    }

    fn push(&mut self, location: Location, alert: Alert) {
        let key = location.key();
        match self.index.get(&key) {
            Some(&i) => self.groups[i].alerts.push(alert),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(LocationGroup {
                    key,
                    location,
                    alerts: vec![alert],
                });
            }
        }
    }
}

/// Group alerts by canonical location.
///
/// Alerts without valid coordinates or a non-empty city are left out and
/// logged; they never fail the cycle.
pub fn group_by_location(alerts: &[Alert]) -> LocationGroups {
    let mut groups = LocationGroups::default();

    for alert in alerts {
        match alert.location() {
            Some(location) => groups.push(location, alert.clone()),
            None => {
                tracing::warn!(
                    alert_id = %alert.id,
                    location = ?alert.location,
                    "Skipping alert without a usable location"
                );
                groups.rejected.push(alert.id.clone());
            }
        }
    }

    groups
}
