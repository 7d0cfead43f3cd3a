use serde::Serialize;
use std::collections::HashMap;

/// A conversation entity: a person or a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    /// Network-level identity; groups usually have none
    pub service_id: Option<String>,
    pub number: Option<String>,
    /// Display name, already resolved from `profile_name` when unset
    pub name: Option<String>,
    pub profile_name: Option<String>,
    /// Member service ids, in store order. Empty for direct contacts.
    pub members: Vec<String>,
    pub is_group: bool,
}

impl Contact {
    /// Name used for directories and group references; falls back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn has_member(&self, service_id: &str) -> bool {
        self.members.iter().any(|m| m == service_id)
    }

    pub fn is_identified_by(&self, service_id: &str) -> bool {
        self.service_id.as_deref() == Some(service_id)
    }
}

/// Contacts keyed by id, iterated in store order.
#[derive(Debug, Clone, Default)]
pub struct Contacts {
    entries: Vec<Contact>,
    by_id: HashMap<String, usize>,
}

impl Contacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contact; a later row with the same id replaces the earlier one in place.
    pub fn insert(&mut self, contact: Contact) {
        match self.by_id.get(&contact.id) {
            Some(&idx) => self.entries[idx] = contact,
            None => {
                self.by_id.insert(contact.id.clone(), self.entries.len());
                self.entries.push(contact);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.entries.iter()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Contact> {
        self.entries.iter().filter(|c| c.is_group)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Service id -> contact. Later contacts win on duplicate service ids.
    pub fn by_service_id(&self) -> HashMap<&str, &Contact> {
        self.entries
            .iter()
            .filter_map(|c| c.service_id.as_deref().map(|sid| (sid, c)))
            .collect()
    }

    pub fn find_by_service_id(&self, service_id: &str) -> Option<&Contact> {
        self.entries
            .iter()
            .rev()
            .find(|c| c.is_identified_by(service_id))
    }

    /// First non-group contact whose name or profile name matches exactly
    pub fn find_person_by_name(&self, name: &str) -> Option<&Contact> {
        self.entries.iter().find(|c| {
            !c.is_group
                && (c.name.as_deref() == Some(name) || c.profile_name.as_deref() == Some(name))
        })
    }

    /// Sorted display names, skipping unnamed contacts
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.iter().filter_map(|c| c.name.as_deref()).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<Contact> for Contacts {
    fn from_iter<T: IntoIterator<Item = Contact>>(iter: T) -> Self {
        let mut contacts = Contacts::new();
        for contact in iter {
            contacts.insert(contact);
        }
        contacts
    }
}

#[cfg(test)]
pub(crate) fn person(id: &str, service_id: &str, name: &str) -> Contact {
    Contact {
        id: id.to_string(),
        service_id: Some(service_id.to_string()),
        number: None,
        name: Some(name.to_string()),
        profile_name: Some(format!("{} (profile)", name)),
        members: Vec::new(),
        is_group: false,
    }
}

#[cfg(test)]
pub(crate) fn group(id: &str, name: &str, members: &[&str]) -> Contact {
    Contact {
        id: id.to_string(),
        service_id: None,
        number: None,
        name: Some(name.to_string()),
        profile_name: None,
        members: members.iter().map(|m| m.to_string()).collect(),
        is_group: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut contacts = Contacts::new();
        contacts.insert(person("1", "sid-1", "Alice"));
        contacts.insert(person("2", "sid-2", "Bob"));
        contacts.insert(person("1", "sid-1", "Alicia"));

        assert_eq!(contacts.len(), 2);
        let names: Vec<&str> = contacts.iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["Alicia", "Bob"]);
    }

    #[test]
    fn test_service_id_index_skips_groups() {
        let contacts: Contacts = vec![
            person("1", "sid-1", "Alice"),
            group("g", "Group", &["sid-1"]),
        ]
        .into_iter()
        .collect();

        let index = contacts.by_service_id();
        assert_eq!(index.len(), 1);
        assert_eq!(index["sid-1"].id, "1");
        assert_eq!(contacts.groups().count(), 1);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut contact = group("group-id", "x", &[]);
        contact.name = None;
        assert_eq!(contact.display_name(), "group-id");
    }

    #[test]
    fn test_sorted_names_skip_unnamed() {
        let mut unnamed = person("3", "sid-3", "x");
        unnamed.name = None;
        let contacts: Contacts = vec![
            person("1", "sid-1", "Zed"),
            unnamed,
            person("2", "sid-2", "Amy"),
        ]
        .into_iter()
        .collect();
        assert_eq!(contacts.sorted_names(), vec!["Amy", "Zed"]);
    }
}
