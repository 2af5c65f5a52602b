//! Identity-compared entities.

use common::UniqueEntityId;

/// An object defined by its identity rather than its attributes.
///
/// Two entities with the same id are equal even when their props differ.
#[derive(Debug, Clone)]
pub struct Entity<P> {
    id: UniqueEntityId,
    props: P,
}

impl<P> Entity<P> {
    /// Creates an entity, generating an id when none is supplied.
    pub fn new(props: P, id: Option<UniqueEntityId>) -> Self {
        Self {
            id: id.unwrap_or_default(),
            props,
        }
    }

    /// Returns the entity's identity.
    pub fn id(&self) -> &UniqueEntityId {
        &self.id
    }

    /// Returns the entity's props.
    pub fn props(&self) -> &P {
        &self.props
    }

    /// Returns the entity's props for mutation by the owning type.
    pub(crate) fn props_mut(&mut self) -> &mut P {
        &mut self.props
    }

    /// Compares identities only. An absent `other` is never equal.
    pub fn equals(&self, other: Option<&Entity<P>>) -> bool {
        other.is_some_and(|other| self.id == other.id)
    }
}

impl<P> PartialEq for Entity<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Entity<P> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct UserProps {
        name: String,
    }

    fn user(name: &str, id: Option<&str>) -> Entity<UserProps> {
        Entity::new(
            UserProps {
                name: name.to_string(),
            },
            id.map(UniqueEntityId::from),
        )
    }

    #[test]
    fn generates_id_when_missing() {
        let a = user("Ada", None);
        let b = user("Ada", None);
        assert!(!a.equals(Some(&b)));
    }

    #[test]
    fn keeps_supplied_id() {
        let a = user("Ada", Some("user-1"));
        assert_eq!(a.id().as_str(), "user-1");
    }

    #[test]
    fn equality_ignores_props() {
        let a = user("Ada", Some("user-1"));
        let b = user("Grace", Some("user-1"));

        assert!(a.equals(Some(&b)));
        assert_eq!(a, b);
        assert_eq!(b.props().name, "Grace");
    }

    #[test]
    fn never_equal_to_absent() {
        let a = user("Ada", None);
        assert!(!a.equals(None));
    }

    #[test]
    fn props_mut_changes_props_not_identity() {
        let mut a = user("Ada", Some("user-1"));
        a.props_mut().name = "Ada L.".to_string();

        assert_eq!(a.props().name, "Ada L.");
        assert_eq!(a.id().as_str(), "user-1");
    }
}
