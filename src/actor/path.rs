use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The location of an actor within the hierarchy, e.g. `/user/sensors/temp`.
///
/// Paths are immutable and cheap to clone. Two references address the
/// same actor exactly when their paths are equal.
#[derive(Clone)]
pub struct ActorPath {
    inner: Arc<str>,
}

impl ActorPath {
    /// Creates a path from its string form.
    ///
    /// # Panics
    /// Panics if the string is not absolute or contains an empty
    /// segment. Paths handed to the runtime are always built through
    /// [`ActorPath::child`], so a malformed path is a programming error.
    pub fn new(path: &str) -> ActorPath {
        assert!(
            path.starts_with('/') && path.len() > 1 && path[1..].split('/').all(|s| !s.is_empty()),
            "malformed actor path: {:?}",
            path
        );

        ActorPath { inner: path.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Iterator over the path's segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner[1..].split('/')
    }

    /// The last segment: the actor's name, unique among its siblings.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap()
    }

    /// The path of a child one level below this one.
    pub fn child(&self, name: &str) -> ActorPath {
        ActorPath {
            inner: format!("{}/{}", self.inner, name).into(),
        }
    }

    /// The enclosing path, or `None` for a top level path such as `/user`.
    pub fn parent(&self) -> Option<ActorPath> {
        match self.inner.rfind('/') {
            Some(i) if i > 0 => Some(ActorPath {
                inner: self.inner[..i].into(),
            }),
            _ => None,
        }
    }
}

impl PartialEq for ActorPath {
    fn eq(&self, other: &ActorPath) -> bool {
        self.inner == other.inner
    }
}

impl Eq for ActorPath {}

impl Hash for ActorPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::ActorPath;
    use std::collections::HashSet;

    #[test]
    fn path_round_trip() {
        for s in &["/user", "/user/a", "/user/a/b/c", "/user/some_actor-1"] {
            assert_eq!(ActorPath::new(s).to_string(), *s);
        }
    }

    #[test]
    fn path_segments() {
        let path = ActorPath::new("/user/a/b");
        let segs: Vec<&str> = path.segments().collect();
        assert_eq!(segs, vec!["user", "a", "b"]);
        assert_eq!(path.name(), "b");
    }

    #[test]
    fn path_child_and_parent() {
        let root = ActorPath::new("/user");
        let child = root.child("a").child("b");
        assert_eq!(child.to_string(), "/user/a/b");
        assert_eq!(child.parent().unwrap(), ActorPath::new("/user/a"));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn path_equality_and_hashing() {
        let mut set = HashSet::new();
        set.insert(ActorPath::new("/user/a"));
        set.insert(ActorPath::new("/user").child("a"));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&ActorPath::new("/user/a")));
    }

    #[test]
    #[should_panic]
    fn path_rejects_relative() {
        ActorPath::new("user/a");
    }

    #[test]
    #[should_panic]
    fn path_rejects_empty_segment() {
        ActorPath::new("/user//a");
    }
}
